//! Specification-document ingestion.
//!
//! This crate reads one semi-structured specification document and merges
//! its three kinds of evidence into a single schema graph:
//!
//! - fenced `gedstruct` blocks, parsed by `gedspec-dsl`, give the structure
//!   hierarchy and payload types
//! - prose sections give names and descriptions for structures, datatypes,
//!   calendars, and months
//! - pipe tables give short prefixes, tag enrichments, and enumeration
//!   members
//!
//! The passes are independent scans over the document; `pipeline::extract`
//! runs them in dependency order, merges their facts, and validates that the
//! prose and the grammar agree before anything is handed to an emitter.

pub mod calendars;
pub mod datatypes;
pub mod document;
pub mod enums;
pub mod error;
pub mod graph;
pub mod options;
pub mod pipeline;
pub mod prefixes;
pub mod report;
pub mod sections;
pub mod tables;

pub use document::{collect_rule_productions, DocSection, RuleSection, SpecDocument};
pub use error::ExtractError;
pub use graph::{
    payload_is_enumerated, registry_tag, Definition, Entry, EntryKind, SchemaGraph,
    REGISTRY_PREFIX,
};
pub use options::{Equivalences, ExtractOptions};
pub use pipeline::{extract, Extraction};
pub use prefixes::PrefixTable;
pub use report::{PassCounts, RunReport, RUN_REPORT_VERSION};
