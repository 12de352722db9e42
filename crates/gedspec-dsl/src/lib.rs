//! Gedstruct notation: types and parsers.
//!
//! This crate defines the typed core of the extraction pipeline:
//! - the cardinality algebra (`cardinality`),
//! - the line-level gedstruct tokenizer (`notation`),
//! - rule productions and their memoized resolver (`rules`),
//! - the depth-stack hierarchy builder (`hierarchy`), and
//! - source-document digests (`digest`).
//!
//! Everything here is pure: no I/O, no document scanning. Locating gedstruct
//! blocks and rule sections inside a specification document is the ingest
//! crate's job; this crate only consumes the extracted text.

pub mod cardinality;
pub mod digest;
pub mod hierarchy;
pub mod notation;
pub mod rules;

pub use cardinality::{Cardinality, CardinalityParseError};
pub use digest::{source_digest, SOURCE_DIGEST_PREFIX};
pub use hierarchy::{
    payload_display, DatatypeTable, HierarchyBuilder, Payload, Topology, TopologyEntry,
};
pub use notation::{
    parse_notation_line, Depth, LineKind, NotationError, NotationLine, PayloadToken, Subject,
};
pub use rules::{Production, ProductionTarget, ResolvedRules, RuleSet};
