//! Run reports.
//!
//! A report summarizes one extraction: where the document came from, its
//! digest, and how much each pass contributed. Reports are serialized as
//! JSON next to the extracts so runs can be compared without diffing the
//! records themselves.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use gedspec_dsl::source_digest;

pub const RUN_REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassCounts {
    pub prefixes: usize,
    pub datatypes: usize,
    pub rules: usize,
    pub gedstruct_blocks: usize,
    pub hierarchy_identifiers: usize,
    pub structure_sections: usize,
    pub table_rows: usize,
    pub enumeration_members: usize,
    pub memberships: usize,
    pub calendars: usize,
    pub months: usize,
    /// Final entry count per kind.
    pub entries: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub version: u32,
    pub generated_at: String,
    pub source: String,
    pub source_digest: String,
    pub counts: PassCounts,
}

impl RunReport {
    pub fn new(source: impl Into<String>, text: &str) -> Self {
        Self {
            version: RUN_REPORT_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            source: source.into(),
            source_digest: source_digest(text),
            counts: PassCounts::default(),
        }
    }
}
