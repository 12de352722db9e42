//! Tabular extracts.
//!
//! Four tab-separated tables summarize the structure entries: parent-child
//! pairs, enumeration members, payload types, and edge cardinalities. Rows
//! are collected in tag order, so two runs over the same document produce
//! byte-identical files.

use gedspec_ingest::graph::Definition;
use gedspec_ingest::{payload_is_enumerated, PrefixTable, SchemaGraph, REGISTRY_PREFIX};

use crate::records::{local_value, standard_tag};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractTables {
    /// Parent uri, child standard tag, child uri. Roots have an empty
    /// parent column.
    pub substructures: Vec<[String; 3]>,
    /// Structure uri, local value, member uri.
    pub enumerations: Vec<[String; 3]>,
    /// Structure uri, payload uri or empty.
    pub payloads: Vec<[String; 2]>,
    /// Parent uri, child uri, cardinality.
    pub cardinalities: Vec<[String; 3]>,
}

pub fn collect(graph: &SchemaGraph, prefixes: &PrefixTable) -> ExtractTables {
    let mut tables = ExtractTables::default();
    for (tag, entry) in graph.iter() {
        let Definition::Structure(topology) = &entry.definition else {
            continue;
        };
        let uri = prefixes.expand(&format!("{REGISTRY_PREFIX}{tag}"));
        let ptag = standard_tag(tag);

        let payload = match &topology.payload {
            Some(payload) => prefixes.expand(&payload.to_string()),
            None => String::new(),
        };
        tables.payloads.push([uri.clone(), payload]);

        if payload_is_enumerated(topology.payload.as_ref()) {
            for member in graph.members(tag).into_iter().flatten() {
                tables.enumerations.push([
                    uri.clone(),
                    local_value(member).to_string(),
                    prefixes.expand(member),
                ]);
            }
        }

        if topology.superstructures.is_empty() {
            tables
                .substructures
                .push([String::new(), ptag.to_string(), uri.clone()]);
        } else {
            for (parent, cardinality) in &topology.superstructures {
                let parent_uri = prefixes.expand(parent);
                tables
                    .substructures
                    .push([parent_uri.clone(), ptag.to_string(), uri.clone()]);
                tables
                    .cardinalities
                    .push([parent_uri, uri.clone(), cardinality.to_string()]);
            }
        }
    }
    tables
}

/// Render rows as tab-separated lines, one trailing newline per row.
pub fn to_tsv<const N: usize>(rows: &[[String; N]]) -> String {
    rows.iter()
        .map(|row| format!("{}\n", row.join("\t")))
        .collect()
}
