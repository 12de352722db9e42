//! Per-entity record rendering.
//!
//! Every graph entry becomes one YAML-shaped record. Fields appear in a
//! fixed order with a blank line between them: `type`, `uri`, `standard
//! tag` for the kinds that carry one, `descriptions`, and for structures
//! `payload`, `enumeration values` when the payload is enumerated, and the
//! two neighbor maps. Neighbor maps are sorted by the unexpanded
//! identifier; enumeration members are sorted by member identifier.

use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::Result;

use gedspec_ingest::graph::{payload_is_enumerated, Definition, Entry};
use gedspec_ingest::{PrefixTable, REGISTRY_PREFIX};

use crate::flatten::TextFlattener;

/// The part of a tag after its last dash, which is how records spell the
/// standard tag and how extracts abbreviate member values.
pub fn standard_tag(tag: &str) -> &str {
    tag.rsplit('-').next().unwrap_or(tag)
}

/// A member identifier reduced to its local value name.
pub fn local_value(member: &str) -> &str {
    member
        .rsplit(['-', ':', '/'])
        .next()
        .unwrap_or(member)
}

pub struct RecordRenderer<'a> {
    prefixes: &'a PrefixTable,
    flattener: &'a dyn TextFlattener,
}

impl<'a> RecordRenderer<'a> {
    pub fn new(prefixes: &'a PrefixTable, flattener: &'a dyn TextFlattener) -> Self {
        Self {
            prefixes,
            flattener,
        }
    }

    pub fn render(
        &self,
        tag: &str,
        entry: &Entry,
        members: Option<&BTreeSet<String>>,
    ) -> Result<String> {
        let mut out = String::new();
        out.push_str("%YAML 1.2\n---\n");
        writeln!(&mut out, "type: {}", entry.kind())?;

        let uri = self.prefixes.expand(&format!("{REGISTRY_PREFIX}{tag}"));
        writeln!(&mut out, "\nuri: {uri}")?;

        if entry.kind().has_standard_tag() {
            writeln!(&mut out, "\nstandard tag: {}", standard_tag(tag))?;
        }

        writeln!(&mut out, "\ndescriptions:")?;
        for description in &entry.descriptions {
            writeln!(&mut out, "{}", self.yaml_item(description))?;
        }

        if let Definition::Structure(topology) = &entry.definition {
            let payload = match &topology.payload {
                Some(payload) => self.prefixes.expand(&payload.to_string()),
                None => "null".to_string(),
            };
            writeln!(&mut out, "\npayload: {payload}")?;

            if payload_is_enumerated(topology.payload.as_ref()) {
                writeln!(&mut out, "\nenumeration values:")?;
                for member in members.into_iter().flatten() {
                    writeln!(
                        &mut out,
                        "  {}: {}",
                        local_value(member),
                        self.prefixes.expand(member)
                    )?;
                }
            }

            if topology.substructures.is_empty() {
                writeln!(&mut out, "\nsubstructures: []")?;
            } else {
                writeln!(&mut out, "\nsubstructures:")?;
                for (child, cardinality) in &topology.substructures {
                    writeln!(
                        &mut out,
                        "  \"{}\": \"{}\"",
                        self.prefixes.expand(child),
                        cardinality
                    )?;
                }
            }

            if topology.superstructures.is_empty() {
                writeln!(&mut out, "\nsuperstructures: []")?;
            } else {
                writeln!(&mut out, "\nsuperstructures:")?;
                for (parent, cardinality) in &topology.superstructures {
                    writeln!(
                        &mut out,
                        "  \"{}\": \"{}\"",
                        self.prefixes.expand(parent),
                        cardinality
                    )?;
                }
            }
        }

        out.push_str("...\n");
        Ok(out)
    }

    /// One `descriptions` item. Multi-paragraph text switches to a literal
    /// block scalar so the paragraph break survives YAML parsing.
    fn yaml_item(&self, text: &str) -> String {
        let prefix = "  - ";
        let indent = " ".repeat(prefix.len());
        let flat = self
            .flattener
            .flatten(&self.prefixes.expand_all(text), prefix.len());
        if flat.contains(&format!("\n{indent}\n")) {
            format!("{prefix}|\n{indent}{flat}")
        } else {
            format!("{prefix}{flat}")
        }
    }
}
