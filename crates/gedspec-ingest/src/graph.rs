//! The merged schema graph.
//!
//! Every extraction pass contributes entries keyed by registry tag, the
//! identifier with the `g7:` namespace stripped. An entry has exactly one
//! kind; a pass that tries to re-record a tag under a different kind is a
//! fatal conflict, while re-recording under the same kind appends the new
//! descriptions. Enumeration memberships live beside the entries, keyed by
//! the owning structure's tag.
//!
//! Validation runs after all passes have merged and checks the two cross
//! references the document promises: every hierarchy identifier in the
//! registry namespace has a prose section, and every structure that takes an
//! enumerated payload has at least one member.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use gedspec_dsl::{Payload, Topology, TopologyEntry};

use crate::error::ExtractError;

/// The registry namespace prefix carried by emitted identifiers.
pub const REGISTRY_PREFIX: &str = "g7:";

/// The tag of a registry identifier, or `None` for identifiers outside the
/// registry namespace (foreign namespaces and pseudostructures).
pub fn registry_tag(id: &str) -> Option<&str> {
    id.strip_prefix(REGISTRY_PREFIX)
}

/// True when a payload is an enumerated datatype, which obliges the owning
/// structure to carry enumeration members.
pub fn payload_is_enumerated(payload: Option<&Payload>) -> bool {
    matches!(payload, Some(Payload::Datatype(id)) if id.contains("Enum"))
}

// ============================================================================
// Entries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Structure,
    Enumeration,
    Calendar,
    Datatype,
    Month,
}

impl EntryKind {
    pub const fn name(&self) -> &'static str {
        match self {
            EntryKind::Structure => "structure",
            EntryKind::Enumeration => "enumeration",
            EntryKind::Calendar => "calendar",
            EntryKind::Datatype => "datatype",
            EntryKind::Month => "month",
        }
    }

    /// Datatype records carry no standard tag; every other kind does.
    pub const fn has_standard_tag(&self) -> bool {
        !matches!(self, EntryKind::Datatype)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a tag denotes. Structures carry their hierarchy topology; the other
/// kinds are fully described by their descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Structure(TopologyEntry),
    Enumeration,
    Calendar,
    Datatype,
    Month,
}

impl Definition {
    pub fn kind(&self) -> EntryKind {
        match self {
            Definition::Structure(_) => EntryKind::Structure,
            Definition::Enumeration => EntryKind::Enumeration,
            Definition::Calendar => EntryKind::Calendar,
            Definition::Datatype => EntryKind::Datatype,
            Definition::Month => EntryKind::Month,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub definition: Definition,
    pub descriptions: Vec<String>,
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        self.definition.kind()
    }

    pub fn topology(&self) -> Option<&TopologyEntry> {
        match &self.definition {
            Definition::Structure(topology) => Some(topology),
            _ => None,
        }
    }
}

// ============================================================================
// Graph
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    entries: BTreeMap<String, Entry>,
    memberships: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tag. A fresh tag takes the definition and descriptions as
    /// given; a known tag of the same kind appends the descriptions and
    /// keeps its original definition; a known tag of a different kind is a
    /// fatal conflict.
    pub fn record(
        &mut self,
        tag: &str,
        definition: Definition,
        descriptions: Vec<String>,
    ) -> Result<(), ExtractError> {
        match self.entries.get_mut(tag) {
            None => {
                self.entries.insert(
                    tag.to_string(),
                    Entry {
                        definition,
                        descriptions,
                    },
                );
                Ok(())
            }
            Some(entry) => {
                if entry.kind() != definition.kind() {
                    return Err(ExtractError::KindConflict {
                        id: format!("{REGISTRY_PREFIX}{tag}"),
                        existing: entry.kind(),
                        proposed: definition.kind(),
                    });
                }
                entry.descriptions.extend(descriptions);
                Ok(())
            }
        }
    }

    /// Append one description to an existing entry.
    pub fn append_description(&mut self, tag: &str, text: String) -> Result<(), ExtractError> {
        match self.entries.get_mut(tag) {
            Some(entry) => {
                entry.descriptions.push(text);
                Ok(())
            }
            None => Err(ExtractError::MissingSection {
                id: format!("{REGISTRY_PREFIX}{tag}"),
            }),
        }
    }

    pub fn entry(&self, tag: &str) -> Option<&Entry> {
        self.entries.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn kind_of(&self, tag: &str) -> Option<EntryKind> {
        self.entries.get(tag).map(Entry::kind)
    }

    pub fn add_member(&mut self, owner: &str, member: &str) {
        self.memberships
            .entry(owner.to_string())
            .or_default()
            .insert(member.to_string());
    }

    pub fn members(&self, owner: &str) -> Option<&BTreeSet<String>> {
        self.memberships.get(owner)
    }

    /// Entries in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> + '_ {
        self.entries.iter().map(|(tag, entry)| (tag.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind_counts(&self) -> BTreeMap<EntryKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Cross-source validation against the hierarchy.
    pub fn validate(&self, topology: &Topology) -> Result<(), ExtractError> {
        for id in topology.identifiers() {
            let Some(tag) = registry_tag(id) else {
                continue;
            };
            if !self.entries.contains_key(tag) {
                return Err(ExtractError::MissingSection { id: id.to_string() });
            }
        }
        for (tag, entry) in &self.entries {
            let Definition::Structure(topology) = &entry.definition else {
                continue;
            };
            if payload_is_enumerated(topology.payload.as_ref())
                && self.members(tag).map_or(true, BTreeSet::is_empty)
            {
                return Err(ExtractError::MissingEnumMembers { tag: tag.clone() });
            }
        }
        Ok(())
    }
}
