//! Depth-stack hierarchy builder over gedstruct blocks.
//!
//! Every gedstruct block in the document flows through here, including the
//! blocks that define rules: their nested lines contribute edges and
//! payloads just like any other block, while their top-level lines (which
//! have no open parent) contribute payloads only.
//!
//! Edge bookkeeping is symmetric: recording child `C` under parent `P` with
//! cardinality `c` stores both `substructures[P][C] = c` and
//! `superstructures[C][P] = c`. Re-recording an edge with the same
//! cardinality is idempotent; a different cardinality is a conflict error.
//! Payloads follow the same discipline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cardinality::Cardinality;
use crate::notation::{parse_notation_line, Depth, LineKind, NotationError, PayloadToken, Tag};
use crate::rules::ResolvedRules;

// ============================================================================
// Inputs and outputs
// ============================================================================

/// Datatype name → identifier, fed by the document's datatype sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatatypeTable {
    entries: BTreeMap<String, String>,
}

impl DatatypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.entries.insert(name.into(), id.into());
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(name, id)| (name.as_str(), id.as_str()))
    }
}

/// A structure's resolved payload, in its output form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Payload {
    /// A datatype identifier from the datatype table.
    Datatype(String),
    /// A pointer to a record of the given type.
    Pointer(Tag),
    /// The literal yes-or-empty marker.
    YOrNull,
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Datatype(id) => f.write_str(id),
            Payload::Pointer(target) => write!(f, "@<XREF:{target}>@"),
            Payload::YOrNull => f.write_str("Y|<NULL>"),
        }
    }
}

/// Render an optional payload the way records do: `null` when absent.
pub fn payload_display(payload: Option<&Payload>) -> String {
    match payload {
        Some(payload) => payload.to_string(),
        None => "null".to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyEntry {
    pub substructures: BTreeMap<String, Cardinality>,
    pub superstructures: BTreeMap<String, Cardinality>,
    pub payload: Option<Payload>,
}

/// Accumulated hierarchy facts for every identifier seen as a parent, a
/// child, or a payload carrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topology {
    entries: BTreeMap<String, TopologyEntry>,
}

impl Topology {
    pub fn get(&self, id: &str) -> Option<&TopologyEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopologyEntry)> + '_ {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, TopologyEntry)> for Topology {
    fn from_iter<I: IntoIterator<Item = (String, TopologyEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug)]
pub struct HierarchyBuilder<'a> {
    rules: &'a ResolvedRules,
    datatypes: &'a DatatypeTable,
    substructures: BTreeMap<String, BTreeMap<String, Cardinality>>,
    superstructures: BTreeMap<String, BTreeMap<String, Cardinality>>,
    payloads: BTreeMap<String, Option<Payload>>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(rules: &'a ResolvedRules, datatypes: &'a DatatypeTable) -> Self {
        Self {
            rules,
            datatypes,
            substructures: BTreeMap::new(),
            superstructures: BTreeMap::new(),
            payloads: BTreeMap::new(),
        }
    }

    /// Feed one gedstruct block. The open-structure stack is local to the
    /// block; a top-level line resets it, an integer depth truncates it.
    pub fn apply_block(&mut self, block: &str) -> Result<(), NotationError> {
        let mut stack: Vec<String> = Vec::new();
        for raw in block.lines() {
            let Some(line) = parse_notation_line(raw)? else {
                continue;
            };
            match line.depth {
                Depth::Top => stack.clear(),
                Depth::Open(depth) => stack.truncate(depth),
            }
            match line.kind {
                LineKind::Rule { name, cardinality } => {
                    let rules = self.rules;
                    let expansions =
                        rules
                            .get(&name)
                            .ok_or_else(|| NotationError::UnknownRule {
                                rule: name.clone(),
                            })?;
                    if let Some(parent) = stack.last().cloned() {
                        for (leaf_cardinality, leaf) in expansions {
                            self.record_edge(&parent, leaf, cardinality.combine(*leaf_cardinality))?;
                        }
                    }
                }
                LineKind::Structure {
                    subject,
                    payload,
                    cardinality,
                } => {
                    let id = subject.identity();
                    let payload = self.resolve_payload(payload, raw)?;
                    self.record_payload(&id, payload)?;
                    if let Some(parent) = stack.last().cloned() {
                        self.record_edge(&parent, &id, cardinality)?;
                    }
                    stack.push(id);
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Topology {
        let mut entries: BTreeMap<String, TopologyEntry> = BTreeMap::new();
        for (id, substructures) in self.substructures {
            entries.entry(id).or_default().substructures = substructures;
        }
        for (id, superstructures) in self.superstructures {
            entries.entry(id).or_default().superstructures = superstructures;
        }
        for (id, payload) in self.payloads {
            entries.entry(id).or_default().payload = payload;
        }
        Topology { entries }
    }

    fn resolve_payload(
        &self,
        token: Option<PayloadToken>,
        raw: &str,
    ) -> Result<Option<Payload>, NotationError> {
        match token {
            None => Ok(None),
            Some(PayloadToken::Pointer(target)) => Ok(Some(Payload::Pointer(target))),
            Some(PayloadToken::YOrNull) => Ok(Some(Payload::YOrNull)),
            Some(PayloadToken::Datatype(name)) => {
                let id = self.datatypes.lookup(&name).ok_or_else(|| {
                    NotationError::UnknownDatatype {
                        name: name.clone(),
                        line: raw.to_string(),
                    }
                })?;
                Ok(Some(Payload::Datatype(id.to_string())))
            }
        }
    }

    fn record_edge(
        &mut self,
        parent: &str,
        child: &str,
        cardinality: Cardinality,
    ) -> Result<(), NotationError> {
        let conflict = |existing: Cardinality| NotationError::EdgeConflict {
            parent: parent.to_string(),
            child: child.to_string(),
            existing,
            proposed: cardinality,
        };

        let down = self
            .substructures
            .entry(parent.to_string())
            .or_default()
            .entry(child.to_string())
            .or_insert(cardinality);
        if *down != cardinality {
            return Err(conflict(*down));
        }

        let up = self
            .superstructures
            .entry(child.to_string())
            .or_default()
            .entry(parent.to_string())
            .or_insert(cardinality);
        if *up != cardinality {
            return Err(conflict(*up));
        }
        Ok(())
    }

    fn record_payload(
        &mut self,
        id: &str,
        payload: Option<Payload>,
    ) -> Result<(), NotationError> {
        match self.payloads.get(id) {
            Some(existing) if *existing != payload => Err(NotationError::PayloadConflict {
                structure: id.to_string(),
                existing: payload_display(existing.as_ref()),
                proposed: payload_display(payload.as_ref()),
            }),
            Some(_) => Ok(()),
            None => {
                self.payloads.insert(id.to_string(), payload);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Production, ProductionTarget, RuleSet};

    fn card(token: &str) -> Cardinality {
        token.parse().expect("parse cardinality")
    }

    fn datatypes() -> DatatypeTable {
        let mut table = DatatypeTable::new();
        table.insert("Text", "g7:type-Text");
        table.insert("Special", "g7:type-Special");
        table.insert("Enum", "g7:type-Enum");
        table
    }

    fn build(blocks: &[&str], rules: &ResolvedRules) -> Result<Topology, NotationError> {
        let datatypes = datatypes();
        let mut builder = HierarchyBuilder::new(rules, &datatypes);
        for block in blocks {
            builder.apply_block(block)?;
        }
        Ok(builder.finish())
    }

    #[test]
    fn records_symmetric_edges() {
        let rules = ResolvedRules::default();
        let topology = build(
            &["n P {1:1} x:P\n+1 C <Text> {0:M} x:C"],
            &rules,
        )
        .expect("build");
        let parent = topology.get("x:P").expect("parent entry");
        assert_eq!(parent.substructures.get("x:C"), Some(&card("{0:M}")));
        let child = topology.get("x:C").expect("child entry");
        assert_eq!(child.superstructures.get("x:P"), Some(&card("{0:M}")));
        assert_eq!(
            child.payload,
            Some(Payload::Datatype("g7:type-Text".to_string()))
        );
    }

    #[test]
    fn every_substructure_has_matching_superstructure() {
        let rules = ResolvedRules::default();
        let topology = build(
            &["n A {1:1} x:A\n+1 B <Text> {0:1} x:B\n+2 C <Text> {1:M} x:C\n+1 D {0:M} x:D"],
            &rules,
        )
        .expect("build");
        for (id, entry) in topology.iter() {
            for (child, cardinality) in &entry.substructures {
                let mirrored = topology
                    .get(child)
                    .and_then(|e| e.superstructures.get(id));
                assert_eq!(mirrored, Some(cardinality), "edge {id} -> {child}");
            }
        }
    }

    #[test]
    fn depth_tokens_pop_the_stack() {
        let rules = ResolvedRules::default();
        let topology = build(
            &["n A {1:1} x:A\n+1 B {0:1} x:B\n+2 C {1:1} x:C\n+1 D {0:M} x:D"],
            &rules,
        )
        .expect("build");
        let a = topology.get("x:A").expect("A entry");
        assert_eq!(a.substructures.len(), 2);
        assert!(a.substructures.contains_key("x:B"));
        assert!(a.substructures.contains_key("x:D"));
        let b = topology.get("x:B").expect("B entry");
        assert_eq!(b.substructures.len(), 1);
        assert!(b.substructures.contains_key("x:C"));
    }

    #[test]
    fn expands_rule_references_with_combined_cardinality() {
        let mut set = RuleSet::new();
        set.push(
            "NOTES",
            Production {
                cardinality: card("{0:M}"),
                target: ProductionTarget::Leaf("x:NOTE".to_string()),
            },
        );
        let rules = set.resolve().expect("resolve");
        let topology = build(
            &["n P {1:1} x:P\n+1 <<NOTES>> {1:1}"],
            &rules,
        )
        .expect("build");
        let parent = topology.get("x:P").expect("parent entry");
        assert_eq!(parent.substructures.get("x:NOTE"), Some(&card("{0:M}")));
        let note = topology.get("x:NOTE").expect("note entry");
        assert_eq!(note.superstructures.get("x:P"), Some(&card("{0:M}")));
    }

    #[test]
    fn top_level_rule_reference_records_nothing() {
        let mut set = RuleSet::new();
        set.push(
            "RECORD",
            Production {
                cardinality: card("{1:1}"),
                target: ProductionTarget::Leaf("x:R".to_string()),
            },
        );
        let rules = set.resolve().expect("resolve");
        let topology = build(&["0 <<RECORD>> {0:M}"], &rules).expect("build");
        assert!(topology.is_empty());
    }

    #[test]
    fn unknown_rule_reference_fails() {
        let rules = ResolvedRules::default();
        let err = build(&["n P {1:1} x:P\n+1 <<MISSING>> {0:1}"], &rules)
            .expect_err("unknown rule must fail");
        assert!(matches!(err, NotationError::UnknownRule { rule } if rule == "MISSING"));
    }

    #[test]
    fn unknown_datatype_fails() {
        let rules = ResolvedRules::default();
        let err = build(&["n P <Mystery> {1:1} x:P"], &rules)
            .expect_err("unknown datatype must fail");
        assert!(matches!(err, NotationError::UnknownDatatype { name, .. } if name == "Mystery"));
    }

    #[test]
    fn identical_redeclaration_is_idempotent() {
        let rules = ResolvedRules::default();
        let block = "n P {1:1} x:P\n+1 C {0:M} x:C";
        let topology = build(&[block, block], &rules).expect("build");
        let parent = topology.get("x:P").expect("parent entry");
        assert_eq!(parent.substructures.get("x:C"), Some(&card("{0:M}")));
    }

    #[test]
    fn conflicting_edge_cardinality_fails() {
        let rules = ResolvedRules::default();
        let err = build(
            &[
                "n P {1:1} x:P\n+1 C {0:M} x:C",
                "n P {1:1} x:P\n+1 C {1:M} x:C",
            ],
            &rules,
        )
        .expect_err("conflicting edge must fail");
        let NotationError::EdgeConflict {
            parent,
            child,
            existing,
            proposed,
        } = err
        else {
            panic!("expected edge conflict");
        };
        assert_eq!(parent, "x:P");
        assert_eq!(child, "x:C");
        assert_eq!(existing, card("{0:M}"));
        assert_eq!(proposed, card("{1:M}"));
    }

    #[test]
    fn conflicting_payload_fails() {
        let rules = ResolvedRules::default();
        let err = build(
            &["n P <Text> {1:1} x:P", "n P <Special> {1:1} x:P"],
            &rules,
        )
        .expect_err("conflicting payload must fail");
        assert!(matches!(err, NotationError::PayloadConflict { structure, .. } if structure == "x:P"));
    }

    #[test]
    fn pseudostructures_join_the_topology_without_payload() {
        let rules = ResolvedRules::default();
        let topology = build(&["0 TRLR {1:1}"], &rules).expect("build");
        let entry = topology.get("TRLR pseudostructure").expect("pseudo entry");
        assert_eq!(entry.payload, None);
        assert!(entry.substructures.is_empty());
        assert!(entry.superstructures.is_empty());
    }

    #[test]
    fn pointer_and_flag_payloads_pass_through() {
        let rules = ResolvedRules::default();
        let topology = build(
            &["n P {1:1} x:P\n+1 S @<XREF:SOUR>@ {0:M} x:S\n+1 D [Y|<NULL>] {0:1} x:D"],
            &rules,
        )
        .expect("build");
        assert_eq!(
            topology.get("x:S").and_then(|e| e.payload.clone()),
            Some(Payload::Pointer("SOUR".to_string()))
        );
        assert_eq!(
            topology.get("x:D").and_then(|e| e.payload.clone()),
            Some(Payload::YOrNull)
        );
        assert_eq!(payload_display(Some(&Payload::Pointer("SOUR".to_string()))), "@<XREF:SOUR>@");
    }
}
