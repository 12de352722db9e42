//! Named rule productions and their resolution to flat leaf lists.
//!
//! The specification document factors shared substructure lists into named
//! rules (`<<PLACE_STRUCTURE>>` and the like). A rule's direct productions
//! are the top-level lines of its own gedstruct block: leaves carry a
//! cardinality and a trailing identifier; references point at other rules.
//!
//! `RuleSet::resolve` inlines references transitively, combining the
//! reference's declared cardinality with each inlined leaf's cardinality.
//! Resolution is memoized recursion with an in-progress marker, so a
//! reference cycle is reported as an error instead of failing to terminate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cardinality::Cardinality;
use crate::notation::{NotationError, RuleName};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Production {
    pub cardinality: Cardinality,
    pub target: ProductionTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProductionTarget {
    /// A concrete structure identifier.
    Leaf(String),
    /// Another rule, inlined during resolution.
    Reference(RuleName),
}

/// Raw rule productions in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<RuleName, Vec<Production>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: &str, production: Production) {
        self.rules
            .entry(rule.to_string())
            .or_default()
            .push(production);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.rules.contains_key(rule)
    }

    /// Inline every reference. Leaves come first in document order, then
    /// each reference's expansion in document order. Duplicates are kept;
    /// consistency is the merge stage's concern.
    pub fn resolve(&self) -> Result<ResolvedRules, NotationError> {
        let mut resolved: BTreeMap<RuleName, Vec<(Cardinality, String)>> = BTreeMap::new();
        let mut in_progress: BTreeSet<RuleName> = BTreeSet::new();
        for name in self.rules.keys() {
            self.resolve_rule(name, &mut resolved, &mut in_progress)?;
        }
        Ok(ResolvedRules {
            expansions: resolved,
        })
    }

    fn resolve_rule(
        &self,
        name: &str,
        resolved: &mut BTreeMap<RuleName, Vec<(Cardinality, String)>>,
        in_progress: &mut BTreeSet<RuleName>,
    ) -> Result<(), NotationError> {
        if resolved.contains_key(name) {
            return Ok(());
        }
        if !in_progress.insert(name.to_string()) {
            return Err(NotationError::RuleCycle {
                rule: name.to_string(),
            });
        }

        let productions = self.rules.get(name).ok_or_else(|| NotationError::UnknownRule {
            rule: name.to_string(),
        })?;

        let mut flat: Vec<(Cardinality, String)> = Vec::new();
        for production in productions {
            if let ProductionTarget::Leaf(leaf) = &production.target {
                flat.push((production.cardinality, leaf.clone()));
            }
        }
        for production in productions {
            if let ProductionTarget::Reference(reference) = &production.target {
                self.resolve_rule(reference, resolved, in_progress)?;
                for (leaf_cardinality, leaf) in &resolved[reference.as_str()] {
                    flat.push((production.cardinality.combine(*leaf_cardinality), leaf.clone()));
                }
            }
        }

        in_progress.remove(name);
        resolved.insert(name.to_string(), flat);
        Ok(())
    }
}

/// Fully inlined rules: every target is a true leaf.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedRules {
    expansions: BTreeMap<RuleName, Vec<(Cardinality, String)>>,
}

impl ResolvedRules {
    pub fn get(&self, rule: &str) -> Option<&[(Cardinality, String)]> {
        self.expansions.get(rule).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.expansions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[(Cardinality, String)])> + '_ {
        self.expansions
            .iter()
            .map(|(name, flat)| (name.as_str(), flat.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(token: &str) -> Cardinality {
        token.parse().expect("parse cardinality")
    }

    fn leaf(cardinality: &str, id: &str) -> Production {
        Production {
            cardinality: card(cardinality),
            target: ProductionTarget::Leaf(id.to_string()),
        }
    }

    fn reference(cardinality: &str, rule: &str) -> Production {
        Production {
            cardinality: card(cardinality),
            target: ProductionTarget::Reference(rule.to_string()),
        }
    }

    #[test]
    fn resolves_direct_leaves() {
        let mut rules = RuleSet::new();
        rules.push("B", leaf("{0:1}", "x:leaf1"));
        rules.push("B", leaf("{1:1}", "x:leaf2"));
        let resolved = rules.resolve().expect("resolve");
        assert_eq!(
            resolved.get("B").expect("B resolved"),
            &[
                (card("{0:1}"), "x:leaf1".to_string()),
                (card("{1:1}"), "x:leaf2".to_string()),
            ]
        );
    }

    #[test]
    fn inlines_references_with_combined_cardinalities() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{1:1}", "B"));
        rules.push("B", leaf("{0:1}", "x:leaf1"));
        rules.push("B", leaf("{1:1}", "x:leaf2"));
        let resolved = rules.resolve().expect("resolve");
        assert_eq!(
            resolved.get("A").expect("A resolved"),
            &[
                (card("{0:1}"), "x:leaf1".to_string()),
                (card("{1:1}"), "x:leaf2".to_string()),
            ]
        );
    }

    #[test]
    fn combines_across_reference_chains() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{0:M}", "B"));
        rules.push("B", reference("{1:1}", "C"));
        rules.push("C", leaf("{1:1}", "x:leaf"));
        let resolved = rules.resolve().expect("resolve");
        assert_eq!(
            resolved.get("A").expect("A resolved"),
            &[(card("{0:M}"), "x:leaf".to_string())]
        );
    }

    #[test]
    fn keeps_leaves_before_reference_expansions() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{1:1}", "B"));
        rules.push("A", leaf("{1:M}", "x:own"));
        rules.push("B", leaf("{1:1}", "x:borrowed"));
        let resolved = rules.resolve().expect("resolve");
        assert_eq!(
            resolved.get("A").expect("A resolved"),
            &[
                (card("{1:M}"), "x:own".to_string()),
                (card("{1:1}"), "x:borrowed".to_string()),
            ]
        );
    }

    #[test]
    fn resolving_twice_is_stable() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{1:1}", "B"));
        rules.push("B", leaf("{0:M}", "x:leaf"));
        let first = rules.resolve().expect("first resolve");
        let second = rules.resolve().expect("second resolve");
        assert_eq!(first, second);
    }

    #[test]
    fn reports_reference_cycles() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{1:1}", "B"));
        rules.push("B", reference("{1:1}", "A"));
        let err = rules.resolve().expect_err("cycle must fail");
        assert!(matches!(err, NotationError::RuleCycle { .. }));
    }

    #[test]
    fn reports_self_reference() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{1:1}", "A"));
        let err = rules.resolve().expect_err("self-cycle must fail");
        assert!(matches!(err, NotationError::RuleCycle { rule } if rule == "A"));
    }

    #[test]
    fn reports_unknown_references() {
        let mut rules = RuleSet::new();
        rules.push("A", reference("{1:1}", "MISSING"));
        let err = rules.resolve().expect_err("unknown reference must fail");
        assert!(matches!(err, NotationError::UnknownRule { rule } if rule == "MISSING"));
    }
}
