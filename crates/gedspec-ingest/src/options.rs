//! Extraction options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Known textual divergences in the source document and how to reconcile
/// them. `descriptions` maps a member identifier to the single text that
/// stands in for every occurrence; `heading_aliases` rewrites heading
/// phrases before owner keys are derived from them.
///
/// The defaults cover the divergences present in published documents: the
/// BIRTH member is described twice with different words, and the Latter-Day
/// Saint ordinance headings spell out a phrase where the identifier uses
/// `ord`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Equivalences {
    descriptions: BTreeMap<String, String>,
    heading_aliases: Vec<(String, String)>,
}

impl Default for Equivalences {
    fn default() -> Self {
        let mut this = Self::empty();
        this.add_description(
            "g7:enum-BIRTH",
            "Associated with birth, such as a birth name or birth parents.",
        );
        this.add_heading_alias("(Latter-Day Saint Ordinance)", "`ord`");
        this
    }
}

impl Equivalences {
    pub fn empty() -> Self {
        Self {
            descriptions: BTreeMap::new(),
            heading_aliases: Vec::new(),
        }
    }

    pub fn add_description(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.descriptions.insert(id.into(), text.into());
    }

    pub fn add_heading_alias(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.heading_aliases.push((from.into(), to.into()));
    }

    pub fn description_for(&self, id: &str) -> Option<&str> {
        self.descriptions.get(id).map(String::as_str)
    }

    pub fn apply_heading_aliases(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (from, to) in &self.heading_aliases {
            out = out.replace(from.as_str(), to.as_str());
        }
        out
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractOptions {
    pub equivalences: Equivalences,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_known_divergences() {
        let eq = Equivalences::default();
        assert!(eq.description_for("g7:enum-BIRTH").unwrap().contains("birth name"));
        assert_eq!(
            eq.apply_heading_aliases("#### (Latter-Day Saint Ordinance).`STAT`"),
            "#### `ord`.`STAT`"
        );
    }

    #[test]
    fn empty_equivalences_change_nothing() {
        let eq = Equivalences::empty();
        assert_eq!(eq.description_for("g7:enum-BIRTH"), None);
        assert_eq!(eq.apply_heading_aliases("text"), "text");
    }
}
