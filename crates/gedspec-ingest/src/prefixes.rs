//! Short-prefix tables.
//!
//! The document abbreviates identifier namespaces through tables headed
//! `Short Prefix | URI Prefix`. Every backticked pair in such a table maps a
//! short prefix to the namespace it expands to. Expansion is longest-prefix
//! first so that overlapping keys resolve deterministically.

use std::collections::BTreeMap;

use regex::Regex;

use crate::document::SpecDocument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    map: BTreeMap<String, String>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every prefix table in the document.
    pub fn scan(document: &SpecDocument) -> Self {
        let table =
            Regex::new(r"([^\n]*)Short Prefix *\| *URI Prefix *\|(\s*\|[^\n]*)*").unwrap();
        let pair = Regex::new(r"`([^`]*)` *\| *`([^`]*)`").unwrap();

        let mut map = BTreeMap::new();
        for found in table.find_iter(document.text()) {
            for caps in pair.captures_iter(found.as_str()) {
                map.insert(caps[1].to_string(), caps[2].to_string());
            }
        }
        Self { map }
    }

    pub fn insert(&mut self, short: impl Into<String>, long: impl Into<String>) {
        self.map.insert(short.into(), long.into());
    }

    /// Expand a single identifier. The longest matching short prefix wins;
    /// identifiers with no known prefix pass through unchanged.
    pub fn expand(&self, id: &str) -> String {
        let mut keys: Vec<&String> = self.map.keys().collect();
        keys.sort_by_key(|key| std::cmp::Reverse(key.len()));
        for key in keys {
            if let Some(rest) = id.strip_prefix(key.as_str()) {
                if let Some(rest) = rest.strip_prefix(':') {
                    return format!("{}{}", self.map[key], rest);
                }
            }
        }
        id.to_string()
    }

    /// Expand every `prefix:` occurrence at a word boundary anywhere in a
    /// block of prose.
    pub fn expand_all(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (short, long) in &self.map {
            let pattern = Regex::new(&format!(r"\b{}:", regex::escape(short))).unwrap();
            out = pattern.replace_all(&out, long.as_str()).into_owned();
        }
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
