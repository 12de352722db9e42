//! Datatype declarations.
//!
//! Datatype sections announce themselves with a phrase like "The URI for the
//! `Text` datatype is `g7:type-Text`". Each pair feeds the datatype lookup
//! table used when reading gedstruct payloads. Registry identifiers also
//! produce a datatype entry, keyed by the identifier with any fragment
//! stripped, so several named datatypes may share one entry; the first
//! declaring section supplies its description.

use std::collections::BTreeSet;

use regex::Regex;

use gedspec_dsl::DatatypeTable;

use crate::document::SpecDocument;
use crate::graph::registry_tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatatypeFact {
    pub tag: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct DatatypeScan {
    pub table: DatatypeTable,
    pub facts: Vec<DatatypeFact>,
}

/// Scan every section that declares datatype identifiers.
pub fn scan(document: &SpecDocument) -> DatatypeScan {
    let marker = Regex::new(r"URI for[^\n]*datatypes? is").unwrap();
    let pair = Regex::new(r"URI[^\n]*`([^\n`]*)` datatype[^\n]*`([^`\n:]*:[^\n`]*)`").unwrap();

    let mut out = DatatypeScan::default();
    let mut seen = BTreeSet::new();
    for section in document.sections() {
        let scope = format!("{}\n{}", section.heading, section.body);
        if !marker.is_match(&scope) {
            continue;
        }
        for caps in pair.captures_iter(&scope) {
            let name = caps[1].to_string();
            let id = caps[2].to_string();
            out.table.insert(name, id.clone());
            let bare = match id.find('#') {
                Some(i) => &id[..i],
                None => id.as_str(),
            };
            if let Some(tag) = registry_tag(bare) {
                if seen.insert(tag.to_string()) {
                    out.facts.push(DatatypeFact {
                        tag: tag.to_string(),
                        description: section.body.trim().to_string(),
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Datatypes

## The `Text` datatype

A sequence of characters.

The URI for the `Text` datatype is `g7:type-Text`.

## Dates

Date prose.

The URIs for these datatypes are:

- The URI for the `Date` datatype is `g7:type-Date`.
- The URI for the `DateExact` datatype is `g7:type-Date#exact`.
- The URI for the `Language` datatype is `xsd:language`.

## Unrelated Section

The word datatype appears here without the phrase.
";

    #[test]
    fn scan_fills_lookup_table() {
        let scan = scan(&SpecDocument::new(DOC));
        assert_eq!(scan.table.lookup("Text"), Some("g7:type-Text"));
        assert_eq!(scan.table.lookup("Date"), Some("g7:type-Date"));
        assert_eq!(scan.table.lookup("DateExact"), Some("g7:type-Date#exact"));
        assert_eq!(scan.table.lookup("Language"), Some("xsd:language"));
        assert_eq!(scan.table.lookup("Missing"), None);
    }

    #[test]
    fn registry_facts_strip_fragments_and_keep_first() {
        let scan = scan(&SpecDocument::new(DOC));
        let tags: Vec<&str> = scan.facts.iter().map(|f| f.tag.as_str()).collect();
        // DateExact collapses onto type-Date, which Date already claimed
        assert_eq!(tags, vec!["type-Text", "type-Date"]);
        assert!(scan.facts[1].description.starts_with("Date prose."));
    }

    #[test]
    fn non_registry_identifiers_stay_out_of_facts() {
        let scan = scan(&SpecDocument::new(DOC));
        assert!(scan.facts.iter().all(|f| !f.tag.contains("language")));
    }

    #[test]
    fn sections_without_the_phrase_are_ignored() {
        let doc = SpecDocument::new(
            "# Odd\n\nIdentifier note: the `X` datatype maps onto `g7:type-X` informally.\n",
        );
        assert!(scan(&doc).table.is_empty());
    }
}
