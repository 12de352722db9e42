//! Enumeration tables and tagset links.
//!
//! Enumeration members come from two places. Value tables sit inside a
//! section announcing that member identifiers are formed "by concatenating"
//! a given prefix with each table row's value; the nearest preceding heading
//! names the structure the members belong to. Sections anchored `#enum-`
//! that link to `[Events]` or `[Attributes]` instead of carrying a table
//! adopt every tag of the matching tagsets.
//!
//! A member defined twice with different text is fatal, except where the
//! equivalence table supplies one canonical text for a known identifier.

use std::collections::BTreeMap;

use regex::Regex;

use crate::document::SpecDocument;
use crate::error::ExtractError;
use crate::options::Equivalences;
use crate::tables::Tagsets;

#[derive(Debug, Clone, Default)]
pub struct EnumScan {
    /// Member identifier and meaning, first occurrence wins, document order.
    pub definitions: Vec<(String, String)>,
    /// Owner key and member identifier, duplicates included.
    pub memberships: Vec<(String, String)>,
}

pub fn scan(
    document: &SpecDocument,
    equivalences: &Equivalences,
) -> Result<EnumScan, ExtractError> {
    let phrase = Regex::new(r"by\s+concatenating\s+`([^`]*)`").unwrap();
    let row = Regex::new(r"`([A-Z0-9_]+)` *\| *(.*?) *[|\n]").unwrap();

    let mut out = EnumScan::default();
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for found in phrase.captures_iter(document.text()) {
        let concat_prefix = &found[1];
        let start = found.get(0).map(|m| m.start()).unwrap_or(0);
        let Some(extent) = document.enclosing_extent(start) else {
            continue;
        };
        let sect = equivalences.apply_heading_aliases(extent);
        for entry in row.captures_iter(&sect) {
            let mut meaning = entry[2].to_string();
            let mut id = format!("{concat_prefix}{}", &entry[1]);
            if let Some((head, tail)) = meaning.split_once("The URI of this") {
                let Some(named) = tail.split('`').nth(1) else {
                    return Err(ExtractError::MalformedRow {
                        row: entry[0].to_string(),
                    });
                };
                id = named.to_string();
                meaning = head.trim_end().to_string();
            }
            if let Some(canonical) = equivalences.description_for(&id) {
                meaning = canonical.to_string();
            }
            if let Some(previous) = seen.get(&id) {
                if *previous != meaning {
                    return Err(ExtractError::MemberConflict {
                        id,
                        first: previous.clone(),
                        second: meaning,
                    });
                }
            }
            if id.contains("enum-") {
                let row_start = entry.get(0).map(|m| m.start()).unwrap_or(0);
                if let Some(owner) = owner_key(&sect, row_start) {
                    out.memberships.push((owner, id.clone()));
                }
            }
            if !seen.contains_key(&id) {
                seen.insert(id.clone(), meaning.clone());
                out.definitions.push((id, meaning));
            }
        }
    }
    Ok(out)
}

/// The owner of a table row: the backticked content of the nearest heading
/// above it, backticks removed and dots turned into dashes.
fn owner_key(sect: &str, row_start: usize) -> Option<String> {
    let heading = sect[..row_start].rfind("\n#")?;
    let k1 = heading + sect[heading..].find('`')?;
    let line_end = k1 + sect[k1..].find('\n')?;
    let k2 = sect[..line_end].rfind('`')?;
    if k2 <= k1 {
        return None;
    }
    Some(sect[k1..k2].replace('`', "").replace('.', "-"))
}

/// Adopt tagset members for `#enum-` sections that reference the Events or
/// Attributes listings instead of defining a table.
pub fn backfill_links(document: &SpecDocument, tagsets: &Tagsets) -> Vec<(String, String)> {
    let key_pattern = Regex::new(r"`([A-Z0-9_`.]*)`").unwrap();

    let mut out = Vec::new();
    for section in document.sections() {
        if !section.heading.starts_with('`') || !section.heading.contains("#enum-") {
            continue;
        }
        let Some(caps) = key_pattern.captures(&section.heading) else {
            continue;
        };
        let key = caps[1].replace('`', "").replace('.', "-");
        let scope = format!("{}\n{}", section.heading, section.body);
        for (link, word) in [("[Events]", "Event"), ("[Attributes]", "Attribute")] {
            if !scope.contains(link) {
                continue;
            }
            for (name, tags) in tagsets {
                if name.contains(word) {
                    out.extend(tags.iter().map(|tag| (key.clone(), format!("g7:{tag}"))));
                }
            }
        }
    }
    out
}
