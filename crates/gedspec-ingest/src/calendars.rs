//! Calendar and month declarations.
//!
//! A backticked section heading whose body states "is `g7:cal-...`" defines
//! a calendar; the section body is its description. Month sections work the
//! same way with `g7:month-` identifiers.

use std::collections::BTreeSet;

use regex::Regex;

use crate::document::SpecDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFact {
    pub tag: String,
    pub description: String,
}

pub fn scan_calendars(document: &SpecDocument) -> Vec<CalendarFact> {
    scan_defined(document, "cal-")
}

pub fn scan_months(document: &SpecDocument) -> Vec<CalendarFact> {
    scan_defined(document, "month-")
}

fn scan_defined(document: &SpecDocument, prefix: &str) -> Vec<CalendarFact> {
    let pattern = Regex::new(&format!("is `g7:({prefix}[^`]*)`")).unwrap();

    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for section in document.sections() {
        if !section.heading.starts_with('`') {
            continue;
        }
        let Some(caps) = pattern.captures(&section.body) else {
            continue;
        };
        let tag = caps[1].to_string();
        if seen.insert(tag.clone()) {
            out.push(CalendarFact {
                tag,
                description: section.body.trim().to_string(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Calendars

## `GREGORIAN`

The Gregorian calendar.

The URI for this calendar is `g7:cal-GREGORIAN`.

### `JAN`

January, the first month. Its URI is `g7:month-JAN`.

## `FRENCH_R`

The French Republican calendar is `g7:cal-FRENCH_R`.

## Prose Heading

This one also mentions is `g7:cal-IGNORED` but has no backticked heading.
";

    #[test]
    fn calendar_sections_yield_tags_and_bodies() {
        let cals = scan_calendars(&SpecDocument::new(DOC));
        let tags: Vec<&str> = cals.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["cal-GREGORIAN", "cal-FRENCH_R"]);
        assert!(cals[0].description.starts_with("The Gregorian calendar."));
    }

    #[test]
    fn month_sections_are_separate() {
        let months = scan_months(&SpecDocument::new(DOC));
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].tag, "month-JAN");
    }

    #[test]
    fn plain_headings_do_not_define_calendars() {
        let cals = scan_calendars(&SpecDocument::new(DOC));
        assert!(cals.iter().all(|c| c.tag != "cal-IGNORED"));
    }
}
