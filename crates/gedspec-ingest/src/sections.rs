//! Structure-definition sections.
//!
//! Two prose passes live here. Structure sections carry a heading of the
//! form `` ## TAG (Name) `g7:FULL-TAG` ``; the name and the section body
//! become that structure's first descriptions, and a body phrase "a type of
//! `X`" additionally copies the body of the plain section defining `X`.
//! Rule sections whose block holds exactly one top-level line donate their
//! prose to that line's structure, since the rule is just a named wrapper
//! around it.

use regex::Regex;

use gedspec_dsl::{parse_notation_line, Depth, LineKind, NotationLine, Subject};

use crate::document::{DocSection, SpecDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSection {
    pub id: String,
    pub name: String,
    pub body: String,
    /// Bodies copied from "a type of `X`" cross-references, in order.
    pub copied: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescription {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct SectionScan {
    pub structures: Vec<StructureSection>,
    pub rule_descriptions: Vec<RuleDescription>,
}

pub fn scan(document: &SpecDocument) -> SectionScan {
    let heading = Regex::new(r"`[^`]*`[^\n]*\(([^)]*)\)[^\n]*`([^:`\n]*:[^`\n]*)`").unwrap();
    let type_of = Regex::new(r"[Aa] type of `(\S*)`").unwrap();

    let sections = document.sections();
    let mut out = SectionScan::default();
    for section in &sections {
        let Some(caps) = heading.captures(&section.heading) else {
            continue;
        };
        let body = section.body.trim().to_string();
        let copied = type_of
            .captures_iter(&body)
            .filter_map(|m| plain_section_body(&sections, &m[1]))
            .collect();
        out.structures.push(StructureSection {
            id: caps[2].to_string(),
            name: caps[1].to_string(),
            body,
            copied,
        });
    }

    for rule in document.rule_sections() {
        let Some(id) = single_top_level_id(&rule.block) else {
            continue;
        };
        let body = rule.body.trim().to_string();
        if !body.is_empty() {
            out.rule_descriptions.push(RuleDescription { id, body });
        }
    }
    out
}

/// The body of the first section whose heading is exactly `` `target` ``
/// plus optional unbackticked trail.
fn plain_section_body(sections: &[DocSection], target: &str) -> Option<String> {
    let lead = format!("`{target}`");
    sections
        .iter()
        .find(|section| {
            section
                .heading
                .strip_prefix(lead.as_str())
                .is_some_and(|rest| !rest.contains('`'))
        })
        .map(|section| section.body.trim().to_string())
}

/// The identifier of a rule block consisting of one top-level identified
/// line followed only by indented continuations.
fn single_top_level_id(block: &str) -> Option<String> {
    let mut lines = block.lines();
    let first = lines.next()?;
    if !first.starts_with("n ") || !lines.all(|line| line.starts_with(' ')) {
        return None;
    }
    match parse_notation_line(first) {
        Ok(Some(NotationLine {
            depth: Depth::Top,
            kind:
                LineKind::Structure {
                    subject: Subject::Identified { id, .. },
                    ..
                },
        })) => Some(id),
        _ => None,
    }
}
