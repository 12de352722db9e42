//! Source-document access.
//!
//! The specification document mixes prose, ATX headings, pipe tables, and
//! fenced `gedstruct` code blocks. Everything downstream works from three
//! views of it: the heading-delimited section list, the gedstruct blocks in
//! document order, and the grammar-rule sections (a backticked heading ending
//! in `:=` followed immediately by a fenced block). All three are produced by
//! line scans here so that the regex-based scans never have to reason about
//! section boundaries themselves.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use gedspec_dsl::{
    parse_notation_line, Depth, LineKind, NotationError, NotationLine, Production,
    ProductionTarget, RuleSet, Subject,
};

// ============================================================================
// Document and section types
// ============================================================================

/// An in-memory specification document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    text: String,
}

/// One heading-delimited section: the heading text (hashes stripped), its
/// nesting level, the body up to the next heading, and the byte offset of the
/// heading line within the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSection {
    pub level: usize,
    pub heading: String,
    pub body: String,
    pub start: usize,
}

/// A grammar-rule section: `` #### `NAME` := `` followed by a fenced block
/// of gedstruct lines and optional trailing prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSection {
    pub name: String,
    pub block: String,
    pub body: String,
}

impl SpecDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read document {}", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Split the document into heading-delimited sections. Heading lines
    /// inside code fences are treated as body text, not section breaks.
    pub fn sections(&self) -> Vec<DocSection> {
        let mut sections = Vec::new();
        let mut current: Option<DocSection> = None;
        let mut in_fence = false;
        let mut offset = 0;

        for line in self.text.split_inclusive('\n') {
            let stripped = line.strip_suffix('\n').unwrap_or(line);
            if stripped.starts_with("```") {
                in_fence = !in_fence;
            }
            if !in_fence && stripped.starts_with('#') {
                if let Some(section) = current.take() {
                    sections.push(finish_section(section));
                }
                let level = stripped.chars().take_while(|c| *c == '#').count();
                let heading = stripped.trim_start_matches('#').trim().to_string();
                current = Some(DocSection {
                    level,
                    heading,
                    body: String::new(),
                    start: offset,
                });
            } else if let Some(section) = current.as_mut() {
                section.body.push_str(stripped);
                section.body.push('\n');
            }
            offset += line.len();
        }
        if let Some(section) = current.take() {
            sections.push(finish_section(section));
        }
        sections
    }

    /// All fenced gedstruct blocks in document order, fence markers stripped.
    pub fn gedstruct_blocks(&self) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut current: Option<String> = None;

        for line in self.text.lines() {
            match current.as_mut() {
                Some(block) => {
                    if line.starts_with("```") {
                        blocks.push(current.take().unwrap_or_default());
                    } else {
                        if !block.is_empty() {
                            block.push('\n');
                        }
                        block.push_str(line);
                    }
                }
                None => {
                    if line.starts_with("```") && line.contains("gedstruct") {
                        current = Some(String::new());
                    }
                }
            }
        }
        blocks
    }

    /// Grammar-rule sections: heading `` `NAME` := `` whose body opens with a
    /// fenced block. Sections without an immediate fence are not rules.
    pub fn rule_sections(&self) -> Vec<RuleSection> {
        let mut rules = Vec::new();
        for section in self.sections() {
            let Some(name) = rule_heading_name(&section.heading) else {
                continue;
            };
            let Some((block, body)) = split_fenced_body(&section.body) else {
                continue;
            };
            rules.push(RuleSection { name, block, body });
        }
        rules
    }

    /// The text of the section enclosing `offset`, extended to the next
    /// heading of the same level. Deeper headings stay inside the extent, so
    /// a table split across sub-headings is still seen whole.
    pub fn enclosing_extent(&self, offset: usize) -> Option<&str> {
        let text = self.text.as_str();
        let start = text[..offset].rfind("\n#")?;
        let marker_end = text[start..].find(' ').map(|found| start + found)?;
        let marker = &text[start..=marker_end];
        let end = text[marker_end..]
            .find(marker)
            .map(|found| marker_end + found)
            .unwrap_or(text.len());
        Some(&text[start..end])
    }
}

fn finish_section(mut section: DocSection) -> DocSection {
    while section.body.ends_with('\n') {
        section.body.pop();
    }
    section
}

fn rule_heading_name(heading: &str) -> Option<String> {
    let rest = heading.strip_prefix('`')?;
    let (name, tail) = rest.split_once('`')?;
    if tail.trim_start().starts_with(":=") && !name.is_empty() {
        Some(name.to_string())
    } else {
        None
    }
}

/// Split a section body into its leading fenced block and the prose after
/// the closing fence. Returns `None` when the body does not open with a
/// fence.
fn split_fenced_body(body: &str) -> Option<(String, String)> {
    let mut lines = body.lines();
    loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) if line.starts_with("```") => break,
            _ => return None,
        }
    }
    let mut block = String::new();
    for line in lines.by_ref() {
        if line.starts_with("```") {
            let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
            return Some((block, body));
        }
        if !block.is_empty() {
            block.push('\n');
        }
        block.push_str(line);
    }
    None
}

// ============================================================================
// Rule collection
// ============================================================================

/// Turn the top-level lines of each rule block into grammar productions.
/// Identified lines become leaf productions, rule references become reference
/// productions. Indented lines and pseudostructure heads carry no identifier
/// and are skipped; they reach the hierarchy builder through the ordinary
/// gedstruct pass instead.
pub fn collect_rule_productions(sections: &[RuleSection]) -> Result<RuleSet, NotationError> {
    let mut rules = RuleSet::new();
    for section in sections {
        for raw in section.block.lines() {
            let Some(line) = parse_notation_line(raw)? else {
                continue;
            };
            let NotationLine {
                depth: Depth::Top,
                kind,
            } = line
            else {
                continue;
            };
            match kind {
                LineKind::Structure {
                    subject: Subject::Identified { id, .. },
                    cardinality,
                    ..
                } => rules.push(
                    &section.name,
                    Production {
                        cardinality,
                        target: ProductionTarget::Leaf(id),
                    },
                ),
                LineKind::Structure { .. } => {}
                LineKind::Rule { name, cardinality } => rules.push(
                    &section.name,
                    Production {
                        cardinality,
                        target: ProductionTarget::Reference(name),
                    },
                ),
            }
        }
    }
    Ok(rules)
}
