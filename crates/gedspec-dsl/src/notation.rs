//! Line-level tokenizer for the gedstruct notation.
//!
//! A gedstruct block is a sequence of lines, each declaring one nesting step
//! of the structure hierarchy:
//!
//! ```text
//! n    TAG  [payload-token]  {d:s}  ns:identifier
//! +1   <<RULE_NAME>>         {d:s}
//! ```
//!
//! - The depth token is `n` (top level) or an integer, optionally with a `+`
//!   sign, giving the number of enclosing structures that stay open.
//! - A cross-reference id (`@…@`) may follow the depth on record headers; it
//!   carries no schema information and is skipped.
//! - A line whose final token is the cardinality (no trailing identifier)
//!   declares a *pseudostructure*: hierarchy bookkeeping only, no payload,
//!   never emitted.
//! - Lines consisting solely of `[`, `|`, or `]` group alternations and are
//!   skipped.
//!
//! The tokenizer produces typed line records; it does no hierarchy or
//! payload resolution (see `hierarchy`).

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::char as pchar,
    combinator::all_consuming,
    sequence::delimited,
    IResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cardinality::Cardinality;

pub type Tag = String;
pub type RuleName = String;

// ============================================================================
// Line records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotationLine {
    pub depth: Depth,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// `n`: resets the open-structure stack.
    Top,
    /// An integer depth: the number of enclosing structures kept open.
    Open(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LineKind {
    /// `<<RULE_NAME>>` with a declared cardinality; expanded via the rule
    /// resolver, never pushed onto the stack.
    Rule {
        name: RuleName,
        cardinality: Cardinality,
    },
    /// A literal structure declaration.
    Structure {
        subject: Subject,
        payload: Option<PayloadToken>,
        cardinality: Cardinality,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Subject {
    /// Tag plus trailing identifier.
    Identified { tag: Tag, id: String },
    /// No trailing identifier on the line.
    Pseudo { tag: Tag },
}

impl Subject {
    /// The identity under which the hierarchy tracks this line. Real
    /// structures use their identifier; pseudostructures use a synthetic
    /// `TAG pseudostructure` key that never collides with `ns:name` ids.
    pub fn identity(&self) -> String {
        match self {
            Subject::Identified { id, .. } => id.clone(),
            Subject::Pseudo { tag } => format!("{tag} pseudostructure"),
        }
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self, Subject::Pseudo { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PayloadToken {
    /// `<Name>`: a datatype name, resolved against the datatype table.
    Datatype(String),
    /// `@<XREF:TAG>@`: a pointer to a record of the given type.
    Pointer(Tag),
    /// `[Y|<NULL>]`: the literal yes-or-empty marker.
    YOrNull,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum NotationError {
    #[error("invalid gedstruct line: {line:?}")]
    MalformedLine { line: String },
    #[error("unknown datatype {name:?} in gedstruct line: {line:?}")]
    UnknownDatatype { name: String, line: String },
    #[error("reference to unknown rule <<{rule}>>")]
    UnknownRule { rule: String },
    #[error("rule reference cycle involving <<{rule}>>")]
    RuleCycle { rule: String },
    #[error("conflicting cardinality for {parent} -> {child}: {existing} vs {proposed}")]
    EdgeConflict {
        parent: String,
        child: String,
        existing: Cardinality,
        proposed: Cardinality,
    },
    #[error("conflicting payload for {structure}: {existing} vs {proposed}")]
    PayloadConflict {
        structure: String,
        existing: String,
        proposed: String,
    },
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Parse one gedstruct line. `Ok(None)` means the line carries no schema
/// information (an alternation mark).
pub fn parse_notation_line(raw: &str) -> Result<Option<NotationLine>, NotationError> {
    let malformed = || NotationError::MalformedLine {
        line: raw.to_string(),
    };

    let mut parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() < 3 {
        return match parts.as_slice() {
            ["["] | ["|"] | ["]"] => Ok(None),
            _ => Err(malformed()),
        };
    }

    // A cross-reference id right after the depth marks a record header.
    if parts[1].starts_with('@') {
        parts.remove(1);
        if parts.len() < 3 {
            return Err(malformed());
        }
    }

    let depth = parse_depth(parts[0]).ok_or_else(malformed)?;

    if parts[1].starts_with('<') {
        let name = rule_reference(parts[1]).ok_or_else(malformed)?;
        let cardinality: Cardinality = parts[2].parse().map_err(|_| malformed())?;
        return Ok(Some(NotationLine {
            depth,
            kind: LineKind::Rule { name, cardinality },
        }));
    }

    let tag = parts[1].to_string();
    let last = parts[parts.len() - 1];

    if last.contains('{') {
        // No trailing identifier: the cardinality closes the line.
        let cardinality: Cardinality = last.parse().map_err(|_| malformed())?;
        return Ok(Some(NotationLine {
            depth,
            kind: LineKind::Structure {
                subject: Subject::Pseudo { tag },
                payload: None,
                cardinality,
            },
        }));
    }

    if !last.contains(':') {
        return Err(malformed());
    }
    let id = last.to_string();
    let cardinality: Cardinality = parts[parts.len() - 2].parse().map_err(|_| malformed())?;
    let payload = if parts.len() > 4 {
        let token = parts[2..parts.len() - 2].join(" ");
        Some(parse_payload_token(&token).ok_or_else(malformed)?)
    } else {
        None
    };

    Ok(Some(NotationLine {
        depth,
        kind: LineKind::Structure {
            subject: Subject::Identified { tag, id },
            payload,
            cardinality,
        },
    }))
}

fn parse_depth(token: &str) -> Option<Depth> {
    if token == "n" {
        return Some(Depth::Top);
    }
    let digits = token.strip_prefix('+').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(Depth::Open)
}

fn rule_reference(token: &str) -> Option<RuleName> {
    fn parser(input: &str) -> IResult<&str, &str> {
        delimited(tag("<<"), take_while1(|c: char| c != '>'), tag(">>"))(input)
    }

    all_consuming(parser)(token)
        .ok()
        .map(|(_, name)| name.to_string())
}

/// Payload tokens arrive wrapped in one outer delimiter pair: `<Name>`,
/// `@<XREF:TAG>@`, `[Y|<NULL>]`. Multi-word datatype names are allowed.
fn parse_payload_token(raw: &str) -> Option<PayloadToken> {
    let inner = strip_outer(raw)?;
    if let Some(target) = pointer_target(inner) {
        return Some(PayloadToken::Pointer(target));
    }
    if inner == "Y|<NULL>" {
        return Some(PayloadToken::YOrNull);
    }
    if inner.is_empty() {
        return None;
    }
    Some(PayloadToken::Datatype(inner.to_string()))
}

fn strip_outer(raw: &str) -> Option<&str> {
    let first = raw.chars().next()?;
    let rest = raw.strip_prefix(first)?;
    let last = rest.chars().last()?;
    rest.strip_suffix(last)
}

fn pointer_target(inner: &str) -> Option<Tag> {
    fn parser(input: &str) -> IResult<&str, &str> {
        delimited(tag("<XREF:"), take_while1(|c: char| c != '>'), pchar('>'))(input)
    }

    all_consuming(parser)(inner)
        .ok()
        .map(|(_, target)| target.to_string())
}
