//! Occurrence cardinalities and their combination algebra.
//!
//! A cardinality constrains how often a substructure may appear under its
//! superstructure: minimum 0 or 1, maximum 1 or unbounded. The serialized
//! form is the four-character token used throughout the specification
//! document: `{0:1}`, `{1:1}`, `{0:M}`, `{1:M}`.
//!
//! When two derivation paths constrain the same parent/child relationship
//! (a declared cardinality on a rule reference plus the cardinality inside
//! the rule's own production), the constraints are combined by conjunction:
//! the relationship is required only if both paths require it, and singular
//! only if both paths cap it at one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cardinality {
    /// Minimum occurrence is 1 (`true`) rather than 0.
    pub required: bool,
    /// Maximum occurrence is 1 (`true`) rather than unbounded.
    pub singular: bool,
}

impl Cardinality {
    pub fn new(required: bool, singular: bool) -> Self {
        Self { required, singular }
    }

    /// Conjunction of two independent derivation paths. Commutative,
    /// associative, idempotent.
    pub fn combine(self, other: Cardinality) -> Cardinality {
        Cardinality {
            required: self.required && other.required,
            singular: self.singular && other.singular,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed cardinality token: {token:?}")]
pub struct CardinalityParseError {
    pub token: String,
}

impl FromStr for Cardinality {
    type Err = CardinalityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CardinalityParseError {
            token: s.to_string(),
        };
        let inner = s
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(err)?;
        let (min, max) = inner.split_once(':').ok_or_else(err)?;
        let required = match min {
            "0" => false,
            "1" => true,
            _ => return Err(err()),
        };
        let singular = match max {
            "1" => true,
            "M" => false,
            _ => return Err(err()),
        };
        Ok(Cardinality {
            required,
            singular,
        })
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}:{}}}",
            if self.required { '1' } else { '0' },
            if self.singular { '1' } else { 'M' }
        )
    }
}
