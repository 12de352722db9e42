//! Errors raised by the document scans and the schema graph merge.
//!
//! Every error here is fatal to the run. Notation-level failures bubble up
//! from the dialect crate unchanged; the variants below cover the prose
//! scans, the merge, and the cross-source validation.

use thiserror::Error;

use gedspec_dsl::NotationError;

use crate::graph::EntryKind;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Notation(#[from] NotationError),

    /// Two extraction passes disagree about what kind of entity a tag names.
    #[error("{id} is defined as {proposed} but was already recorded as {existing}")]
    KindConflict {
        id: String,
        existing: EntryKind,
        proposed: EntryKind,
    },

    /// The same enumeration member is defined twice with different text.
    #[error("enumeration member {id} has multiple definitions:\n    {first}\n    {second}")]
    MemberConflict {
        id: String,
        first: String,
        second: String,
    },

    /// A prose section names an identifier the hierarchy never declared.
    #[error("found section for {id} but no gedstruct")]
    MissingHierarchy { id: String },

    /// The hierarchy declares an identifier no prose section describes.
    #[error("found gedstruct for {id} but no section")]
    MissingSection { id: String },

    /// A tag-table row names a tag with no graph entry under either the bare
    /// tag or its disambiguated form.
    #[error("found table row for {tag} but no section or structure")]
    UnknownTableTag { tag: String },

    /// A tag-table row resolved to a non-structure entry.
    #[error("found table row for {tag} but that is a {kind}, not a structure")]
    TableKindMismatch { tag: String, kind: EntryKind },

    /// A structure takes an enumerated payload but no members were collected
    /// for it from any enumeration table or tagset link.
    #[error("structure {tag} has an enumerated payload but no enumeration members")]
    MissingEnumMembers { tag: String },

    /// A table row does not match the minimal expected shape.
    #[error("malformed table row: {row:?}")]
    MalformedRow { row: String },
}
