//! Modeling conventions: ordered rules applied to a model draft before DDL
//! generation.
//!
//! The set is mutable so an initializer can patch it at construction time:
//! remove rules the target driver cannot support, and insert driver-specific
//! rules at a defined position. Presence is an explicit capability query
//! (`contains`), never a swallowed error.

mod builtin;

pub use builtin::{
    ForeignKeyIndex, IdPrimaryKey, SqliteIndexNaming, TableNaming, TimestampConcurrency,
    UniqueConstraint,
};

use crate::model::ModelDraft;
use thiserror::Error;

/// Identity of a convention, used for presence checks, removal, and ordered
/// insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConventionKind {
    IdPrimaryKey,
    TableNaming,
    TimestampConcurrency,
    ForeignKeyIndex,
    ForeignKeyIndexNaming,
    UniqueConstraint,
}

#[derive(Debug, Error)]
pub enum ConventionError {
    #[error("No convention of kind {0:?} in the set")]
    MissingAnchor(ConventionKind),
}

/// A rule that transforms the model draft during compilation.
pub trait Convention: Send + Sync {
    fn kind(&self) -> ConventionKind;
    fn apply(&self, draft: &mut ModelDraft);
}

/// Ordered, mutable collection of conventions.
#[derive(Default)]
pub struct ConventionSet {
    conventions: Vec<Box<dyn Convention>>,
}

impl ConventionSet {
    pub fn new() -> Self {
        ConventionSet::default()
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    /// Kinds in application order.
    pub fn kinds(&self) -> Vec<ConventionKind> {
        self.conventions.iter().map(|c| c.kind()).collect()
    }

    /// Whether the set holds a convention of the given kind.
    pub fn contains(&self, kind: ConventionKind) -> bool {
        self.conventions.iter().any(|c| c.kind() == kind)
    }

    /// Append a convention at the end of the set.
    pub fn add(&mut self, convention: Box<dyn Convention>) {
        self.conventions.push(convention);
    }

    /// Remove every convention of the given kind. Returns whether any was
    /// removed.
    pub fn remove(&mut self, kind: ConventionKind) -> bool {
        let before = self.conventions.len();
        self.conventions.retain(|c| c.kind() != kind);
        self.conventions.len() != before
    }

    /// Insert a convention immediately after the first convention of the
    /// given kind. Callers should `contains`-check the anchor first.
    pub fn insert_after(
        &mut self,
        anchor: ConventionKind,
        convention: Box<dyn Convention>,
    ) -> Result<(), ConventionError> {
        let position = self
            .conventions
            .iter()
            .position(|c| c.kind() == anchor)
            .ok_or(ConventionError::MissingAnchor(anchor))?;
        self.conventions.insert(position + 1, convention);
        Ok(())
    }

    /// Apply every convention to the draft, in set order.
    pub fn apply_all(&self, draft: &mut ModelDraft) {
        for convention in &self.conventions {
            convention.apply(draft);
        }
    }
}

impl std::fmt::Debug for ConventionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConventionSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}
