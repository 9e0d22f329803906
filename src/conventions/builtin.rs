//! Built-in conventions.
//!
//! The default set installed by `ModelBuilder::new` is `IdPrimaryKey`,
//! `TableNaming`, `TimestampConcurrency`, and `ForeignKeyIndex`.
//! `SqliteIndexNaming` and `UniqueConstraint` are SQLite-specific and are
//! patched in by the initializer.

use crate::conventions::{Convention, ConventionKind};
use crate::model::{ColumnModel, ColumnType, IndexModel, ModelDraft};

/// A column named `id` becomes the primary key when the table has no
/// explicit key.
pub struct IdPrimaryKey;

impl Convention for IdPrimaryKey {
    fn kind(&self) -> ConventionKind {
        ConventionKind::IdPrimaryKey
    }

    fn apply(&self, draft: &mut ModelDraft) {
        for table in &mut draft.tables {
            if table.columns.iter().any(|c| c.primary_key) {
                continue;
            }
            if let Some(column) = table.columns.iter_mut().find(|c| c.name == "id") {
                column.primary_key = true;
                column.not_null = true;
            }
        }
    }
}

/// Snake-cases and pluralizes entity names into table names, rewriting
/// foreign-key references to match.
pub struct TableNaming;

impl Convention for TableNaming {
    fn kind(&self) -> ConventionKind {
        ConventionKind::TableNaming
    }

    fn apply(&self, draft: &mut ModelDraft) {
        let renames: Vec<(String, String)> = draft
            .tables
            .iter()
            .map(|t| (t.name.clone(), pluralize(&snake_case(&t.name))))
            .collect();

        for table in &mut draft.tables {
            if let Some((_, new)) = renames.iter().find(|(old, _)| *old == table.name) {
                table.name = new.clone();
            }
            for fk in &mut table.foreign_keys {
                if let Some((_, new)) = renames.iter().find(|(old, _)| *old == fk.referenced_table) {
                    fk.referenced_table = new.clone();
                }
            }
        }
    }
}

/// Appends a `row_version` BLOB column to every table for optimistic
/// concurrency. The SQLite driver cannot populate rowversion values, so the
/// initializer removes this convention before any model is compiled.
pub struct TimestampConcurrency;

impl TimestampConcurrency {
    pub const COLUMN_NAME: &'static str = "row_version";
}

impl Convention for TimestampConcurrency {
    fn kind(&self) -> ConventionKind {
        ConventionKind::TimestampConcurrency
    }

    fn apply(&self, draft: &mut ModelDraft) {
        for table in &mut draft.tables {
            if table.columns.iter().any(|c| c.name == Self::COLUMN_NAME) {
                continue;
            }
            table.columns.push(ColumnModel {
                name: Self::COLUMN_NAME.to_string(),
                column_type: ColumnType::Blob,
                not_null: false,
                primary_key: false,
                unique_marker: false,
                default: None,
            });
        }
    }
}

/// Adds a non-unique index for each foreign-key column, using the framework
/// default naming scheme `IX_<column>`.
pub struct ForeignKeyIndex;

impl Convention for ForeignKeyIndex {
    fn kind(&self) -> ConventionKind {
        ConventionKind::ForeignKeyIndex
    }

    fn apply(&self, draft: &mut ModelDraft) {
        for table in &mut draft.tables {
            let mut new_indexes = Vec::new();
            for fk in &table.foreign_keys {
                let name = format!("IX_{}", fk.column);
                let already = table.indexes.iter().any(|i| i.name == name)
                    || new_indexes.iter().any(|i: &IndexModel| i.name == name);
                if already {
                    continue;
                }
                new_indexes.push(IndexModel {
                    name,
                    columns: vec![fk.column.clone()],
                    unique: false,
                });
            }
            table.indexes.extend(new_indexes);
        }
    }
}

/// Renames auto-generated foreign-key indexes to the SQLite naming scheme
/// `IX_<table>_<column>`. Runs immediately after [`ForeignKeyIndex`].
pub struct SqliteIndexNaming;

impl Convention for SqliteIndexNaming {
    fn kind(&self) -> ConventionKind {
        ConventionKind::ForeignKeyIndexNaming
    }

    fn apply(&self, draft: &mut ModelDraft) {
        for table in &mut draft.tables {
            let table_name = table.name.clone();
            for index in &mut table.indexes {
                if index.columns.len() != 1 {
                    continue;
                }
                // Only touch indexes still carrying the default name.
                if index.name == format!("IX_{}", index.columns[0]) {
                    index.name = format!("IX_{}_{}", table_name, index.columns[0]);
                }
            }
        }
    }
}

/// Translates the uniqueness marker on columns into a unique index
/// `UX_<table>_<column>`. SQLite expresses generated uniqueness constraints
/// through unique indexes.
pub struct UniqueConstraint;

impl Convention for UniqueConstraint {
    fn kind(&self) -> ConventionKind {
        ConventionKind::UniqueConstraint
    }

    fn apply(&self, draft: &mut ModelDraft) {
        for table in &mut draft.tables {
            let table_name = table.name.clone();
            let mut new_indexes = Vec::new();
            for column in &table.columns {
                if !column.unique_marker || column.primary_key {
                    continue;
                }
                let name = format!("UX_{}_{}", table_name, column.name);
                if table.indexes.iter().any(|i| i.name == name) {
                    continue;
                }
                new_indexes.push(IndexModel {
                    name,
                    columns: vec![column.name.clone()],
                    unique: true,
                });
            }
            table.indexes.extend(new_indexes);
        }
    }
}

/// Convert a CamelCase identifier to snake_case.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// Naive English pluralizer, sufficient for table naming.
fn pluralize(name: &str) -> String {
    if name.ends_with('y')
        && !name.ends_with("ay")
        && !name.ends_with("ey")
        && !name.ends_with("oy")
        && !name.ends_with("uy")
    {
        format!("{}ies", &name[..name.len() - 1])
    } else if name.ends_with('s')
        || name.ends_with('x')
        || name.ends_with('z')
        || name.ends_with("ch")
        || name.ends_with("sh")
    {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}
