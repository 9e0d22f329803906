//! Compiled model: the connection-bound output of model building.
//!
//! A `Model` is created once per initialization call, owned by the
//! initializer for the duration of that call, and discarded after use.

use crate::model::entity::{ColumnType, DefaultValue, ForeignKeyAction};
use thiserror::Error;

/// Model compilation / validation failure.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Duplicate entity name: {0}")]
    DuplicateEntity(String),
    #[error("Duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("Table {0} has no primary key")]
    MissingPrimaryKey(String),
    #[error("Foreign key on {table}.{column} references unknown target {target}")]
    UnknownForeignKeyTarget {
        table: String,
        column: String,
        target: String,
    },
    #[error("Duplicate index name: {0}")]
    DuplicateIndex(String),
}

/// A column in a compiled table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnModel {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
    /// Uniqueness *marker* carried over from the property definition.
    /// Only the uniqueness convention turns it into a constraint.
    pub unique_marker: bool,
    pub default: Option<DefaultValue>,
}

/// A (possibly unique) index on a compiled table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexModel {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// A foreign key on a compiled table. References the final table name.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyModel {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

/// A table in the compiled model.
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub name: String,
    pub columns: Vec<ColumnModel>,
    pub foreign_keys: Vec<ForeignKeyModel>,
    pub indexes: Vec<IndexModel>,
}

impl TableModel {
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&IndexModel> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn primary_key_columns(&self) -> Vec<&ColumnModel> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }
}

/// Mutable model under construction; conventions rewrite it in order.
#[derive(Debug, Clone, Default)]
pub struct ModelDraft {
    pub tables: Vec<TableModel>,
}

impl ModelDraft {
    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableModel> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}

/// Immutable compiled model, bound to the connection it was built against.
#[derive(Debug, Clone)]
pub struct Model {
    connection_string: String,
    tables: Vec<TableModel>,
}

impl Model {
    pub(crate) fn new(connection_string: String, tables: Vec<TableModel>) -> Self {
        Model {
            connection_string,
            tables,
        }
    }

    /// The connection string this model was compiled against.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn tables(&self) -> &[TableModel] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableModel> {
        self.tables.iter().find(|t| t.name == name)
    }
}
