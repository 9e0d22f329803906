//! Schema creation: turns a compiled model into SQLite DDL and executes it.

use crate::model::{
    ColumnModel, ColumnType, DefaultValue, ForeignKeyAction, ForeignKeyModel, IndexModel, Model,
    TableModel,
};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

/// Collaborator that applies a compiled model to a connection.
///
/// All statements run on the supplied transaction; the initializer owns
/// commit and rollback.
#[async_trait]
pub trait SchemaCreator: Send + Sync {
    async fn create(
        &self,
        model: &Model,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), sqlx::Error>;
}

/// Default DDL emitter for SQLite.
///
/// Emits idempotent `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT
/// EXISTS` statements in deterministic order.
#[derive(Debug, Default)]
pub struct SqliteSchemaCreator;

impl SqliteSchemaCreator {
    pub fn new() -> Self {
        SqliteSchemaCreator
    }

    /// DDL statements for the whole model, tables first, then indexes.
    pub fn ddl_statements(&self, model: &Model) -> Vec<String> {
        let mut statements = Vec::new();
        for table in model.tables() {
            statements.push(create_table_sql(table));
        }
        for table in model.tables() {
            for index in &table.indexes {
                statements.push(create_index_sql(&table.name, index));
            }
        }
        statements
    }
}

#[async_trait]
impl SchemaCreator for SqliteSchemaCreator {
    async fn create(
        &self,
        model: &Model,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), sqlx::Error> {
        for statement in self.ddl_statements(model) {
            debug!(statement = %statement, "executing DDL");
            sqlx::query(&statement).execute(&mut **tx).await?;
        }
        Ok(())
    }
}

fn create_table_sql(table: &TableModel) -> String {
    let pk_columns = table.primary_key_columns();
    // A single integer key becomes a rowid-aliased autoincrement column;
    // anything else is a table-level PRIMARY KEY constraint.
    let inline_pk = pk_columns.len() == 1 && pk_columns[0].column_type == ColumnType::Integer;

    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|c| column_sql(c, inline_pk && c.primary_key))
        .collect();

    if !inline_pk && !pk_columns.is_empty() {
        let names = pk_columns
            .iter()
            .map(|c| quote(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("PRIMARY KEY ({})", names));
    }

    for fk in &table.foreign_keys {
        parts.push(foreign_key_sql(fk));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(&table.name),
        parts.join(", ")
    )
}

fn column_sql(column: &ColumnModel, inline_pk: bool) -> String {
    let mut sql = format!("{} {}", quote(&column.name), sqlite_type(column.column_type));
    if inline_pk {
        sql.push_str(" PRIMARY KEY AUTOINCREMENT");
    }
    if column.not_null && !inline_pk {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_sql(default));
    }
    sql
}

fn sqlite_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        ColumnType::Real => "REAL",
        ColumnType::Text => "TEXT",
        ColumnType::Blob => "BLOB",
    }
}

fn default_sql(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Integer(v) => v.to_string(),
        DefaultValue::Real(v) => v.to_string(),
        DefaultValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        DefaultValue::Null => "NULL".to_string(),
        DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
    }
}

fn foreign_key_sql(fk: &ForeignKeyModel) -> String {
    format!(
        "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
        quote(&fk.column),
        quote(&fk.referenced_table),
        quote(&fk.referenced_column),
        action_sql(fk.on_delete),
        action_sql(fk.on_update)
    )
}

fn action_sql(action: ForeignKeyAction) -> &'static str {
    match action {
        ForeignKeyAction::NoAction => "NO ACTION",
        ForeignKeyAction::Cascade => "CASCADE",
        ForeignKeyAction::SetNull => "SET NULL",
        ForeignKeyAction::SetDefault => "SET DEFAULT",
        ForeignKeyAction::Restrict => "RESTRICT",
    }
}

fn create_index_sql(table_name: &str, index: &IndexModel) -> String {
    let columns = index
        .columns
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        quote(&index.name),
        quote(table_name),
        columns
    )
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
