//! Database context: owns the connection pool and tracks pending seed rows.

use crate::connection;
use crate::error::InitError;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::PathBuf;
use tracing::debug;

/// A SQL value that can be staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Boolean(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

#[derive(Debug, Clone)]
struct PendingRow {
    table: String,
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

/// Context bound to one SQLite database.
///
/// The context owns the connection pool; the initializer only begins and
/// ends transactions on it. Staged rows are persisted exclusively by
/// [`DbContext::save_changes_in`], inside a caller-supplied transaction.
pub struct DbContext {
    connection_string: String,
    pool: SqlitePool,
    pending: Vec<PendingRow>,
}

impl DbContext {
    /// Open a context for the given connection string.
    ///
    /// Resolves the database path, ensures its parent directory exists, and
    /// opens a pool in read-write-create mode with pragmas configured on
    /// every connection.
    pub async fn connect(connection_string: &str) -> Result<Self, InitError> {
        let path = connection::database_path(connection_string)?;
        connection::ensure_parent_dir(&path)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .after_connect(|conn, _meta| Box::pin(async move { configure_pragmas(conn).await }))
            .connect(&format!("sqlite:{}?mode=rwc", path.display()))
            .await?;

        Ok(DbContext {
            connection_string: connection_string.to_string(),
            pool,
            pending: Vec::new(),
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The database file path derived from this context's connection string.
    pub fn database_path(&self) -> Result<PathBuf, InitError> {
        connection::database_path(&self.connection_string)
    }

    /// Stage a row for insertion. Nothing touches the database until
    /// [`DbContext::save_changes_in`] runs.
    pub fn queue_insert(&mut self, table: &str, columns: &[&str], values: Vec<SqlValue>) {
        self.pending.push(PendingRow {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values,
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Persist every staged row inside the supplied transaction.
    ///
    /// The queue is cleared only after all rows executed; on error the
    /// staged rows remain queued and the caller decides what to do with the
    /// transaction.
    pub async fn save_changes_in(
        &mut self,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<usize, sqlx::Error> {
        for row in &self.pending {
            let columns = row
                .columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; row.values.len()].join(", ");
            let sql = format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                row.table, columns, placeholders
            );

            let mut query = sqlx::query(&sql);
            for value in &row.values {
                query = bind_value(query, value);
            }
            query.execute(&mut **tx).await?;
        }

        let persisted = self.pending.len();
        self.pending.clear();
        Ok(persisted)
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Blob(v) => query.bind(v.as_slice()),
        SqlValue::Boolean(v) => query.bind(*v),
    }
}

async fn configure_pragmas(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the actual mode set; must use fetch to get result
    sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    debug!("SQLite pragmas configured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn connection_string(temp_dir: &TempDir) -> String {
        format!(
            "Data Source={}",
            temp_dir.path().join("test.db").to_string_lossy()
        )
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let cs = connection_string(&temp_dir);
        let ctx = DbContext::connect(&cs).await.expect("connect failed");

        assert!(ctx.database_path().unwrap().exists());

        let result: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(ctx.pool())
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_connection_string() {
        let result = DbContext::connect("Cache=Shared").await;
        assert!(matches!(result, Err(InitError::ConnectionString(_))));
    }

    #[tokio::test]
    async fn test_pragmas_configured() {
        let temp_dir = TempDir::new().unwrap();
        let cs = connection_string(&temp_dir);
        let ctx = DbContext::connect(&cs).await.expect("connect failed");

        let result: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(ctx.pool())
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_save_changes_persists_staged_rows() {
        let temp_dir = TempDir::new().unwrap();
        let cs = connection_string(&temp_dir);
        let mut ctx = DbContext::connect(&cs).await.expect("connect failed");

        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
            .execute(ctx.pool())
            .await
            .expect("create table failed");

        ctx.queue_insert(
            "notes",
            &["id", "body"],
            vec![SqlValue::Integer(1), SqlValue::from("hello")],
        );
        ctx.queue_insert(
            "notes",
            &["id", "body"],
            vec![SqlValue::Integer(2), SqlValue::Null],
        );
        assert_eq!(ctx.pending_count(), 2);

        let pool = ctx.pool().clone();
        let mut tx = pool.begin().await.expect("begin failed");
        let persisted = ctx.save_changes_in(&mut tx).await.expect("save failed");
        tx.commit().await.expect("commit failed");

        assert_eq!(persisted, 2);
        assert_eq!(ctx.pending_count(), 0);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
            .fetch_one(ctx.pool())
            .await
            .expect("count failed");
        assert_eq!(count.0, 2);
    }

    #[tokio::test]
    async fn test_save_changes_error_keeps_queue() {
        let temp_dir = TempDir::new().unwrap();
        let cs = connection_string(&temp_dir);
        let mut ctx = DbContext::connect(&cs).await.expect("connect failed");

        ctx.queue_insert("missing_table", &["id"], vec![SqlValue::Integer(1)]);

        let pool = ctx.pool().clone();
        let mut tx = pool.begin().await.expect("begin failed");
        let result = ctx.save_changes_in(&mut tx).await;
        tx.rollback().await.ok();

        assert!(result.is_err());
        assert_eq!(ctx.pending_count(), 1);
    }
}
