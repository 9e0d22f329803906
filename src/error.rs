use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for database initialization.
///
/// Schema-creation and seeding failures pass through as the original
/// `sqlx::Error`, never wrapped in extra context. The caller is the one
/// who observes and handles failures.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid connection string: {0}")]
    ConnectionString(String),
    #[error("Failed to create database directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Model(#[from] crate::model::ModelError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
