//! Code-first SQLite database initialization.
//!
//! Declare entities in code (or JSON), compile them through an ordered set
//! of modeling conventions, and let [`SqliteInitializer`] create and seed
//! the database in two independent transactions.

pub mod connection;
pub mod context;
pub mod conventions;
pub mod error;
pub mod initializer;
pub mod model;
pub mod schema;

pub use connection::{database_path, ConnectionOptions};
pub use context::{DbContext, SqlValue};
pub use conventions::{Convention, ConventionKind, ConventionSet};
pub use error::InitError;
pub use initializer::{Seeder, SqliteInitializer};
pub use model::{
    ColumnType, DefaultValue, EntityDef, ForeignKeyAction, ForeignKeyDef, Model, ModelBuilder,
    ModelError, PropertyDef,
};
pub use schema::{SchemaCreator, SqliteSchemaCreator};
