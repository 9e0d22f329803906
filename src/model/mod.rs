//! Declarative entity model and its compiled form.
//!
//! This module provides:
//! - Declarative input types (`EntityDef`, `PropertyDef`, ...)
//! - The `ModelBuilder` that compiles them through the convention set
//! - The compiled, connection-bound `Model`

pub mod builder;
pub mod compiled;
pub mod entity;

pub use builder::ModelBuilder;
pub use compiled::{
    ColumnModel, ForeignKeyModel, IndexModel, Model, ModelDraft, ModelError, TableModel,
};
pub use entity::{
    ColumnType, DefaultValue, EntityDef, ForeignKeyAction, ForeignKeyDef, PropertyDef,
};
