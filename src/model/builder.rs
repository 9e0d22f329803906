//! Model builder: compiles declarative entities into a connection-bound
//! `Model` by running the convention set over a draft and validating the
//! result.

use crate::conventions::{
    ConventionSet, ForeignKeyIndex, IdPrimaryKey, TableNaming, TimestampConcurrency,
};
use crate::model::compiled::{
    ColumnModel, ForeignKeyModel, Model, ModelDraft, ModelError, TableModel,
};
use crate::model::entity::EntityDef;
use std::collections::HashSet;

/// Builds compiled models from declarative entities.
///
/// `new` installs the framework-default convention set; the SQLite
/// initializer patches that set once at construction.
pub struct ModelBuilder {
    entities: Vec<EntityDef>,
    conventions: ConventionSet,
}

impl ModelBuilder {
    pub fn new() -> Self {
        let mut conventions = ConventionSet::new();
        conventions.add(Box::new(IdPrimaryKey));
        conventions.add(Box::new(TableNaming));
        conventions.add(Box::new(TimestampConcurrency));
        conventions.add(Box::new(ForeignKeyIndex));
        ModelBuilder {
            entities: Vec::new(),
            conventions,
        }
    }

    pub fn add_entity(&mut self, entity: EntityDef) -> &mut Self {
        self.entities.push(entity);
        self
    }

    pub fn entities(&self) -> &[EntityDef] {
        &self.entities
    }

    pub fn conventions(&self) -> &ConventionSet {
        &self.conventions
    }

    pub fn conventions_mut(&mut self) -> &mut ConventionSet {
        &mut self.conventions
    }

    /// Compile the model against a connection string.
    ///
    /// Maps entities to raw tables, applies every convention in set order,
    /// then validates the result.
    pub fn build(&self, connection_string: &str) -> Result<Model, ModelError> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(ModelError::DuplicateEntity(entity.name.clone()));
            }
        }

        let mut draft = ModelDraft {
            tables: self.entities.iter().map(raw_table).collect(),
        };
        self.conventions.apply_all(&mut draft);
        validate(&draft)?;

        Ok(Model::new(connection_string.to_string(), draft.tables))
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        ModelBuilder::new()
    }
}

fn raw_table(entity: &EntityDef) -> TableModel {
    TableModel {
        name: entity.name.clone(),
        columns: entity
            .properties
            .iter()
            .map(|p| ColumnModel {
                name: p.name.clone(),
                column_type: p.column_type,
                not_null: p.not_null,
                primary_key: p.primary_key,
                unique_marker: p.unique,
                default: p.default.clone(),
            })
            .collect(),
        foreign_keys: entity
            .foreign_keys
            .iter()
            .map(|fk| ForeignKeyModel {
                column: fk.column.clone(),
                referenced_table: fk.references_entity.clone(),
                referenced_column: fk.references_property.clone(),
                on_delete: fk.on_delete,
                on_update: fk.on_update,
            })
            .collect(),
        indexes: Vec::new(),
    }
}

fn validate(draft: &ModelDraft) -> Result<(), ModelError> {
    let mut index_names = HashSet::new();

    for table in &draft.tables {
        let mut column_names = HashSet::new();
        for column in &table.columns {
            if !column_names.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        if !table.columns.iter().any(|c| c.primary_key) {
            return Err(ModelError::MissingPrimaryKey(table.name.clone()));
        }

        for index in &table.indexes {
            if !index_names.insert(index.name.clone()) {
                return Err(ModelError::DuplicateIndex(index.name.clone()));
            }
        }

        for fk in &table.foreign_keys {
            let target = draft
                .tables
                .iter()
                .find(|t| t.name == fk.referenced_table)
                .and_then(|t| t.column(&fk.referenced_column));
            if target.is_none() {
                return Err(ModelError::UnknownForeignKeyTarget {
                    table: table.name.clone(),
                    column: fk.column.clone(),
                    target: format!("{}.{}", fk.referenced_table, fk.referenced_column),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::ConventionKind;
    use crate::model::entity::{ColumnType, ForeignKeyDef, PropertyDef};

    fn sample_builder() -> ModelBuilder {
        let mut builder = ModelBuilder::new();
        builder.add_entity(
            EntityDef::new("User")
                .with_property(PropertyDef::new("id", ColumnType::Integer))
                .with_property(PropertyDef::new("email", ColumnType::Text).required().unique()),
        );
        builder.add_entity(
            EntityDef::new("Post")
                .with_property(PropertyDef::new("id", ColumnType::Integer))
                .with_property(PropertyDef::new("title", ColumnType::Text).required())
                .with_property(PropertyDef::new("user_id", ColumnType::Integer).required())
                .with_foreign_key(ForeignKeyDef::new("user_id", "User", "id")),
        );
        builder
    }

    #[test]
    fn test_default_convention_set() {
        let builder = ModelBuilder::new();
        assert_eq!(
            builder.conventions().kinds(),
            vec![
                ConventionKind::IdPrimaryKey,
                ConventionKind::TableNaming,
                ConventionKind::TimestampConcurrency,
                ConventionKind::ForeignKeyIndex,
            ]
        );
    }

    #[test]
    fn test_build_applies_conventions_in_order() {
        let model = sample_builder().build("Data Source=test.db").expect("build failed");

        assert_eq!(model.connection_string(), "Data Source=test.db");
        let users = model.table("users").expect("users table missing");
        assert!(users.column("id").unwrap().primary_key);
        // Default set still contains TimestampConcurrency.
        assert!(users.column("row_version").is_some());

        let posts = model.table("posts").expect("posts table missing");
        assert_eq!(posts.foreign_keys[0].referenced_table, "users");
        // Without the SQLite naming convention the default name survives.
        assert!(posts.index("IX_user_id").is_some());
    }

    #[test]
    fn test_unique_marker_carried_but_not_constrained_by_default() {
        let model = sample_builder().build("Data Source=test.db").expect("build failed");
        let users = model.table("users").unwrap();
        assert!(users.column("email").unwrap().unique_marker);
        assert!(users.indexes.iter().all(|i| !i.unique));
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let mut builder = ModelBuilder::new();
        builder.add_entity(
            EntityDef::new("User").with_property(PropertyDef::new("id", ColumnType::Integer)),
        );
        builder.add_entity(
            EntityDef::new("User").with_property(PropertyDef::new("id", ColumnType::Integer)),
        );
        let result = builder.build("Data Source=test.db");
        assert!(matches!(result, Err(ModelError::DuplicateEntity(name)) if name == "User"));
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        let mut builder = ModelBuilder::new();
        builder.add_entity(
            EntityDef::new("Note").with_property(PropertyDef::new("body", ColumnType::Text)),
        );
        let result = builder.build("Data Source=test.db");
        assert!(matches!(result, Err(ModelError::MissingPrimaryKey(_))));
    }

    #[test]
    fn test_unknown_foreign_key_target_rejected() {
        let mut builder = ModelBuilder::new();
        builder.add_entity(
            EntityDef::new("Post")
                .with_property(PropertyDef::new("id", ColumnType::Integer))
                .with_property(PropertyDef::new("user_id", ColumnType::Integer))
                .with_foreign_key(ForeignKeyDef::new("user_id", "User", "id")),
        );
        let result = builder.build("Data Source=test.db");
        assert!(matches!(
            result,
            Err(ModelError::UnknownForeignKeyTarget { .. })
        ));
    }
}
