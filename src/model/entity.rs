//! Declarative model types: entities, properties, foreign keys.
//!
//! These are the "code first" input: an in-memory description of the schema
//! to generate. All types are serde-derivable so a model can also be declared
//! as JSON.

use serde::{Deserialize, Serialize};

/// Column type of a property, mapped to a SQLite affinity at DDL time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
    CurrentTimestamp,
}

/// A property of an entity (becomes a column).
///
/// The `unique` flag is a *marker*: it requests uniqueness but only produces
/// a constraint when the uniqueness convention is in the convention set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
}

impl PropertyDef {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        PropertyDef {
            name: name.to_string(),
            column_type,
            not_null: false,
            primary_key: false,
            unique: false,
            default: None,
        }
    }

    /// Mark the property NOT NULL.
    pub fn required(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark the property as (part of) the primary key.
    pub fn key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    /// Mark the property with the uniqueness marker.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set a default value for the column.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Referential action for a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

/// A foreign key from a local column to another entity's property.
///
/// The reference is by *entity* name; naming conventions rewrite it to the
/// final table name during model compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub column: String,
    pub references_entity: String,
    pub references_property: String,
    #[serde(default = "ForeignKeyDef::default_action")]
    pub on_delete: ForeignKeyAction,
    #[serde(default = "ForeignKeyDef::default_action")]
    pub on_update: ForeignKeyAction,
}

impl ForeignKeyDef {
    fn default_action() -> ForeignKeyAction {
        ForeignKeyAction::NoAction
    }

    pub fn new(column: &str, references_entity: &str, references_property: &str) -> Self {
        ForeignKeyDef {
            column: column.to_string(),
            references_entity: references_entity.to_string(),
            references_property: references_property.to_string(),
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        }
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }
}

/// An entity in the declarative model (becomes a table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl EntityDef {
    pub fn new(name: &str) -> Self {
        EntityDef {
            name: name.to_string(),
            properties: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyDef) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_builder_flags() {
        let prop = PropertyDef::new("email", ColumnType::Text).required().unique();
        assert!(prop.not_null);
        assert!(prop.unique);
        assert!(!prop.primary_key);
    }

    #[test]
    fn test_key_implies_not_null() {
        let prop = PropertyDef::new("id", ColumnType::Integer).key();
        assert!(prop.primary_key);
        assert!(prop.not_null);
    }

    #[test]
    fn test_entity_from_json() {
        let json = r#"
        {
            "name": "User",
            "properties": [
                { "name": "id", "type": "integer", "primary_key": true, "not_null": true },
                { "name": "email", "type": "text", "unique": true }
            ],
            "foreign_keys": []
        }
        "#;

        let entity: EntityDef = serde_json::from_str(json).expect("parse failed");
        assert_eq!(entity.name, "User");
        assert_eq!(entity.properties.len(), 2);
        assert!(entity.properties[0].primary_key);
        assert!(entity.properties[1].unique);
    }

    #[test]
    fn test_foreign_key_default_actions() {
        let json = r#"
        { "column": "user_id", "references_entity": "User", "references_property": "id" }
        "#;
        let fk: ForeignKeyDef = serde_json::from_str(json).expect("parse failed");
        assert_eq!(fk.on_delete, ForeignKeyAction::NoAction);
        assert_eq!(fk.on_update, ForeignKeyAction::NoAction);
    }
}
