//! Schema collaborator: collection and field definitions.
//!
//! The builder and renderers never look at a schema. Only the schema-bound
//! factory ([`crate::DocQl`]) does, through the [`SchemaLookup`] trait.
//! [`SchemaIndex`] is the bundled implementation, built from a [`Schema`]
//! that can be written by hand or loaded from TOML:
//!
//! ```toml
//! [[collections]]
//! name = "users"
//!
//! [[collections.fields]]
//! name = "email"
//! type = "string"
//! required = true
//!
//! [[collections.fields]]
//! name = "address"
//! type = "object"
//!
//! [[collections.fields.fields]]
//! name = "city"
//! type = "string"
//! ```

use crate::error::{DocqlError, DocqlResult};
use crate::ident::validate_identifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Read-only view of a schema.
pub trait SchemaLookup {
    fn has_collection(&self, collection: &str) -> bool;

    /// `path` is the full dot path, e.g. `address.city`.
    fn has_field(&self, collection: &str, path: &str) -> bool;

    fn field_type(&self, collection: &str, path: &str) -> Option<FieldType>;

    fn is_field_required(&self, collection: &str, path: &str) -> bool;

    fn collection_names(&self) -> Vec<String>;

    fn field_paths(&self, collection: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Date,
    ObjectId,
    Object,
    Array,
    Binary,
    Any,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::ObjectId => "object_id",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Binary => "binary",
            FieldType::Any => "any",
        };
        f.write_str(s)
    }
}

/// A whole schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub collections: Vec<CollectionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Sub-fields of an `object` field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
    /// Element type of an `array` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ArrayElement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayElement {
    #[serde(rename = "type")]
    pub element_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection (builder style).
    pub fn collection(mut self, name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        self.collections.push(CollectionDef {
            name: name.into(),
            fields,
        });
        self
    }

    pub fn from_toml_str(s: &str) -> DocqlResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> DocqlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            fields: Vec::new(),
            items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// An `object` field with sub-fields.
    pub fn object(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            ..Self::new(name, FieldType::Object)
        }
    }

    /// An `array` field whose elements are objects with `fields`.
    pub fn array_of_objects(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            items: Some(Box::new(ArrayElement {
                element_type: FieldType::Object,
                fields,
            })),
            ..Self::new(name, FieldType::Array)
        }
    }

    /// An `array` field of scalars.
    pub fn array_of(name: impl Into<String>, element_type: FieldType) -> Self {
        Self {
            items: Some(Box::new(ArrayElement {
                element_type,
                fields: Vec::new(),
            })),
            ..Self::new(name, FieldType::Array)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_type: FieldType,
    pub required: bool,
}

/// Flattened, path-indexed view of a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    collections: Vec<String>,
    fields: HashMap<String, BTreeMap<String, FieldInfo>>,
}

impl SchemaIndex {
    /// Index every field by full dot path. Object sub-fields and the fields of
    /// array-of-object elements are indexed under their parent's path.
    pub fn new(schema: &Schema) -> DocqlResult<Self> {
        let mut index = Self::default();
        for coll in &schema.collections {
            validate_identifier(&coll.name).map_err(|r| {
                DocqlError::Schema(format!("collection name '{}' {}", coll.name, r))
            })?;
            if index.fields.contains_key(&coll.name) {
                return Err(DocqlError::Schema(format!(
                    "duplicate collection '{}'",
                    coll.name
                )));
            }
            let mut paths = BTreeMap::new();
            index_fields(&coll.name, "", &coll.fields, &mut paths)?;
            index.collections.push(coll.name.clone());
            index.fields.insert(coll.name.clone(), paths);
        }
        Ok(index)
    }

    fn info(&self, collection: &str, path: &str) -> Option<&FieldInfo> {
        self.fields.get(collection)?.get(path)
    }
}

fn index_fields(
    collection: &str,
    prefix: &str,
    fields: &[FieldDef],
    out: &mut BTreeMap<String, FieldInfo>,
) -> DocqlResult<()> {
    for field in fields {
        validate_identifier(&field.name).map_err(|r| {
            DocqlError::Schema(format!(
                "field name '{}' in collection '{}' {}",
                field.name, collection, r
            ))
        })?;
        let path = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", prefix, field.name)
        };
        let info = FieldInfo {
            field_type: field.field_type,
            required: field.required,
        };
        if out.insert(path.clone(), info).is_some() {
            return Err(DocqlError::Schema(format!(
                "duplicate field '{}' in collection '{}'",
                path, collection
            )));
        }

        if field.field_type == FieldType::Object {
            index_fields(collection, &path, &field.fields, out)?;
        }
        if field.field_type == FieldType::Array
            && let Some(items) = &field.items
            && items.element_type == FieldType::Object
        {
            index_fields(collection, &path, &items.fields, out)?;
        }
    }
    Ok(())
}

impl SchemaLookup for SchemaIndex {
    fn has_collection(&self, collection: &str) -> bool {
        self.fields.contains_key(collection)
    }

    fn has_field(&self, collection: &str, path: &str) -> bool {
        self.info(collection, path).is_some()
    }

    fn field_type(&self, collection: &str, path: &str) -> Option<FieldType> {
        self.info(collection, path).map(|i| i.field_type)
    }

    fn is_field_required(&self, collection: &str, path: &str) -> bool {
        self.info(collection, path).is_some_and(|i| i.required)
    }

    fn collection_names(&self) -> Vec<String> {
        self.collections.clone()
    }

    fn field_paths(&self, collection: &str) -> Vec<String> {
        self.fields
            .get(collection)
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl TryFrom<&Schema> for SchemaIndex {
    type Error = DocqlError;

    fn try_from(schema: &Schema) -> DocqlResult<Self> {
        Self::new(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
[[collections]]
name = "users"

[[collections.fields]]
name = "email"
type = "string"
required = true

[[collections.fields]]
name = "address"
type = "object"

[[collections.fields.fields]]
name = "city"
type = "string"

[[collections.fields]]
name = "orders"
type = "array"

[collections.fields.items]
type = "object"

[[collections.fields.items.fields]]
name = "total"
type = "float"

[[collections]]
name = "products"
"#;

    #[test]
    fn test_load_from_toml() {
        let schema = Schema::from_toml_str(SCHEMA).unwrap();
        assert_eq!(schema.collections.len(), 2);

        let index = SchemaIndex::new(&schema).unwrap();
        assert_eq!(index.collection_names(), vec!["users", "products"]);
        assert!(index.has_field("users", "email"));
        assert!(index.has_field("users", "address.city"));
        assert!(index.has_field("users", "orders.total"));
        assert!(!index.has_field("users", "city"));
        assert!(index.is_field_required("users", "email"));
        assert!(!index.is_field_required("users", "address"));
        assert_eq!(index.field_type("users", "orders.total"), Some(FieldType::Float));
        assert!(index.field_paths("products").is_empty());
    }

    #[test]
    fn test_programmatic_schema() {
        let schema = Schema::new().collection(
            "posts",
            vec![
                FieldDef::new("title", FieldType::String).required(),
                FieldDef::array_of("tags", FieldType::String),
                FieldDef::array_of_objects("comments", vec![FieldDef::new("body", FieldType::String)]),
            ],
        );
        let index = SchemaIndex::new(&schema).unwrap();
        assert_eq!(
            index.field_paths("posts"),
            vec!["comments", "comments.body", "tags", "title"]
        );
    }

    #[test]
    fn test_rejects_duplicates_and_bad_names() {
        let dup = Schema::new().collection("a", vec![]).collection("a", vec![]);
        assert!(matches!(SchemaIndex::new(&dup), Err(DocqlError::Schema(_))));

        let bad = Schema::new().collection("users", vec![FieldDef::new("drop table", FieldType::Any)]);
        assert!(SchemaIndex::new(&bad).is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Schema::from_toml_str("[[collections]]\nname = 1").unwrap_err();
        assert!(matches!(err, DocqlError::Toml(_)));
    }
}
