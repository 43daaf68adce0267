//! Schema-bound identifier factory.
//!
//! [`DocQl`] wraps a [`SchemaLookup`] and only hands out collections and
//! fields the schema knows about. Misses carry a "did you mean" suggestion.

use crate::error::{DocqlError, DocqlResult};
use crate::ident::{Collection, Field, Param};
use crate::schema::{FieldType, Schema, SchemaIndex, SchemaLookup};
use strsim::levenshtein;

/// Identifier factory validated against a schema.
#[derive(Debug, Clone)]
pub struct DocQl<S: SchemaLookup> {
    schema: S,
}

impl DocQl<SchemaIndex> {
    /// Index `schema` and bind to it.
    pub fn from_schema(schema: &Schema) -> DocqlResult<Self> {
        Ok(Self::new(SchemaIndex::new(schema)?))
    }
}

impl<S: SchemaLookup> DocQl<S> {
    pub fn new(schema: S) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// A collection that exists in the schema.
    pub fn try_c(&self, name: &str) -> DocqlResult<Collection> {
        let collection = Collection::try_new(name)?;
        if !self.schema.has_collection(name) {
            return Err(DocqlError::CollectionNotFound {
                name: name.to_string(),
                suggestion: did_you_mean(name, &self.schema.collection_names()),
            });
        }
        Ok(collection)
    }

    /// Panics if the collection is invalid or unknown.
    pub fn c(&self, name: &str) -> Collection {
        self.try_c(name).unwrap_or_else(|e| panic!("{e}"))
    }

    /// A field, by full dot path, that exists in `collection`.
    pub fn try_f(&self, collection: &str, path: &str) -> DocqlResult<Field> {
        let field = Field::try_new(collection, path)?;
        self.try_c(collection)?;
        if !self.schema.has_field(collection, path) {
            return Err(DocqlError::FieldNotFound {
                collection: collection.to_string(),
                path: path.to_string(),
                suggestion: did_you_mean(path, &self.schema.field_paths(collection)),
            });
        }
        Ok(field)
    }

    /// Panics if the field is invalid or unknown.
    pub fn f(&self, collection: &str, path: &str) -> Field {
        self.try_f(collection, path).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Parameters are not schema-bound; only the name is checked.
    pub fn try_p(&self, name: &str) -> DocqlResult<Param> {
        Param::try_new(name)
    }

    /// Panics if the name is invalid.
    pub fn p(&self, name: &str) -> Param {
        Param::new(name)
    }

    pub fn collections(&self) -> Vec<String> {
        self.schema.collection_names()
    }

    pub fn fields(&self, collection: &str) -> Vec<String> {
        self.schema.field_paths(collection)
    }

    pub fn field_type(&self, collection: &str, path: &str) -> Option<FieldType> {
        self.schema.field_type(collection, path)
    }

    pub fn is_field_required(&self, collection: &str, path: &str) -> bool {
        self.schema.is_field_required(collection, path)
    }
}

/// Closest candidate within a length-dependent edit distance.
fn did_you_mean(input: &str, candidates: &[String]) -> Option<String> {
    let threshold = match input.len() {
        0..=2 => 0,
        3..=5 => 2,
        _ => 3,
    };

    let mut best = None;
    let mut min_dist = usize::MAX;
    for cand in candidates {
        let dist = levenshtein(input, cand);
        if dist <= threshold && dist < min_dist {
            min_dist = dist;
            best = Some(cand.clone());
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDef;

    fn docql() -> DocQl<SchemaIndex> {
        let schema = Schema::new()
            .collection(
                "users",
                vec![
                    FieldDef::new("email", FieldType::String).required(),
                    FieldDef::new("status", FieldType::String),
                    FieldDef::object("address", vec![FieldDef::new("city", FieldType::String)]),
                ],
            )
            .collection("orders", vec![FieldDef::new("total", FieldType::Float)]);
        DocQl::from_schema(&schema).unwrap()
    }

    #[test]
    fn test_known_identifiers() {
        let db = docql();
        assert_eq!(db.c("users").name(), "users");
        let city = db.f("users", "address.city");
        assert_eq!(city.path(), "address.city");
        assert_eq!(city.collection(), "users");
        assert_eq!(db.p("status").placeholder(), ":status");
    }

    #[test]
    fn test_collection_suggestion() {
        let err = docql().try_c("usrs").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Collection 'usrs' not found in schema. Did you mean 'users'?"
        );

        let err = docql().try_c("invoices").unwrap_err();
        assert!(matches!(err, DocqlError::CollectionNotFound { suggestion: None, .. }));
    }

    #[test]
    fn test_field_suggestion() {
        let err = docql().try_f("users", "emial").unwrap_err();
        match err {
            DocqlError::FieldNotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("email"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_in_unknown_collection() {
        let err = docql().try_f("orderz", "total").unwrap_err();
        assert!(matches!(err, DocqlError::CollectionNotFound { .. }));
    }

    #[test]
    fn test_invalid_names_fail_before_lookup() {
        let db = docql();
        assert!(matches!(db.try_c("users; drop"), Err(DocqlError::InvalidIdentifier { .. })));
        assert!(matches!(db.try_f("users", "e-mail"), Err(DocqlError::InvalidIdentifier { .. })));
        assert!(matches!(db.try_p("1abc"), Err(DocqlError::InvalidIdentifier { .. })));
    }

    #[test]
    fn test_short_names_need_exact_match() {
        assert_eq!(did_you_mean("ab", &["ac".to_string()]), None);
        assert_eq!(did_you_mean("ab", &["ab".to_string()]), Some("ab".to_string()));
    }

    #[test]
    fn test_schema_queries() {
        let db = docql();
        assert_eq!(db.collections(), vec!["users", "orders"]);
        assert_eq!(db.fields("users"), vec!["address", "address.city", "email", "status"]);
        assert_eq!(db.field_type("orders", "total"), Some(FieldType::Float));
        assert!(db.is_field_required("users", "email"));
        assert!(!db.is_field_required("users", "status"));
        assert!(db.fields("missing").is_empty());
    }

    #[test]
    #[should_panic(expected = "not found in schema")]
    fn test_c_panics_on_unknown() {
        docql().c("nope");
    }
}
