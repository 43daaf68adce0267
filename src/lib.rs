//! # DOCQL: schema-validated queries for document databases
//!
//! Build one query AST and render it for several document stores.
//!
//! ## Quick Example
//!
//! ```
//! use docql::prelude::*;
//!
//! let users = Collection::new("users");
//! let status = Field::new("users", "status");
//!
//! let ast = find(users)
//!     .filter(eq(status, Param::new("status")))
//!     .limit(10)
//!     .build()
//!     .unwrap();
//!
//! let mongo = MongoRenderer.render(&ast).unwrap();
//! assert!(mongo.json.contains(r#""filter":{"status":{"$eq":":status"}}"#));
//!
//! let couch = CouchRenderer.render(&ast).unwrap();
//! assert!(couch.json.contains(r#""selector""#));
//! assert_eq!(couch.required_params, vec!["status"]);
//! ```
//!
//! ## Dialects
//!
//! | Dialect     | Renderer            | Shape                                |
//! |-------------|---------------------|--------------------------------------|
//! | `mongo`     | [`MongoRenderer`]     | query documents, full pipeline       |
//! | `dynamo`    | [`DynamoRenderer`]    | expression strings with aliases      |
//! | `firestore` | [`FirestoreRenderer`] | `where` triples, AND only            |
//! | `couch`     | [`CouchRenderer`]     | Mango selectors                      |
//!
//! Values never appear in rendered output. Every value is a named
//! [`Param`] rendered as `:name` and listed in
//! [`QueryResult::required_params`].

pub mod ast;
pub mod builder;
pub mod error;
pub mod ident;
pub mod instance;
pub mod schema;
pub mod transpiler;

pub use builder::Builder;
pub use error::{DocqlError, DocqlResult};
pub use ident::{Collection, Field, Param};
pub use instance::DocQl;
pub use schema::{Schema, SchemaIndex, SchemaLookup};
pub use transpiler::{
    CouchRenderer, Dialect, DynamoRenderer, FirestoreRenderer, MongoRenderer, QueryResult,
    Renderer,
};

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::builder::Builder;
    pub use crate::error::{DocqlError, DocqlResult};
    pub use crate::ident::{Collection, Field, Param};
    pub use crate::instance::DocQl;
    pub use crate::schema::{FieldDef, FieldType, Schema, SchemaIndex, SchemaLookup};
    pub use crate::transpiler::{
        CouchRenderer, Dialect, DynamoRenderer, FirestoreRenderer, MongoRenderer, QueryResult,
        Renderer,
    };
    pub use crate::{
        aggregate, count, delete, delete_many, distinct, find, find_one, insert, insert_many,
        update, update_many,
    };
}

pub fn find(target: Collection) -> Builder {
    Builder::find(target)
}

pub fn find_one(target: Collection) -> Builder {
    Builder::find_one(target)
}

pub fn insert(target: Collection) -> Builder {
    Builder::insert(target)
}

pub fn insert_many(target: Collection) -> Builder {
    Builder::insert_many(target)
}

pub fn update(target: Collection) -> Builder {
    Builder::update(target)
}

/// Requires a filter to build.
pub fn update_many(target: Collection) -> Builder {
    Builder::update_many(target)
}

pub fn delete(target: Collection) -> Builder {
    Builder::delete(target)
}

/// Requires a filter to build.
pub fn delete_many(target: Collection) -> Builder {
    Builder::delete_many(target)
}

pub fn aggregate(target: Collection) -> Builder {
    Builder::aggregate(target)
}

pub fn count(target: Collection) -> Builder {
    Builder::count(target)
}

pub fn distinct(target: Collection, field: Field) -> Builder {
    Builder::distinct(target, field)
}
