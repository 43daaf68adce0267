use super::Renderer;
use super::nosql::couch::CouchRenderer;
use super::nosql::dynamo::DynamoRenderer;
use super::nosql::firestore::FirestoreRenderer;
use super::nosql::mongo::MongoRenderer;
use crate::error::DocqlError;
use std::fmt;
use std::str::FromStr;

/// Supported document-database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Mongo,
    Dynamo,
    Firestore,
    Couch,
}

impl Dialect {
    pub const ALL: &'static [Dialect] = &[
        Dialect::Mongo,
        Dialect::Dynamo,
        Dialect::Firestore,
        Dialect::Couch,
    ];

    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            Dialect::Mongo => Box::new(MongoRenderer),
            Dialect::Dynamo => Box::new(DynamoRenderer),
            Dialect::Firestore => Box::new(FirestoreRenderer),
            Dialect::Couch => Box::new(CouchRenderer),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mongo => "mongo",
            Dialect::Dynamo => "dynamo",
            Dialect::Firestore => "firestore",
            Dialect::Couch => "couch",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Dialect::Mongo),
            "dynamo" | "dynamodb" => Ok(Dialect::Dynamo),
            "firestore" => Ok(Dialect::Firestore),
            "couch" | "couchdb" => Ok(Dialect::Couch),
            _ => Err(DocqlError::InvalidOperator(s.to_string())),
        }
    }
}
