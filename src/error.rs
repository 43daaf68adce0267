//! Error types for DOCQL.

use crate::ast::{Operation, ValidationError};
use crate::ident::{IdentKind, InvalidReason};
use thiserror::Error;

/// The main error type for DOCQL operations.
#[derive(Debug, Error)]
pub enum DocqlError {
    /// A collection, field, or parameter name failed identifier validation.
    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidIdentifier {
        kind: IdentKind,
        name: String,
        reason: InvalidReason,
    },

    #[error("Collection '{name}' not found in schema{}", did_you_mean(.suggestion))]
    CollectionNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Field '{path}' not found in collection '{collection}'{}", did_you_mean(.suggestion))]
    FieldNotFound {
        collection: String,
        path: String,
        suggestion: Option<String>,
    },

    /// A builder method was called on an operation it does not apply to.
    #[error("{method}() can only be used with {requires} operations (got {operation})")]
    Incompatible {
        method: &'static str,
        operation: Operation,
        requires: &'static str,
    },

    /// An operator, operation, or dialect token did not parse.
    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    /// Any other construction failure.
    #[error("Builder error: {0}")]
    Builder(String),

    /// The AST violates a structural limit.
    #[error("Invalid AST: {0}")]
    Validation(#[from] ValidationError),

    /// The target dialect cannot express part of the AST.
    #[error("{dialect} does not support {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize query: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{}'?", s),
        None => String::new(),
    }
}

impl DocqlError {
    /// Create a capability error for a dialect.
    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            feature: feature.into(),
        }
    }

    /// Create an identifier error.
    pub fn invalid_identifier(kind: IdentKind, name: impl Into<String>, reason: InvalidReason) -> Self {
        Self::InvalidIdentifier {
            kind,
            name: name.into(),
            reason,
        }
    }

    /// True for errors raised by a renderer's capability checks.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type alias for DOCQL operations.
pub type DocqlResult<T> = Result<T, DocqlError>;
