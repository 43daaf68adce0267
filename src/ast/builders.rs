//! Free constructor functions for filters, expressions, accumulators and
//! insert documents.
//!
//! ```
//! use docql::ast::builders::*;
//! use docql::{Field, Param};
//!
//! let status = Field::new("users", "status");
//! let age = Field::new("users", "age");
//! let filter = and([
//!     eq(status, Param::new("status")),
//!     gte(age, Param::new("min_age")),
//! ]);
//! assert_eq!(filter.nesting(), 1);
//! ```

pub mod aggregates;
pub mod conditions;

pub use aggregates::*;
pub use conditions::*;
