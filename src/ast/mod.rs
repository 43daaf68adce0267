//! The document-operation AST.
//!
//! - [`DocumentAst`]: one operation against one collection
//! - [`FilterItem`]: predicate tree
//! - [`PipelineStage`] / [`Expression`]: aggregation
//! - [`UpdateOperation`] / [`Document`]: write payloads

pub mod builders;
pub mod document;
pub mod filter;
pub mod operators;
pub mod pipeline;
pub mod update;
pub mod validate;

pub use document::DocumentAst;
pub use filter::*;
pub use operators::*;
pub use pipeline::*;
pub use update::*;
pub use validate::*;
