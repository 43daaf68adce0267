//! Renderers: lower a [`DocumentAst`] into a provider query document.
//!
//! Every renderer re-validates the AST, checks that the operation is
//! supported, and then walks the tree. Literal values never appear in the
//! output; each one is a `:<param>` placeholder and its name is appended to
//! [`QueryResult::required_params`] in traversal order.

pub mod dialect;
pub mod nosql;

pub use dialect::Dialect;
pub use nosql::couch::CouchRenderer;
pub use nosql::dynamo::DynamoRenderer;
pub use nosql::firestore::FirestoreRenderer;
pub use nosql::mongo::MongoRenderer;

#[cfg(test)]
mod tests;

use crate::ast::*;
use crate::error::{DocqlError, DocqlResult};
use crate::ident::Param;
use serde_json::{Map, Value};

/// A target dialect.
pub trait Renderer: Send + Sync {
    /// Short dialect name used in errors and logs.
    fn name(&self) -> &'static str;

    fn render(&self, ast: &DocumentAst) -> DocqlResult<QueryResult>;

    fn supports_operation(&self, op: Operation) -> bool;

    fn supports_filter(&self, op: FilterOperator) -> bool;

    fn supports_logic(&self, logic: LogicOperator) -> bool;

    fn supports_update(&self, op: UpdateOperator) -> bool;

    fn supports_pipeline_stage(&self, stage: StageKind) -> bool;
}

/// A rendered query plus the parameters the caller must bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub json: String,
    pub required_params: Vec<String>,
}

impl QueryResult {
    /// Parse the rendered JSON back into a value for inspection.
    pub fn value(&self) -> DocqlResult<Value> {
        Ok(serde_json::from_str(&self.json)?)
    }
}

/// Parameter names collected during one render walk.
#[derive(Debug, Default)]
pub(crate) struct Params {
    names: Vec<String>,
}

impl Params {
    /// Record `param` and return its placeholder.
    pub(crate) fn bind(&mut self, param: &Param) -> Value {
        self.names.push(param.name().to_string());
        Value::String(param.placeholder())
    }

    /// Static integer or bound placeholder, never both.
    pub(crate) fn pagination(&mut self, value: &Pagination) -> Value {
        match value {
            Pagination::Static(n) => Value::from(*n),
            Pagination::Param(p) => self.bind(p),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

/// Shared render preamble: structural validation then operation support.
pub(crate) fn preflight(renderer: &dyn Renderer, ast: &DocumentAst) -> DocqlResult<()> {
    tracing::debug!(
        dialect = renderer.name(),
        operation = %ast.operation,
        collection = %ast.target,
        "rendering query"
    );
    ast.validate()?;
    if !renderer.supports_operation(ast.operation) {
        return Err(DocqlError::unsupported(
            renderer.name(),
            format!("operation {}", ast.operation),
        ));
    }
    Ok(())
}

/// Serialize the finished query.
pub(crate) fn to_result(dialect: &'static str, query: Map<String, Value>, params: Params) -> DocqlResult<QueryResult> {
    let json = serde_json::to_string(&Value::Object(query))?;
    tracing::debug!(dialect, params = params.len(), bytes = json.len(), "rendered query");
    Ok(QueryResult {
        json,
        required_params: params.names,
    })
}

/// `{key: value}`
pub(crate) fn single(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

/// Paths of an include-only projection, for dialects that can only select
/// fields. Exclusions and projection operators fail rather than widen the
/// result.
pub(crate) fn selected_paths<'a>(dialect: &'static str, projection: &'a Projection) -> DocqlResult<Vec<&'a str>> {
    let mut paths = Vec::with_capacity(projection.fields.len());
    for pf in &projection.fields {
        if projection.exclude || !pf.include {
            return Err(DocqlError::unsupported(dialect, "exclude projection"));
        }
        if pf.slice.is_some() {
            return Err(DocqlError::unsupported(dialect, "projection $slice"));
        }
        if pf.elem_match.is_some() {
            return Err(DocqlError::unsupported(dialect, "projection $elemMatch"));
        }
        paths.push(pf.field.path());
    }
    Ok(paths)
}
