//! Mango-selector dialect (CouchDB `_find` and document writes).

use crate::ast::*;
use crate::error::{DocqlError, DocqlResult};
use crate::transpiler::{Params, QueryResult, Renderer, preflight, selected_paths, single, to_result};
use serde_json::{Map, Value, json};

const NAME: &str = "couch";

#[derive(Debug, Clone, Copy, Default)]
pub struct CouchRenderer;

impl Renderer for CouchRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, ast: &DocumentAst) -> DocqlResult<QueryResult> {
        preflight(self, ast)?;

        let mut params = Params::default();
        let mut query = Map::new();
        query.insert("database".into(), json!(ast.target.name()));

        match ast.operation {
            Operation::Find | Operation::FindOne => {
                let selector = match &ast.filter {
                    Some(filter) => render_selector(filter, &mut params)?,
                    None => Value::Object(Map::new()),
                };
                query.insert("selector".into(), selector);
                if let Some(projection) = &ast.projection {
                    let fields = selected_paths(NAME, projection)?;
                    if !fields.is_empty() {
                        query.insert("fields".into(), json!(fields));
                    }
                }
                if !ast.sort.is_empty() {
                    let sort = ast
                        .sort
                        .iter()
                        .map(|s| single(s.field.path(), json!(s.order.as_direction())))
                        .collect();
                    query.insert("sort".into(), Value::Array(sort));
                }
                if let Some(limit) = &ast.limit {
                    query.insert("limit".into(), params.pagination(limit));
                }
                if let Some(skip) = &ast.skip {
                    query.insert("skip".into(), params.pagination(skip));
                }
            }
            Operation::Insert => {
                query.insert("operation".into(), json!("insert"));
                if let Some(doc) = ast.documents.first() {
                    let body = doc
                        .fields
                        .iter()
                        .map(|(field, value)| (field.path().to_string(), params.bind(value)))
                        .collect();
                    query.insert("doc".into(), Value::Object(body));
                }
            }
            Operation::Update => {
                query.insert("operation".into(), json!("update"));
                if let Some(filter) = &ast.filter {
                    query.insert("selector".into(), render_selector(filter, &mut params)?);
                }
                let mut updates = Map::new();
                for op in &ast.update_ops {
                    if op.operator != UpdateOperator::Set {
                        return Err(DocqlError::unsupported(
                            NAME,
                            format!("update operator {}", op.operator),
                        ));
                    }
                    for (field, value) in &op.fields {
                        if let Some(value) = value {
                            updates.insert(field.path().to_string(), params.bind(value));
                        }
                    }
                }
                query.insert("updates".into(), Value::Object(updates));
            }
            Operation::Delete => {
                query.insert("operation".into(), json!("delete"));
                if let Some(filter) = &ast.filter {
                    query.insert("selector".into(), render_selector(filter, &mut params)?);
                }
            }
            Operation::InsertMany
            | Operation::UpdateMany
            | Operation::DeleteMany
            | Operation::Aggregate
            | Operation::Count
            | Operation::Distinct => {
                return Err(DocqlError::unsupported(NAME, format!("operation {}", ast.operation)));
            }
        }

        to_result(NAME, query, params)
    }

    fn supports_operation(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::Find
                | Operation::FindOne
                | Operation::Insert
                | Operation::Update
                | Operation::Delete
        )
    }

    fn supports_filter(&self, op: FilterOperator) -> bool {
        matches!(
            op,
            FilterOperator::Eq
                | FilterOperator::Ne
                | FilterOperator::Gt
                | FilterOperator::Gte
                | FilterOperator::Lt
                | FilterOperator::Lte
                | FilterOperator::In
                | FilterOperator::NotIn
                | FilterOperator::Regex
                | FilterOperator::Exists
        )
    }

    fn supports_logic(&self, logic: LogicOperator) -> bool {
        !matches!(logic, LogicOperator::Not)
    }

    fn supports_update(&self, op: UpdateOperator) -> bool {
        op == UpdateOperator::Set
    }

    fn supports_pipeline_stage(&self, _stage: StageKind) -> bool {
        false
    }
}

fn render_selector(item: &FilterItem, params: &mut Params) -> DocqlResult<Value> {
    match item {
        FilterItem::Condition(c) => {
            if !CouchRenderer.supports_filter(c.operator) {
                return Err(DocqlError::unsupported(NAME, format!("filter operator {}", c.operator)));
            }
            Ok(single(
                c.field.path(),
                single(c.operator.as_str(), params.bind(&c.value)),
            ))
        }
        FilterItem::Group(g) => {
            if !CouchRenderer.supports_logic(g.logic) {
                return Err(DocqlError::unsupported(NAME, format!("logic operator {}", g.logic)));
            }
            let children = g
                .conditions
                .iter()
                .map(|c| render_selector(c, params))
                .collect::<DocqlResult<Vec<_>>>()?;
            Ok(single(g.logic.as_str(), Value::Array(children)))
        }
        FilterItem::Range(r) => {
            let mut bounds = Map::new();
            if let Some(min) = &r.min {
                let op = if r.min_exclusive { "$gt" } else { "$gte" };
                bounds.insert(op.into(), params.bind(min));
            }
            if let Some(max) = &r.max {
                let op = if r.max_exclusive { "$lt" } else { "$lte" };
                bounds.insert(op.into(), params.bind(max));
            }
            Ok(single(r.field.path(), Value::Object(bounds)))
        }
        FilterItem::Regex(r) => {
            if r.options.is_some() {
                return Err(DocqlError::unsupported(NAME, "regex options"));
            }
            Ok(single(
                r.field.path(),
                single("$regex", params.bind(&r.pattern)),
            ))
        }
        FilterItem::Exists(e) => Ok(single(e.field.path(), json!({ "$exists": e.exists }))),
        FilterItem::TextSearch(_)
        | FilterItem::Geo(_)
        | FilterItem::Array(_)
        | FilterItem::ElemMatch(_) => Err(DocqlError::unsupported(NAME, item.kind())),
    }
}
