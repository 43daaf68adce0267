//! Native-filter dialect (Firestore structured queries).
//!
//! Filters flatten into a `where` list of `{field, operator, value}` triples
//! that Firestore combines with AND. Compound `OR` / `NOR` groups cannot be
//! expressed and fail.
//!
//! A `NOT` group is flattened as AND and logged at warn level. The rendered
//! query matches the group's conditions rather than their negation, which on
//! a delete removes the complement of what was asked for. Callers that need
//! negation should check `supports_logic(LogicOperator::Not)`, which is
//! `false` here.

use crate::ast::*;
use crate::error::{DocqlError, DocqlResult};
use crate::ident::{Field, Param};
use crate::transpiler::{Params, QueryResult, Renderer, preflight, selected_paths, to_result};
use serde_json::{Map, Value, json};

const NAME: &str = "firestore";

/// Marker value for removed fields in update payloads.
pub const FIELD_DELETE: &str = "FieldValue.delete()";

/// Native-filter renderer. See the module docs for how `NOT` groups render.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirestoreRenderer;

impl Renderer for FirestoreRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, ast: &DocumentAst) -> DocqlResult<QueryResult> {
        preflight(self, ast)?;

        let mut params = Params::default();
        let mut query = Map::new();
        query.insert("collection".into(), json!(ast.target.name()));
        query.insert("operation".into(), json!(ast.operation.as_str()));

        match ast.operation {
            Operation::Find | Operation::FindOne => {
                insert_wheres(ast, &mut query, &mut params)?;
                if !ast.sort.is_empty() {
                    let order_by = ast
                        .sort
                        .iter()
                        .map(|s| json!({ "field": s.field.path(), "direction": s.order.as_direction() }))
                        .collect();
                    query.insert("orderBy".into(), Value::Array(order_by));
                }
                if let Some(limit) = &ast.limit {
                    query.insert("limit".into(), params.pagination(limit));
                }
                if let Some(skip) = &ast.skip {
                    query.insert("offset".into(), params.pagination(skip));
                }
                if let Some(projection) = &ast.projection {
                    let fields = selected_paths(NAME, projection)?;
                    if !fields.is_empty() {
                        query.insert("select".into(), json!(fields));
                    }
                }
            }
            Operation::Insert => {
                if let Some(doc) = ast.documents.first() {
                    let data = doc
                        .fields
                        .iter()
                        .map(|(field, value)| (field.path().to_string(), params.bind(value)))
                        .collect();
                    query.insert("data".into(), Value::Object(data));
                }
            }
            Operation::Update => {
                insert_wheres(ast, &mut query, &mut params)?;
                let mut data = Map::new();
                for op in &ast.update_ops {
                    for (field, value) in &op.fields {
                        if data.contains_key(field.path()) {
                            return Err(DocqlError::Builder(format!(
                                "'{}' is both set and unset in one update",
                                field.path()
                            )));
                        }
                        let v = match (op.operator, value) {
                            (UpdateOperator::Unset, _) => json!(FIELD_DELETE),
                            (UpdateOperator::Set, Some(p)) => params.bind(p),
                            (UpdateOperator::Set, None) => {
                                return Err(DocqlError::Builder(format!(
                                    "$set on '{}' requires a value",
                                    field.path()
                                )));
                            }
                            (other, _) => {
                                return Err(DocqlError::unsupported(
                                    NAME,
                                    format!("update operator {}", other),
                                ));
                            }
                        };
                        data.insert(field.path().to_string(), v);
                    }
                }
                query.insert("data".into(), Value::Object(data));
            }
            Operation::Delete => {
                insert_wheres(ast, &mut query, &mut params)?;
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
        where_operator(op).is_some()
    }

    fn supports_logic(&self, logic: LogicOperator) -> bool {
        logic == LogicOperator::And
    }

    fn supports_update(&self, op: UpdateOperator) -> bool {
        matches!(op, UpdateOperator::Set | UpdateOperator::Unset)
    }

    fn supports_pipeline_stage(&self, _stage: StageKind) -> bool {
        false
    }
}

fn where_operator(op: FilterOperator) -> Option<&'static str> {
    match op {
        FilterOperator::Eq => Some("=="),
        FilterOperator::Ne => Some("!="),
        FilterOperator::Gt => Some(">"),
        FilterOperator::Gte => Some(">="),
        FilterOperator::Lt => Some("<"),
        FilterOperator::Lte => Some("<="),
        FilterOperator::In => Some("in"),
        FilterOperator::NotIn => Some("not-in"),
        FilterOperator::All => Some("array-contains"),
        _ => None,
    }
}

fn insert_wheres(ast: &DocumentAst, query: &mut Map<String, Value>, params: &mut Params) -> DocqlResult<()> {
    if let Some(filter) = &ast.filter {
        let mut wheres = Vec::new();
        collect_wheres(filter, &mut wheres, params)?;
        query.insert("where".into(), Value::Array(wheres));
    }
    Ok(())
}

fn where_clause(field: &Field, operator: &str, value: &Param, params: &mut Params) -> Value {
    json!({
        "field": field.path(),
        "operator": operator,
        "value": params.bind(value),
    })
}

fn collect_wheres(item: &FilterItem, out: &mut Vec<Value>, params: &mut Params) -> DocqlResult<()> {
    match item {
        FilterItem::Condition(c) => {
            let Some(op) = where_operator(c.operator) else {
                return Err(DocqlError::unsupported(NAME, format!("filter operator {}", c.operator)));
            };
            out.push(where_clause(&c.field, op, &c.value, params));
        }
        FilterItem::Array(a) => {
            let Some(op) = where_operator(a.operator) else {
                return Err(DocqlError::unsupported(NAME, format!("filter operator {}", a.operator)));
            };
            out.push(where_clause(&a.field, op, &a.value, params));
        }
        FilterItem::Group(g) => {
            match g.logic {
                LogicOperator::And => {}
                LogicOperator::Not => {
                    tracing::warn!(logic = %g.logic, "firestore cannot negate a group; treating it as AND");
                }
                LogicOperator::Or | LogicOperator::Nor => {
                    return Err(DocqlError::unsupported(NAME, format!("logic operator {}", g.logic)));
                }
            }
            for c in &g.conditions {
                collect_wheres(c, out, params)?;
            }
        }
        FilterItem::Range(r) => {
            if let Some(min) = &r.min {
                let op = if r.min_exclusive { ">" } else { ">=" };
                out.push(where_clause(&r.field, op, min, params));
            }
            if let Some(max) = &r.max {
                let op = if r.max_exclusive { "<" } else { "<=" };
                out.push(where_clause(&r.field, op, max, params));
            }
        }
        FilterItem::Regex(_)
        | FilterItem::TextSearch(_)
        | FilterItem::Geo(_)
        | FilterItem::ElemMatch(_)
        | FilterItem::Exists(_) => return Err(DocqlError::unsupported(NAME, item.kind())),
    }
    Ok(())
}
