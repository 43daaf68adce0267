//! Key-value dialect (DynamoDB request shapes).
//!
//! Field names are aliased as `#n0, #n1, ...` and values as `:v0, :v1, ...`
//! through `ExpressionAttributeNames` / `ExpressionAttributeValues`; each
//! value alias maps to the caller's `:<param>` placeholder.

use crate::ast::*;
use crate::error::{DocqlError, DocqlResult};
use crate::ident::Param;
use crate::transpiler::{Params, QueryResult, Renderer, preflight, selected_paths, to_result};
use serde_json::{Map, Value, json};

const NAME: &str = "dynamo";

#[derive(Debug, Clone, Copy, Default)]
pub struct DynamoRenderer;

impl Renderer for DynamoRenderer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn render(&self, ast: &DocumentAst) -> DocqlResult<QueryResult> {
        preflight(self, ast)?;

        let mut params = Params::default();
        let mut aliases = Aliases::default();
        let mut query = Map::new();
        query.insert("TableName".into(), json!(ast.target.name()));

        match ast.operation {
            Operation::Find | Operation::FindOne => {
                if !ast.sort.is_empty() {
                    tracing::warn!(collection = %ast.target, "dynamo has no sort for scans; ignoring sort");
                }
                if ast.skip.is_some() {
                    tracing::warn!(collection = %ast.target, "dynamo has no offset; ignoring skip");
                }

                let filter = render_condition(ast, &mut aliases, &mut params)?;
                let projection = match &ast.projection {
                    Some(p) => selected_paths(NAME, p)?
                        .into_iter()
                        .map(|path| aliases.name(path))
                        .collect::<Vec<_>>()
                        .join(", "),
                    None => String::new(),
                };

                if let Some(expr) = filter {
                    query.insert("FilterExpression".into(), json!(expr));
                }
                aliases.insert_into(&mut query);
                if let Some(limit) = &ast.limit {
                    query.insert("Limit".into(), params.pagination(limit));
                }
                if !projection.is_empty() {
                    query.insert("ProjectionExpression".into(), json!(projection));
                }
            }
            Operation::Insert => {
                if let Some(doc) = ast.documents.first() {
                    let item = doc
                        .fields
                        .iter()
                        .map(|(field, value)| (field.path().to_string(), params.bind(value)))
                        .collect();
                    query.insert("Item".into(), Value::Object(item));
                }
            }
            Operation::Update => {
                let condition = render_condition(ast, &mut aliases, &mut params)?;
                let update = render_update(&ast.update_ops, &mut aliases, &mut params)?;
                query.insert("UpdateExpression".into(), json!(update));
                if let Some(expr) = condition {
                    query.insert("ConditionExpression".into(), json!(expr));
                }
                aliases.insert_into(&mut query);
            }
            Operation::Delete => {
                if let Some(expr) = render_condition(ast, &mut aliases, &mut params)? {
                    query.insert("ConditionExpression".into(), json!(expr));
                }
                aliases.insert_into(&mut query);
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
        op.is_comparison() || op == FilterOperator::Exists
    }

    fn supports_logic(&self, logic: LogicOperator) -> bool {
        matches!(logic, LogicOperator::And | LogicOperator::Or)
    }

    fn supports_update(&self, op: UpdateOperator) -> bool {
        matches!(op, UpdateOperator::Set | UpdateOperator::Unset | UpdateOperator::Inc)
    }

    fn supports_pipeline_stage(&self, _stage: StageKind) -> bool {
        false
    }
}

/// Attribute name and value placeholders for one request.
#[derive(Debug, Default)]
struct Aliases {
    names: Map<String, Value>,
    values: Map<String, Value>,
}

impl Aliases {
    fn name(&mut self, path: &str) -> String {
        let key = format!("#n{}", self.names.len());
        self.names.insert(key.clone(), json!(path));
        key
    }

    fn value(&mut self, params: &mut Params, param: &Param) -> String {
        let key = format!(":v{}", self.values.len());
        self.values.insert(key.clone(), params.bind(param));
        key
    }

    fn insert_into(self, query: &mut Map<String, Value>) {
        if !self.names.is_empty() {
            query.insert("ExpressionAttributeNames".into(), Value::Object(self.names));
        }
        if !self.values.is_empty() {
            query.insert("ExpressionAttributeValues".into(), Value::Object(self.values));
        }
    }
}

fn render_condition(
    ast: &DocumentAst,
    aliases: &mut Aliases,
    params: &mut Params,
) -> DocqlResult<Option<String>> {
    match &ast.filter {
        Some(filter) => {
            let expr = render_filter(filter, aliases, params)?;
            Ok(Some(expr).filter(|e| !e.is_empty()))
        }
        None => Ok(None),
    }
}

fn comparison(op: FilterOperator) -> Option<&'static str> {
    match op {
        FilterOperator::Eq => Some("="),
        FilterOperator::Ne => Some("<>"),
        FilterOperator::Gt => Some(">"),
        FilterOperator::Gte => Some(">="),
        FilterOperator::Lt => Some("<"),
        FilterOperator::Lte => Some("<="),
        _ => None,
    }
}

fn render_filter(item: &FilterItem, aliases: &mut Aliases, params: &mut Params) -> DocqlResult<String> {
    match item {
        FilterItem::Condition(c) => {
            let Some(op) = comparison(c.operator) else {
                return Err(DocqlError::unsupported(NAME, format!("filter operator {}", c.operator)));
            };
            let name = aliases.name(c.field.path());
            let value = aliases.value(params, &c.value);
            Ok(format!("{} {} {}", name, op, value))
        }
        FilterItem::Group(g) => {
            let joiner = match g.logic {
                LogicOperator::And => " AND ",
                LogicOperator::Or => " OR ",
                LogicOperator::Nor | LogicOperator::Not => {
                    return Err(DocqlError::unsupported(NAME, format!("logic operator {}", g.logic)));
                }
            };
            let parts = g
                .conditions
                .iter()
                .map(|c| render_filter(c, aliases, params).map(|e| format!("({})", e)))
                .collect::<DocqlResult<Vec<_>>>()?;
            Ok(parts.join(joiner))
        }
        FilterItem::Range(r) => {
            let name = aliases.name(r.field.path());
            let mut parts = Vec::new();
            if let Some(min) = &r.min {
                let op = if r.min_exclusive { ">" } else { ">=" };
                parts.push(format!("{} {} {}", name, op, aliases.value(params, min)));
            }
            if let Some(max) = &r.max {
                let op = if r.max_exclusive { "<" } else { "<=" };
                parts.push(format!("{} {} {}", name, op, aliases.value(params, max)));
            }
            if parts.is_empty() {
                return Err(DocqlError::unsupported(NAME, "range filter without bounds"));
            }
            Ok(parts.join(" AND "))
        }
        FilterItem::Exists(e) => {
            let name = aliases.name(e.field.path());
            let func = if e.exists {
                "attribute_exists"
            } else {
                "attribute_not_exists"
            };
            Ok(format!("{}({})", func, name))
        }
        FilterItem::Regex(_)
        | FilterItem::TextSearch(_)
        | FilterItem::Geo(_)
        | FilterItem::Array(_)
        | FilterItem::ElemMatch(_) => Err(DocqlError::unsupported(NAME, item.kind())),
    }
}

/// `SET #n0 = :v0, #n1 = #n1 + :v1 REMOVE #n2`
fn render_update(
    ops: &[UpdateOperation],
    aliases: &mut Aliases,
    params: &mut Params,
) -> DocqlResult<String> {
    let mut set = Vec::new();
    let mut remove = Vec::new();

    for op in ops {
        match op.operator {
            UpdateOperator::Set | UpdateOperator::Inc => {
                for (field, value) in &op.fields {
                    let Some(value) = value else {
                        return Err(DocqlError::Builder(format!(
                            "{} on '{}' requires a value",
                            op.operator,
                            field.path()
                        )));
                    };
                    let name = aliases.name(field.path());
                    let value = aliases.value(params, value);
                    if op.operator == UpdateOperator::Inc {
                        set.push(format!("{} = {} + {}", name, name, value));
                    } else {
                        set.push(format!("{} = {}", name, value));
                    }
                }
            }
            UpdateOperator::Unset => {
                for field in op.fields.keys() {
                    remove.push(aliases.name(field.path()));
                }
            }
            other => {
                return Err(DocqlError::unsupported(NAME, format!("update operator {}", other)));
            }
        }
    }

    let mut clauses = Vec::new();
    if !set.is_empty() {
        clauses.push(format!("SET {}", set.join(", ")));
    }
    if !remove.is_empty() {
        clauses.push(format!("REMOVE {}", remove.join(", ")));
    }
    Ok(clauses.join(" "))
}
