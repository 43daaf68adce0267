//! Full-featured dialect (MongoDB query documents).

use crate::ast::*;
use crate::error::{DocqlError, DocqlResult};
use crate::ident::{IdentKind, InvalidReason, validate_identifier};
use crate::transpiler::{Params, QueryResult, Renderer, preflight, single, to_result};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

const NAME: &str = "mongo";

/// Renders every operation, operator and stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoRenderer;

impl Renderer for MongoRenderer {
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
                query.insert("filter".into(), filter_or_empty(ast, &mut params)?);
                if let Some(projection) = &ast.projection {
                    query.insert("projection".into(), render_projection(projection, &mut params)?);
                }
                if !ast.sort.is_empty() {
                    query.insert("sort".into(), render_sort(&ast.sort));
                }
                if let Some(skip) = &ast.skip {
                    query.insert("skip".into(), params.pagination(skip));
                }
                if let Some(limit) = &ast.limit {
                    query.insert("limit".into(), params.pagination(limit));
                }
            }
            Operation::Insert => {
                if let Some(doc) = ast.documents.first() {
                    query.insert("document".into(), render_document(doc, &mut params));
                }
            }
            Operation::InsertMany => {
                let docs = ast
                    .documents
                    .iter()
                    .map(|d| render_document(d, &mut params))
                    .collect();
                query.insert("documents".into(), Value::Array(docs));
            }
            Operation::Update | Operation::UpdateMany => {
                query.insert("filter".into(), filter_or_empty(ast, &mut params)?);
                query.insert("update".into(), render_update_ops(&ast.update_ops, &mut params));
                if ast.upsert {
                    query.insert("upsert".into(), Value::Bool(true));
                }
            }
            Operation::Delete | Operation::DeleteMany | Operation::Count => {
                query.insert("filter".into(), filter_or_empty(ast, &mut params)?);
            }
            Operation::Aggregate => {
                query.insert("pipeline".into(), render_pipeline(&ast.pipeline, &mut params)?);
            }
            Operation::Distinct => {
                if let Some(field) = &ast.distinct_field {
                    query.insert("field".into(), json!(field.path()));
                }
                if let Some(filter) = &ast.filter {
                    query.insert("filter".into(), render_filter(filter, &mut params)?);
                }
            }
        }

        to_result(NAME, query, params)
    }

    fn supports_operation(&self, _op: Operation) -> bool {
        true
    }

    fn supports_filter(&self, _op: FilterOperator) -> bool {
        true
    }

    /// `$not` is a field-level operator here, not a group combinator.
    fn supports_logic(&self, logic: LogicOperator) -> bool {
        !matches!(logic, LogicOperator::Not)
    }

    fn supports_update(&self, _op: UpdateOperator) -> bool {
        true
    }

    fn supports_pipeline_stage(&self, _stage: StageKind) -> bool {
        true
    }
}

fn filter_or_empty(ast: &DocumentAst, params: &mut Params) -> DocqlResult<Value> {
    match &ast.filter {
        Some(filter) => render_filter(filter, params),
        None => Ok(Value::Object(Map::new())),
    }
}

fn render_filter(item: &FilterItem, params: &mut Params) -> DocqlResult<Value> {
    match item {
        FilterItem::Condition(c) => Ok(single(
            c.field.path(),
            single(c.operator.as_str(), params.bind(&c.value)),
        )),
        FilterItem::Group(g) => {
            if !MongoRenderer.supports_logic(g.logic) {
                return Err(DocqlError::unsupported(NAME, format!("logic operator {}", g.logic)));
            }
            let children = g
                .conditions
                .iter()
                .map(|c| render_filter(c, params))
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
            let mut regex = Map::new();
            regex.insert("$regex".into(), params.bind(&r.pattern));
            if let Some(options) = &r.options {
                regex.insert("$options".into(), params.bind(options));
            }
            Ok(single(r.field.path(), Value::Object(regex)))
        }
        FilterItem::Exists(e) => Ok(single(e.field.path(), json!({ "$exists": e.exists }))),
        FilterItem::Geo(g) => {
            let lon = params.bind(&g.center.lon);
            let lat = params.bind(&g.center.lat);
            let mut geo = Map::new();
            geo.insert(
                "$geometry".into(),
                json!({ "type": "Point", "coordinates": [lon, lat] }),
            );
            let max = match (&g.radius, &g.max_distance) {
                (Some(_), Some(_)) => {
                    return Err(DocqlError::Builder(format!(
                        "geo filter on '{}' sets both radius and max_distance",
                        g.field.path()
                    )));
                }
                (Some(max), None) | (None, Some(max)) => Some(max),
                (None, None) => None,
            };
            if let Some(max) = max {
                geo.insert("$maxDistance".into(), params.bind(max));
            }
            if let Some(min) = &g.min_distance {
                geo.insert("$minDistance".into(), params.bind(min));
            }
            Ok(single(g.field.path(), single(g.operator.as_str(), Value::Object(geo))))
        }
        FilterItem::Array(a) => Ok(single(
            a.field.path(),
            single(a.operator.as_str(), params.bind(&a.value)),
        )),
        FilterItem::ElemMatch(e) => {
            let merged = merge_filters(&e.conditions, params)?;
            Ok(single(e.field.path(), single("$elemMatch", merged)))
        }
        FilterItem::TextSearch(t) => {
            let mut text = Map::new();
            text.insert("$search".into(), params.bind(&t.search));
            if let Some(language) = &t.language {
                text.insert("$language".into(), params.bind(language));
            }
            if t.case_sensitive {
                text.insert("$caseSensitive".into(), Value::Bool(true));
            }
            if t.diacritic_sensitive {
                text.insert("$diacriticSensitive".into(), Value::Bool(true));
            }
            Ok(single("$text", Value::Object(text)))
        }
    }
}

/// Render each condition into one object. Operator objects on the same field
/// merge (`{"score": {"$gte": .., "$lt": ..}}`). Any other key collision
/// renders the whole list as `{"$and": [..]}`.
fn merge_filters(conditions: &[FilterItem], params: &mut Params) -> DocqlResult<Value> {
    let rendered = conditions
        .iter()
        .map(|c| render_filter(c, params))
        .collect::<DocqlResult<Vec<_>>>()?;

    match merge_objects(&rendered) {
        Some(merged) => Ok(Value::Object(merged)),
        None => Ok(single("$and", Value::Array(rendered))),
    }
}

fn merge_objects(rendered: &[Value]) -> Option<Map<String, Value>> {
    let mut merged = Map::new();
    for value in rendered {
        let Value::Object(map) = value else {
            return None;
        };
        for (key, value) in map {
            match merged.get_mut(key) {
                Some(existing) => {
                    if !merge_operators(existing, value) {
                        return None;
                    }
                }
                None => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    Some(merged)
}

/// Fold `incoming` operators into `existing` when both are operator objects
/// with disjoint keys.
fn merge_operators(existing: &mut Value, incoming: &Value) -> bool {
    let (Value::Object(into), Value::Object(from)) = (existing, incoming) else {
        return false;
    };
    let operators_only = |m: &Map<String, Value>| m.keys().all(|k| k.starts_with('$'));
    if !operators_only(&*into) || !operators_only(from) || from.keys().any(|k| into.contains_key(k)) {
        return false;
    }
    into.extend(from.iter().map(|(k, v)| (k.clone(), v.clone())));
    true
}

fn render_sort(sort: &[SortClause]) -> Value {
    let map = sort
        .iter()
        .map(|s| (s.field.path().to_string(), json!(s.order.as_i32())))
        .collect();
    Value::Object(map)
}

fn render_projection(projection: &Projection, params: &mut Params) -> DocqlResult<Value> {
    let mut map = Map::new();
    for pf in &projection.fields {
        let value = if let Some(slice) = &pf.slice {
            let count = params.bind(&slice.count);
            match &slice.skip {
                Some(skip) => {
                    let skip = params.bind(skip);
                    json!({ "$slice": [skip, count] })
                }
                None => json!({ "$slice": count }),
            }
        } else if let Some(conditions) = &pf.elem_match {
            single("$elemMatch", merge_filters(conditions, params)?)
        } else {
            json!(if pf.include { 1 } else { 0 })
        };
        map.insert(pf.field.path().to_string(), value);
    }
    Ok(Value::Object(map))
}

fn render_document(doc: &Document, params: &mut Params) -> Value {
    let map = doc
        .fields
        .iter()
        .map(|(field, value)| (field.path().to_string(), params.bind(value)))
        .collect();
    Value::Object(map)
}

fn render_update_ops(ops: &[UpdateOperation], params: &mut Params) -> Value {
    let mut update = Map::new();
    for op in ops {
        let fields = op
            .fields
            .iter()
            .map(|(field, value)| {
                let v = match value {
                    Some(p) => params.bind(p),
                    None => json!(""),
                };
                (field.path().to_string(), v)
            })
            .collect();
        update.insert(op.operator.as_str().into(), Value::Object(fields));
    }
    Value::Object(update)
}

fn render_pipeline(stages: &[PipelineStage], params: &mut Params) -> DocqlResult<Value> {
    stages
        .iter()
        .map(|s| render_stage(s, params))
        .collect::<DocqlResult<Vec<_>>>()
        .map(Value::Array)
}

fn render_stage(stage: &PipelineStage, params: &mut Params) -> DocqlResult<Value> {
    let key = stage.kind().as_str();
    let body = match stage {
        PipelineStage::Match(m) => render_filter(&m.filter, params)?,
        PipelineStage::Project(p) => {
            let mut body = match render_projection(&p.projection, params)? {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            for (name, expr) in &p.computed {
                body.insert(name.clone(), render_expression(expr, params)?);
            }
            Value::Object(body)
        }
        PipelineStage::Group(g) => {
            let mut group = Map::new();
            let id = match &g.id {
                Some(expr) => render_expression(expr, params)?,
                None => Value::Null,
            };
            group.insert("_id".into(), id);
            for (name, acc) in &g.accumulators {
                group.insert(name.clone(), render_accumulator(acc, params)?);
            }
            Value::Object(group)
        }
        PipelineStage::Sort(s) => render_sort(&s.sorts),
        PipelineStage::Limit(l) | PipelineStage::Skip(l) => params.pagination(&l.value),
        PipelineStage::Unwind(u) => {
            let mut unwind = Map::new();
            unwind.insert("path".into(), json!(format!("${}", u.path.path())));
            if let Some(index) = &u.include_array_index {
                unwind.insert("includeArrayIndex".into(), json!(index));
            }
            if u.preserve_null_and_empty_arrays {
                unwind.insert("preserveNullAndEmptyArrays".into(), Value::Bool(true));
            }
            Value::Object(unwind)
        }
        PipelineStage::Lookup(l) => {
            let mut lookup = Map::new();
            lookup.insert("from".into(), json!(l.from.name()));
            lookup.insert("localField".into(), json!(l.local_field.path()));
            lookup.insert("foreignField".into(), json!(l.foreign_field.path()));
            if !l.let_vars.is_empty() {
                lookup.insert("let".into(), render_named_exprs(&l.let_vars, params)?);
            }
            if !l.pipeline.is_empty() {
                lookup.insert("pipeline".into(), render_pipeline(&l.pipeline, params)?);
            }
            lookup.insert("as".into(), json!(l.as_));
            Value::Object(lookup)
        }
        PipelineStage::AddFields(a) => render_named_exprs(&a.fields, params)?,
        PipelineStage::ReplaceRoot(r) => single("newRoot", render_expression(&r.new_root, params)?),
        PipelineStage::Count(c) => json!(c.field_name),
        PipelineStage::Facet(f) => {
            let mut facets = Map::new();
            for (name, stages) in &f.facets {
                facets.insert(name.clone(), render_pipeline(stages, params)?);
            }
            Value::Object(facets)
        }
        PipelineStage::Bucket(b) => {
            let mut bucket = Map::new();
            bucket.insert("groupBy".into(), render_expression(&b.group_by, params)?);
            let boundaries = b.boundaries.iter().map(|p| params.bind(p)).collect();
            bucket.insert("boundaries".into(), Value::Array(boundaries));
            if let Some(default) = &b.default {
                bucket.insert("default".into(), params.bind(default));
            }
            if !b.output.is_empty() {
                let mut output = Map::new();
                for (name, acc) in &b.output {
                    output.insert(name.clone(), render_accumulator(acc, params)?);
                }
                bucket.insert("output".into(), Value::Object(output));
            }
            Value::Object(bucket)
        }
    };
    Ok(single(key, body))
}

fn render_named_exprs(
    exprs: &BTreeMap<String, Expression>,
    params: &mut Params,
) -> DocqlResult<Value> {
    let mut map = Map::new();
    for (name, expr) in exprs {
        map.insert(name.clone(), render_expression(expr, params)?);
    }
    Ok(Value::Object(map))
}

fn render_accumulator(acc: &Accumulator, params: &mut Params) -> DocqlResult<Value> {
    let input = match &acc.expr {
        Some(expr) => render_expression(expr, params)?,
        None => Value::Object(Map::new()),
    };
    Ok(single(acc.op.as_str(), input))
}

fn render_expression(expr: &Expression, params: &mut Params) -> DocqlResult<Value> {
    match expr {
        Expression::Field { field } => Ok(json!(format!("${}", field.path()))),
        Expression::Literal { value } => Ok(params.bind(value)),
        Expression::Operator { operator, args } => {
            check_operator_name(operator)?;
            let args = args
                .iter()
                .map(|a| render_expression(a, params))
                .collect::<DocqlResult<Vec<_>>>()?;
            Ok(single(operator.as_str(), Value::Array(args)))
        }
        Expression::Conditional { if_, then, else_ } => {
            let mut cond = Map::new();
            cond.insert("if".into(), render_expression(if_, params)?);
            cond.insert("then".into(), render_expression(then, params)?);
            cond.insert("else".into(), render_expression(else_, params)?);
            Ok(single("$cond", Value::Object(cond)))
        }
    }
}

/// Expression operators become output keys, so they must look like `$name`.
fn check_operator_name(operator: &str) -> DocqlResult<()> {
    let result = match (operator.strip_prefix('$'), operator.chars().next()) {
        (Some(name), _) => validate_identifier(name),
        (None, Some(first)) => Err(InvalidReason::InvalidStart(first)),
        (None, None) => Err(InvalidReason::Empty),
    };
    result.map_err(|r| DocqlError::invalid_identifier(IdentKind::Alias, operator, r))
}
