//! Aggregation pipeline stages and expressions.

use super::filter::FilterItem;
use super::operators::{AccumulatorOp, StageKind};
use super::update::{Pagination, Projection, SortClause};
use crate::ident::{Collection, Field, Param};
use serde::Serialize;
use std::collections::BTreeMap;

/// An aggregation expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Reference to a document field, rendered as `"$path"`.
    Field { field: Field },
    /// A bound value.
    Literal { value: Param },
    /// `{operator: [args...]}`, e.g. `$add`, `$concat`.
    Operator { operator: String, args: Vec<Expression> },
    Conditional {
        #[serde(rename = "if")]
        if_: Box<Expression>,
        then: Box<Expression>,
        #[serde(rename = "else")]
        else_: Box<Expression>,
    },
}

/// A group output: accumulator operator plus its input expression.
/// `expr` is `None` only for [`AccumulatorOp::Count`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accumulator {
    pub op: AccumulatorOp,
    pub expr: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    Match(MatchStage),
    Project(ProjectStage),
    Group(GroupStage),
    Sort(SortStage),
    Limit(PaginationStage),
    Skip(PaginationStage),
    Unwind(UnwindStage),
    Lookup(LookupStage),
    AddFields(AddFieldsStage),
    ReplaceRoot(ReplaceRootStage),
    Count(CountStage),
    Facet(FacetStage),
    Bucket(BucketStage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStage {
    pub filter: FilterItem,
}

/// Field inclusion/exclusion plus computed fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProjectStage {
    pub projection: Projection,
    pub computed: BTreeMap<String, Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStage {
    pub id: Option<Expression>,
    pub accumulators: BTreeMap<String, Accumulator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortStage {
    pub sorts: Vec<SortClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationStage {
    pub value: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnwindStage {
    pub path: Field,
    pub include_array_index: Option<String>,
    pub preserve_null_and_empty_arrays: bool,
}

/// Join against another collection, either by local/foreign field equality
/// or through a sub-pipeline with `let` variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupStage {
    pub from: Collection,
    pub local_field: Field,
    pub foreign_field: Field,
    pub as_: String,
    pub pipeline: Vec<PipelineStage>,
    pub let_vars: BTreeMap<String, Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddFieldsStage {
    pub fields: BTreeMap<String, Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaceRootStage {
    pub new_root: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountStage {
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetStage {
    pub facets: BTreeMap<String, Vec<PipelineStage>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStage {
    pub group_by: Expression,
    pub boundaries: Vec<Param>,
    pub default: Option<Param>,
    pub output: BTreeMap<String, Accumulator>,
}

impl PipelineStage {
    pub fn kind(&self) -> StageKind {
        match self {
            PipelineStage::Match(_) => StageKind::Match,
            PipelineStage::Project(_) => StageKind::Project,
            PipelineStage::Group(_) => StageKind::Group,
            PipelineStage::Sort(_) => StageKind::Sort,
            PipelineStage::Limit(_) => StageKind::Limit,
            PipelineStage::Skip(_) => StageKind::Skip,
            PipelineStage::Unwind(_) => StageKind::Unwind,
            PipelineStage::Lookup(_) => StageKind::Lookup,
            PipelineStage::AddFields(_) => StageKind::AddFields,
            PipelineStage::ReplaceRoot(_) => StageKind::ReplaceRoot,
            PipelineStage::Count(_) => StageKind::Count,
            PipelineStage::Facet(_) => StageKind::Facet,
            PipelineStage::Bucket(_) => StageKind::Bucket,
        }
    }

    /// Names this stage introduces as output keys.
    pub(crate) fn output_names(&self) -> Vec<&str> {
        match self {
            PipelineStage::Group(g) => g.accumulators.keys().map(String::as_str).collect(),
            PipelineStage::Project(p) => p.computed.keys().map(String::as_str).collect(),
            PipelineStage::Lookup(l) => {
                let mut names = vec![l.as_.as_str()];
                names.extend(l.let_vars.keys().map(String::as_str));
                names
            }
            PipelineStage::AddFields(a) => a.fields.keys().map(String::as_str).collect(),
            PipelineStage::Count(c) => vec![c.field_name.as_str()],
            PipelineStage::Facet(f) => f.facets.keys().map(String::as_str).collect(),
            PipelineStage::Bucket(b) => b.output.keys().map(String::as_str).collect(),
            PipelineStage::Unwind(u) => u.include_array_index.as_deref().into_iter().collect(),
            PipelineStage::Match(_)
            | PipelineStage::Sort(_)
            | PipelineStage::Limit(_)
            | PipelineStage::Skip(_)
            | PipelineStage::ReplaceRoot(_) => Vec::new(),
        }
    }
}
