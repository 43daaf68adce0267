use super::filter::FilterItem;
use super::operators::{Operation, UpdateOperator};
use super::pipeline::PipelineStage;
use super::update::{Document, Pagination, Projection, SortClause, UpdateOperation};
use crate::ident::{Collection, Field};
use serde::Serialize;

/// The root of one database operation.
///
/// Built by [`crate::Builder`]; once `build()` succeeds the tree is treated as
/// read-only and can be rendered any number of times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAst {
    pub operation: Operation,
    pub target: Collection,
    pub filter: Option<FilterItem>,
    pub projection: Option<Projection>,
    pub sort: Vec<SortClause>,
    pub skip: Option<Pagination>,
    pub limit: Option<Pagination>,
    pub documents: Vec<Document>,
    pub update_ops: Vec<UpdateOperation>,
    pub upsert: bool,
    pub pipeline: Vec<PipelineStage>,
    pub distinct_field: Option<Field>,
}

impl DocumentAst {
    pub fn new(operation: Operation, target: Collection) -> Self {
        Self {
            operation,
            target,
            filter: None,
            projection: None,
            sort: Vec::new(),
            skip: None,
            limit: None,
            documents: Vec::new(),
            update_ops: Vec::new(),
            upsert: false,
            pipeline: Vec::new(),
            distinct_field: None,
        }
    }

    /// The update operation for `operator`, created on first use.
    pub(crate) fn update_op_mut(&mut self, operator: UpdateOperator) -> &mut UpdateOperation {
        let idx = match self.update_ops.iter().position(|op| op.operator == operator) {
            Some(idx) => idx,
            None => {
                self.update_ops.push(UpdateOperation::new(operator));
                self.update_ops.len() - 1
            }
        };
        &mut self.update_ops[idx]
    }
}
