//! Structural validation of a finished AST.
//!
//! These checks depend only on the shape of the tree, never on a target
//! dialect. Every renderer re-runs them before dispatching.

use super::document::DocumentAst;
use super::operators::{LogicOperator, Operation};
use super::pipeline::PipelineStage;
use super::update::Pagination;
use thiserror::Error;

pub const MAX_FILTER_DEPTH: usize = 10;
pub const MAX_BATCH_SIZE: usize = 1000;
pub const MAX_LIMIT: usize = 10000;
pub const MAX_PROJECTION_FIELDS: usize = 100;
pub const MAX_SORT_FIELDS: usize = 10;
pub const MAX_PIPELINE_STAGES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target collection is required")]
    MissingTarget,

    #[error("limit exceeds maximum: {0} > {MAX_LIMIT}")]
    LimitTooLarge(usize),

    #[error("projection fields exceed maximum: {0} > {MAX_PROJECTION_FIELDS}")]
    TooManyProjectionFields(usize),

    #[error("sort fields exceed maximum: {0} > {MAX_SORT_FIELDS}")]
    TooManySortFields(usize),

    #[error("filter nesting exceeds maximum depth: {0} > {MAX_FILTER_DEPTH}")]
    FilterTooDeep(usize),

    #[error("INSERT requires exactly one document (got {0})")]
    InsertDocumentCount(usize),

    #[error("{0} requires at least one document")]
    NoDocuments(Operation),

    #[error("batch size exceeds maximum: {0} > {MAX_BATCH_SIZE}")]
    BatchTooLarge(usize),

    #[error("{0} requires at least one update operation")]
    NoUpdateOperations(Operation),

    #[error("{0} requires a filter for safety")]
    MissingFilter(Operation),

    #[error("AGGREGATE requires at least one pipeline stage")]
    EmptyPipeline,

    #[error("pipeline stages exceed maximum: {0} > {MAX_PIPELINE_STAGES}")]
    TooManyStages(usize),

    #[error("DISTINCT requires a field")]
    MissingDistinctField,

    #[error("{0} group requires at least one condition")]
    EmptyGroup(LogicOperator),
}

impl DocumentAst {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target.name().is_empty() {
            return Err(ValidationError::MissingTarget);
        }
        if let Some(logic) = self.filter.as_ref().and_then(|f| f.empty_group()) {
            return Err(ValidationError::EmptyGroup(logic));
        }
        if let Some(logic) = stages_empty_group(&self.pipeline) {
            return Err(ValidationError::EmptyGroup(logic));
        }

        match self.operation {
            Operation::Find | Operation::FindOne => self.validate_find(),
            Operation::Insert => match self.documents.len() {
                1 => Ok(()),
                n => Err(ValidationError::InsertDocumentCount(n)),
            },
            Operation::InsertMany => match self.documents.len() {
                0 => Err(ValidationError::NoDocuments(self.operation)),
                n if n > MAX_BATCH_SIZE => Err(ValidationError::BatchTooLarge(n)),
                _ => Ok(()),
            },
            Operation::Update => self.require_update_ops(),
            Operation::UpdateMany => {
                self.require_update_ops()?;
                self.require_filter()
            }
            Operation::Delete | Operation::Count => Ok(()),
            Operation::DeleteMany => self.require_filter(),
            Operation::Aggregate => match self.pipeline.len() {
                0 => Err(ValidationError::EmptyPipeline),
                n if n > MAX_PIPELINE_STAGES => Err(ValidationError::TooManyStages(n)),
                _ => Ok(()),
            },
            Operation::Distinct => match self.distinct_field {
                Some(_) => Ok(()),
                None => Err(ValidationError::MissingDistinctField),
            },
        }
    }

    fn validate_find(&self) -> Result<(), ValidationError> {
        if let Some(Pagination::Static(n)) = self.limit
            && n > MAX_LIMIT
        {
            return Err(ValidationError::LimitTooLarge(n));
        }
        if let Some(projection) = &self.projection
            && projection.fields.len() > MAX_PROJECTION_FIELDS
        {
            return Err(ValidationError::TooManyProjectionFields(projection.fields.len()));
        }
        if self.sort.len() > MAX_SORT_FIELDS {
            return Err(ValidationError::TooManySortFields(self.sort.len()));
        }
        if let Some(filter) = &self.filter {
            let depth = filter.nesting();
            if depth > MAX_FILTER_DEPTH {
                return Err(ValidationError::FilterTooDeep(depth));
            }
        }
        Ok(())
    }

    fn require_update_ops(&self) -> Result<(), ValidationError> {
        if self.update_ops.is_empty() {
            return Err(ValidationError::NoUpdateOperations(self.operation));
        }
        Ok(())
    }

    fn require_filter(&self) -> Result<(), ValidationError> {
        if self.filter.is_none() {
            return Err(ValidationError::MissingFilter(self.operation));
        }
        Ok(())
    }
}

fn stages_empty_group(stages: &[PipelineStage]) -> Option<LogicOperator> {
    stages.iter().find_map(|stage| match stage {
        PipelineStage::Match(m) => m.filter.empty_group(),
        PipelineStage::Lookup(l) => stages_empty_group(&l.pipeline),
        PipelineStage::Facet(f) => f.facets.values().find_map(|s| stages_empty_group(s)),
        _ => None,
    })
}
