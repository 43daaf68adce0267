//! Fluent construction of a [`DocumentAst`].
//!
//! Each chained call checks that it applies to the operation being built.
//! The first failure is recorded and every later call is a no-op, so a chain
//! always runs through to [`Builder::build`] and reports exactly one error.
//!
//! ```
//! use docql::prelude::*;
//!
//! let users = Collection::new("users");
//! let result = find(users)
//!     .filter(eq(Field::new("users", "status"), Param::new("status")))
//!     .sort_desc(Field::new("users", "createdAt"))
//!     .limit(10)
//!     .render(&MongoRenderer)
//!     .unwrap();
//! assert_eq!(result.required_params, vec!["status"]);
//! ```

use crate::ast::*;
use crate::error::{DocqlError, DocqlResult};
use crate::ident::{Collection, Field, Param, check_alias};
use crate::transpiler::{QueryResult, Renderer};
use std::collections::BTreeMap;

/// Which family of operations a chained method applies to.
#[derive(Clone, Copy)]
enum Requires {
    Read,
    Update,
    Insert,
    InsertMany,
    Aggregate,
}

impl Requires {
    fn allows(self, op: Operation) -> bool {
        match self {
            Requires::Read => op.is_read(),
            Requires::Update => op.is_update(),
            Requires::Insert => op.is_insert(),
            Requires::InsertMany => op == Operation::InsertMany,
            Requires::Aggregate => op == Operation::Aggregate,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Requires::Read => "read",
            Requires::Update => "UPDATE",
            Requires::Insert => "INSERT",
            Requires::InsertMany => "INSERT_MANY",
            Requires::Aggregate => "AGGREGATE",
        }
    }
}

#[derive(Debug)]
pub struct Builder {
    ast: DocumentAst,
    err: Option<DocqlError>,
}

impl Builder {
    fn start(operation: Operation, target: Collection) -> Self {
        Self {
            ast: DocumentAst::new(operation, target),
            err: None,
        }
    }

    pub fn find(target: Collection) -> Self {
        Self::start(Operation::Find, target)
    }

    pub fn find_one(target: Collection) -> Self {
        Self::start(Operation::FindOne, target)
    }

    pub fn insert(target: Collection) -> Self {
        Self::start(Operation::Insert, target)
    }

    pub fn insert_many(target: Collection) -> Self {
        Self::start(Operation::InsertMany, target)
    }

    pub fn update(target: Collection) -> Self {
        Self::start(Operation::Update, target)
    }

    pub fn update_many(target: Collection) -> Self {
        Self::start(Operation::UpdateMany, target)
    }

    pub fn delete(target: Collection) -> Self {
        Self::start(Operation::Delete, target)
    }

    pub fn delete_many(target: Collection) -> Self {
        Self::start(Operation::DeleteMany, target)
    }

    pub fn aggregate(target: Collection) -> Self {
        Self::start(Operation::Aggregate, target)
    }

    pub fn count(target: Collection) -> Self {
        Self::start(Operation::Count, target)
    }

    /// Distinct values of `field`.
    pub fn distinct(target: Collection, field: Field) -> Self {
        let mut b = Self::start(Operation::Distinct, target);
        b.ast.distinct_field = Some(field);
        b
    }

    /// The first recorded error, if any.
    pub fn error(&self) -> Option<&DocqlError> {
        self.err.as_ref()
    }

    fn fail(&mut self, err: DocqlError) {
        tracing::debug!(
            operation = %self.ast.operation,
            collection = %self.ast.target,
            error = %err,
            "builder recorded error"
        );
        self.err = Some(err);
    }

    /// Run `f` on the AST if no error is recorded and `method` applies to the
    /// current operation.
    fn apply(
        mut self,
        method: &'static str,
        requires: Requires,
        f: impl FnOnce(&mut DocumentAst) -> DocqlResult<()>,
    ) -> Self {
        if self.err.is_some() {
            return self;
        }
        if !requires.allows(self.ast.operation) {
            let err = DocqlError::Incompatible {
                method,
                operation: self.ast.operation,
                requires: requires.label(),
            };
            self.fail(err);
            return self;
        }
        if let Err(err) = f(&mut self.ast) {
            self.fail(err);
        }
        self
    }

    // ==================== Filter ====================

    /// Add a filter. Repeated calls combine into `AND(existing, new)`.
    pub fn filter(mut self, item: FilterItem) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.ast.filter = Some(match self.ast.filter.take() {
            None => item,
            Some(existing) => FilterItem::Group(FilterGroup {
                logic: LogicOperator::And,
                conditions: vec![existing, item],
            }),
        });
        self
    }

    /// Alias for [`Builder::filter`].
    pub fn where_(self, item: FilterItem) -> Self {
        self.filter(item)
    }

    // ==================== Read ====================

    pub fn select(self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.apply("select", Requires::Read, |ast| {
            ast.projection = Some(Projection {
                fields: fields.into_iter().map(ProjectionField::include).collect(),
                exclude: false,
            });
            Ok(())
        })
    }

    pub fn exclude(self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.apply("exclude", Requires::Read, |ast| {
            ast.projection = Some(Projection {
                fields: fields.into_iter().map(ProjectionField::exclude).collect(),
                exclude: true,
            });
            Ok(())
        })
    }

    /// Replace the projection with a detailed one (slices, elemMatch).
    pub fn projection(self, projection: Projection) -> Self {
        self.apply("projection", Requires::Read, |ast| {
            ast.projection = Some(projection);
            Ok(())
        })
    }

    pub fn sort(self, field: Field, order: SortOrder) -> Self {
        self.apply("sort", Requires::Read, |ast| {
            ast.sort.push(SortClause { field, order });
            Ok(())
        })
    }

    pub fn sort_asc(self, field: Field) -> Self {
        self.sort(field, SortOrder::Ascending)
    }

    pub fn sort_desc(self, field: Field) -> Self {
        self.sort(field, SortOrder::Descending)
    }

    pub fn skip(self, n: usize) -> Self {
        self.apply("skip", Requires::Read, |ast| {
            ast.skip = Some(Pagination::Static(n));
            Ok(())
        })
    }

    pub fn skip_param(self, param: Param) -> Self {
        self.apply("skip_param", Requires::Read, |ast| {
            ast.skip = Some(Pagination::Param(param));
            Ok(())
        })
    }

    /// Static limit. Values above [`MAX_LIMIT`] are rejected immediately.
    pub fn limit(self, n: usize) -> Self {
        self.apply("limit", Requires::Read, |ast| {
            if n > MAX_LIMIT {
                return Err(ValidationError::LimitTooLarge(n).into());
            }
            ast.limit = Some(Pagination::Static(n));
            Ok(())
        })
    }

    pub fn limit_param(self, param: Param) -> Self {
        self.apply("limit_param", Requires::Read, |ast| {
            ast.limit = Some(Pagination::Param(param));
            Ok(())
        })
    }

    // ==================== Insert ====================

    pub fn document(self, doc: Document) -> Self {
        self.apply("document", Requires::Insert, |ast| {
            ast.documents.push(doc);
            Ok(())
        })
    }

    pub fn documents(self, docs: impl IntoIterator<Item = Document>) -> Self {
        self.apply("documents", Requires::InsertMany, |ast| {
            ast.documents.extend(docs);
            Ok(())
        })
    }

    // ==================== Update ====================

    fn update_op(
        self,
        method: &'static str,
        operator: UpdateOperator,
        field: Field,
        value: Option<Param>,
    ) -> Self {
        self.apply(method, Requires::Update, |ast| {
            ast.update_op_mut(operator).fields.insert(field, value);
            Ok(())
        })
    }

    pub fn set(self, field: Field, value: Param) -> Self {
        self.update_op("set", UpdateOperator::Set, field, Some(value))
    }

    /// Remove fields. Unset entries carry no parameter.
    pub fn unset(self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.apply("unset", Requires::Update, |ast| {
            let op = ast.update_op_mut(UpdateOperator::Unset);
            for field in fields {
                op.fields.insert(field, None);
            }
            Ok(())
        })
    }

    pub fn inc(self, field: Field, value: Param) -> Self {
        self.update_op("inc", UpdateOperator::Inc, field, Some(value))
    }

    pub fn mul(self, field: Field, value: Param) -> Self {
        self.update_op("mul", UpdateOperator::Mul, field, Some(value))
    }

    pub fn push(self, field: Field, value: Param) -> Self {
        self.update_op("push", UpdateOperator::Push, field, Some(value))
    }

    pub fn pull(self, field: Field, value: Param) -> Self {
        self.update_op("pull", UpdateOperator::Pull, field, Some(value))
    }

    pub fn add_to_set(self, field: Field, value: Param) -> Self {
        self.update_op("add_to_set", UpdateOperator::AddToSet, field, Some(value))
    }

    pub fn upsert(self) -> Self {
        self.apply("upsert", Requires::Update, |ast| {
            ast.upsert = true;
            Ok(())
        })
    }

    // ==================== Pipeline ====================

    /// Append any stage. Output-key names introduced by the stage must be
    /// valid identifiers.
    pub fn stage(self, stage: PipelineStage) -> Self {
        self.apply("stage", Requires::Aggregate, |ast| push_stage(ast, stage))
    }

    pub fn match_(self, filter: FilterItem) -> Self {
        self.apply("match_", Requires::Aggregate, |ast| {
            push_stage(ast, PipelineStage::Match(MatchStage { filter }))
        })
    }

    pub fn project(self, projection: Projection) -> Self {
        self.apply("project", Requires::Aggregate, |ast| {
            push_stage(
                ast,
                PipelineStage::Project(ProjectStage {
                    projection,
                    computed: BTreeMap::new(),
                }),
            )
        })
    }

    /// `$group` by `id` (`None` groups the whole input) with named accumulators.
    pub fn group<'a>(
        self,
        id: Option<Expression>,
        accumulators: impl IntoIterator<Item = (&'a str, Accumulator)>,
    ) -> Self {
        self.apply("group", Requires::Aggregate, |ast| {
            let accumulators = accumulators
                .into_iter()
                .map(|(name, acc)| (name.to_string(), acc))
                .collect();
            push_stage(ast, PipelineStage::Group(GroupStage { id, accumulators }))
        })
    }

    pub fn lookup(self, from: Collection, local_field: Field, foreign_field: Field, as_: &str) -> Self {
        self.apply("lookup", Requires::Aggregate, |ast| {
            push_stage(
                ast,
                PipelineStage::Lookup(LookupStage {
                    from,
                    local_field,
                    foreign_field,
                    as_: as_.to_string(),
                    pipeline: Vec::new(),
                    let_vars: BTreeMap::new(),
                }),
            )
        })
    }

    pub fn unwind(self, path: Field) -> Self {
        self.apply("unwind", Requires::Aggregate, |ast| {
            push_stage(
                ast,
                PipelineStage::Unwind(UnwindStage {
                    path,
                    include_array_index: None,
                    preserve_null_and_empty_arrays: false,
                }),
            )
        })
    }

    // ==================== Terminators ====================

    /// Return the AST, or the first recorded error, or a validation error.
    pub fn build(self) -> DocqlResult<DocumentAst> {
        if let Some(err) = self.err {
            return Err(err);
        }
        self.ast.validate()?;
        Ok(self.ast)
    }

    /// Panics on any error.
    pub fn must_build(self) -> DocumentAst {
        self.build().unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn render(self, renderer: &dyn Renderer) -> DocqlResult<QueryResult> {
        let ast = self.build()?;
        renderer.render(&ast)
    }

    /// Panics on any error.
    pub fn must_render(self, renderer: &dyn Renderer) -> QueryResult {
        self.render(renderer).unwrap_or_else(|e| panic!("{e}"))
    }
}

fn push_stage(ast: &mut DocumentAst, stage: PipelineStage) -> DocqlResult<()> {
    check_stage_names(&stage)?;
    ast.pipeline.push(stage);
    Ok(())
}

/// Validate output-key names, including those of nested sub-pipelines.
fn check_stage_names(stage: &PipelineStage) -> DocqlResult<()> {
    for name in stage.output_names() {
        check_alias(name)?;
    }
    match stage {
        PipelineStage::Lookup(l) => l.pipeline.iter().try_for_each(check_stage_names),
        PipelineStage::Facet(f) => f.facets.values().flatten().try_for_each(check_stage_names),
        _ => Ok(()),
    }
}
