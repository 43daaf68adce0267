//! Expression, accumulator and document builders.

use crate::ast::operators::AccumulatorOp;
use crate::ast::pipeline::{Accumulator, Expression};
use crate::ast::update::Document;
use crate::ident::{Field, Param};

pub fn field_expr(field: Field) -> Expression {
    Expression::Field { field }
}

pub fn literal_expr(value: Param) -> Expression {
    Expression::Literal { value }
}

/// Operator expression, e.g. `op_expr("$add", [field_expr(a), field_expr(b)])`.
pub fn op_expr(operator: &str, args: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::Operator {
        operator: operator.to_string(),
        args: args.into_iter().collect(),
    }
}

pub fn cond_expr(if_: Expression, then: Expression, else_: Expression) -> Expression {
    Expression::Conditional {
        if_: Box::new(if_),
        then: Box::new(then),
        else_: Box::new(else_),
    }
}

fn acc(op: AccumulatorOp, expr: Expression) -> Accumulator {
    Accumulator {
        op,
        expr: Some(expr),
    }
}

pub fn sum(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::Sum, expr)
}

pub fn avg(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::Avg, expr)
}

pub fn min(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::Min, expr)
}

pub fn max(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::Max, expr)
}

pub fn first(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::First, expr)
}

pub fn last(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::Last, expr)
}

pub fn push(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::Push, expr)
}

pub fn add_to_set(expr: Expression) -> Accumulator {
    acc(AccumulatorOp::AddToSet, expr)
}

/// `$count` takes no input expression.
pub fn count_acc() -> Accumulator {
    Accumulator {
        op: AccumulatorOp::Count,
        expr: None,
    }
}

/// Start an insert document: `doc().set(name, p_name).build()`.
pub fn doc() -> DocumentBuilder {
    DocumentBuilder::default()
}

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    pub fn set(mut self, field: Field, value: Param) -> Self {
        self.doc.insert(field, value);
        self
    }

    pub fn build(self) -> Document {
        self.doc
    }
}
