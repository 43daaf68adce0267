//! Operation kinds and operator vocabularies.
//!
//! The wire tokens (`$eq`, `$set`, `$match`, ...) are the canonical names;
//! every enum round-trips through [`std::str::FromStr`] so capability probes
//! can be driven from plain strings.

use crate::error::DocqlError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

fn parse_token<T: Copy>(all: &[T], s: &str, token: impl Fn(&T) -> &'static str) -> Result<T, DocqlError> {
    all.iter()
        .find(|v| token(v).eq_ignore_ascii_case(s))
        .copied()
        .ok_or_else(|| DocqlError::InvalidOperator(s.to_string()))
}

/// The type of document database operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    Find,
    FindOne,
    Insert,
    InsertMany,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
    Aggregate,
    Count,
    Distinct,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::Find,
        Operation::FindOne,
        Operation::Insert,
        Operation::InsertMany,
        Operation::Update,
        Operation::UpdateMany,
        Operation::Delete,
        Operation::DeleteMany,
        Operation::Aggregate,
        Operation::Count,
        Operation::Distinct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "FIND",
            Operation::FindOne => "FIND_ONE",
            Operation::Insert => "INSERT",
            Operation::InsertMany => "INSERT_MANY",
            Operation::Update => "UPDATE",
            Operation::UpdateMany => "UPDATE_MANY",
            Operation::Delete => "DELETE",
            Operation::DeleteMany => "DELETE_MANY",
            Operation::Aggregate => "AGGREGATE",
            Operation::Count => "COUNT",
            Operation::Distinct => "DISTINCT",
        }
    }

    /// Operations that read documents and accept projection, sort and pagination.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Operation::Find
                | Operation::FindOne
                | Operation::Aggregate
                | Operation::Count
                | Operation::Distinct
        )
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Operation::Update | Operation::UpdateMany)
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert | Operation::InsertMany)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(Self::ALL, s, Self::as_str)
    }
}

/// Document filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Exists,
    Type,
    Regex,
    Text,
    Mod,
    All,
    ElemMatch,
    Size,
    GeoWithin,
    GeoIntersects,
    Near,
    NearSphere,
}

impl FilterOperator {
    pub const ALL: &'static [FilterOperator] = &[
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Exists,
        FilterOperator::Type,
        FilterOperator::Regex,
        FilterOperator::Text,
        FilterOperator::Mod,
        FilterOperator::All,
        FilterOperator::ElemMatch,
        FilterOperator::Size,
        FilterOperator::GeoWithin,
        FilterOperator::GeoIntersects,
        FilterOperator::Near,
        FilterOperator::NearSphere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "$eq",
            FilterOperator::Ne => "$ne",
            FilterOperator::Gt => "$gt",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lt => "$lt",
            FilterOperator::Lte => "$lte",
            FilterOperator::In => "$in",
            FilterOperator::NotIn => "$nin",
            FilterOperator::Exists => "$exists",
            FilterOperator::Type => "$type",
            FilterOperator::Regex => "$regex",
            FilterOperator::Text => "$text",
            FilterOperator::Mod => "$mod",
            FilterOperator::All => "$all",
            FilterOperator::ElemMatch => "$elemMatch",
            FilterOperator::Size => "$size",
            FilterOperator::GeoWithin => "$geoWithin",
            FilterOperator::GeoIntersects => "$geoIntersects",
            FilterOperator::Near => "$near",
            FilterOperator::NearSphere => "$nearSphere",
        }
    }

    /// The six scalar comparisons every dialect understands.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            FilterOperator::Eq
                | FilterOperator::Ne
                | FilterOperator::Gt
                | FilterOperator::Gte
                | FilterOperator::Lt
                | FilterOperator::Lte
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(Self::ALL, s, Self::as_str)
    }
}

/// Logical operators for combining filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LogicOperator {
    #[default]
    And,
    Or,
    Nor,
    Not,
}

impl LogicOperator {
    pub const ALL: &'static [LogicOperator] = &[
        LogicOperator::And,
        LogicOperator::Or,
        LogicOperator::Nor,
        LogicOperator::Not,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOperator::And => "$and",
            LogicOperator::Or => "$or",
            LogicOperator::Nor => "$nor",
            LogicOperator::Not => "$not",
        }
    }
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicOperator {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(Self::ALL, s, Self::as_str)
    }
}

/// Document update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpdateOperator {
    Set,
    Unset,
    SetOnInsert,
    Inc,
    Mul,
    Min,
    Max,
    Rename,
    CurrentDate,
    AddToSet,
    Pop,
    Pull,
    Push,
    PullAll,
}

impl UpdateOperator {
    pub const ALL: &'static [UpdateOperator] = &[
        UpdateOperator::Set,
        UpdateOperator::Unset,
        UpdateOperator::SetOnInsert,
        UpdateOperator::Inc,
        UpdateOperator::Mul,
        UpdateOperator::Min,
        UpdateOperator::Max,
        UpdateOperator::Rename,
        UpdateOperator::CurrentDate,
        UpdateOperator::AddToSet,
        UpdateOperator::Pop,
        UpdateOperator::Pull,
        UpdateOperator::Push,
        UpdateOperator::PullAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Set => "$set",
            UpdateOperator::Unset => "$unset",
            UpdateOperator::SetOnInsert => "$setOnInsert",
            UpdateOperator::Inc => "$inc",
            UpdateOperator::Mul => "$mul",
            UpdateOperator::Min => "$min",
            UpdateOperator::Max => "$max",
            UpdateOperator::Rename => "$rename",
            UpdateOperator::CurrentDate => "$currentDate",
            UpdateOperator::AddToSet => "$addToSet",
            UpdateOperator::Pop => "$pop",
            UpdateOperator::Pull => "$pull",
            UpdateOperator::Push => "$push",
            UpdateOperator::PullAll => "$pullAll",
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateOperator {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(Self::ALL, s, Self::as_str)
    }
}

/// Sort direction. Renders as `1` / `-1` in dialects that use numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_i32(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    pub fn as_direction(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Group accumulator operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccumulatorOp {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
    Count,
}

impl AccumulatorOp {
    pub const ALL: &'static [AccumulatorOp] = &[
        AccumulatorOp::Sum,
        AccumulatorOp::Avg,
        AccumulatorOp::Min,
        AccumulatorOp::Max,
        AccumulatorOp::First,
        AccumulatorOp::Last,
        AccumulatorOp::Push,
        AccumulatorOp::AddToSet,
        AccumulatorOp::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccumulatorOp::Sum => "$sum",
            AccumulatorOp::Avg => "$avg",
            AccumulatorOp::Min => "$min",
            AccumulatorOp::Max => "$max",
            AccumulatorOp::First => "$first",
            AccumulatorOp::Last => "$last",
            AccumulatorOp::Push => "$push",
            AccumulatorOp::AddToSet => "$addToSet",
            AccumulatorOp::Count => "$count",
        }
    }
}

impl fmt::Display for AccumulatorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccumulatorOp {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(Self::ALL, s, Self::as_str)
    }
}

/// Aggregation pipeline stage kinds, used by capability probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageKind {
    Match,
    Project,
    Group,
    Sort,
    Limit,
    Skip,
    Unwind,
    Lookup,
    AddFields,
    ReplaceRoot,
    Count,
    Facet,
    Bucket,
}

impl StageKind {
    pub const ALL: &'static [StageKind] = &[
        StageKind::Match,
        StageKind::Project,
        StageKind::Group,
        StageKind::Sort,
        StageKind::Limit,
        StageKind::Skip,
        StageKind::Unwind,
        StageKind::Lookup,
        StageKind::AddFields,
        StageKind::ReplaceRoot,
        StageKind::Count,
        StageKind::Facet,
        StageKind::Bucket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Match => "$match",
            StageKind::Project => "$project",
            StageKind::Group => "$group",
            StageKind::Sort => "$sort",
            StageKind::Limit => "$limit",
            StageKind::Skip => "$skip",
            StageKind::Unwind => "$unwind",
            StageKind::Lookup => "$lookup",
            StageKind::AddFields => "$addFields",
            StageKind::ReplaceRoot => "$replaceRoot",
            StageKind::Count => "$count",
            StageKind::Facet => "$facet",
            StageKind::Bucket => "$bucket",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(Self::ALL, s, Self::as_str)
    }
}
