//! Write payloads, projection and ordering.

use super::filter::FilterItem;
use super::operators::{SortOrder, UpdateOperator};
use crate::ident::{Field, Param};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Serialize a field-keyed map with the field paths as keys.
fn by_path<S: Serializer, V: Serialize>(map: &BTreeMap<Field, V>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_map(map.iter().map(|(k, v)| (k.path(), v)))
}

/// An insert payload. Every value is a parameter; re-setting a field
/// replaces its parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    #[serde(serialize_with = "by_path")]
    pub fields: BTreeMap<Field, Param>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, value: Param) {
        self.fields.insert(field, value);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One update operator applied to a set of fields. Value-less operators
/// such as `$unset` store `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOperation {
    pub operator: UpdateOperator,
    #[serde(serialize_with = "by_path")]
    pub fields: BTreeMap<Field, Option<Param>>,
}

impl UpdateOperation {
    pub fn new(operator: UpdateOperator) -> Self {
        Self {
            operator,
            fields: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortClause {
    pub field: Field,
    pub order: SortOrder,
}

/// Skip/limit value: either inline or bound at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    Static(usize),
    Param(Param),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Projection {
    pub fields: Vec<ProjectionField>,
    /// Set when built through `exclude`.
    pub exclude: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionField {
    pub field: Field,
    pub include: bool,
    pub slice: Option<SliceOp>,
    pub elem_match: Option<Vec<FilterItem>>,
}

impl ProjectionField {
    pub fn include(field: Field) -> Self {
        Self {
            field,
            include: true,
            slice: None,
            elem_match: None,
        }
    }

    pub fn exclude(field: Field) -> Self {
        Self {
            include: false,
            ..Self::include(field)
        }
    }

    /// `{path: {"$slice": count}}` or `{path: {"$slice": [skip, count]}}`.
    pub fn slice(field: Field, count: Param, skip: Option<Param>) -> Self {
        Self {
            slice: Some(SliceOp { count, skip }),
            ..Self::include(field)
        }
    }

    pub fn elem_match(field: Field, conditions: Vec<FilterItem>) -> Self {
        Self {
            elem_match: Some(conditions),
            ..Self::include(field)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceOp {
    pub count: Param,
    pub skip: Option<Param>,
}
