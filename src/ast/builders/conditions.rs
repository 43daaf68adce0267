//! Filter builders.

use crate::ast::filter::*;
use crate::ast::operators::{FilterOperator, LogicOperator};
use crate::error::{DocqlError, DocqlResult};
use crate::ident::{Field, Param};

fn make_condition(field: Field, operator: FilterOperator, value: Param) -> FilterItem {
    FilterItem::Condition(Condition {
        field,
        operator,
        value,
    })
}

fn make_group(logic: LogicOperator, conditions: impl IntoIterator<Item = FilterItem>) -> FilterItem {
    FilterItem::Group(FilterGroup {
        logic,
        conditions: conditions.into_iter().collect(),
    })
}

fn try_group(
    logic: LogicOperator,
    conditions: impl IntoIterator<Item = FilterItem>,
) -> DocqlResult<FilterItem> {
    let conditions: Vec<FilterItem> = conditions.into_iter().collect();
    if conditions.is_empty() {
        return Err(DocqlError::Builder(format!(
            "{logic} requires at least one condition"
        )));
    }
    Ok(make_group(logic, conditions))
}

/// Create an equality condition (field == :value)
pub fn eq(field: Field, value: Param) -> FilterItem {
    make_condition(field, FilterOperator::Eq, value)
}

pub fn ne(field: Field, value: Param) -> FilterItem {
    make_condition(field, FilterOperator::Ne, value)
}

pub fn gt(field: Field, value: Param) -> FilterItem {
    make_condition(field, FilterOperator::Gt, value)
}

pub fn gte(field: Field, value: Param) -> FilterItem {
    make_condition(field, FilterOperator::Gte, value)
}

pub fn lt(field: Field, value: Param) -> FilterItem {
    make_condition(field, FilterOperator::Lt, value)
}

pub fn lte(field: Field, value: Param) -> FilterItem {
    make_condition(field, FilterOperator::Lte, value)
}

/// Membership test. The parameter is bound to a list at execution time.
pub fn is_in(field: Field, values: Param) -> FilterItem {
    make_condition(field, FilterOperator::In, values)
}

pub fn not_in(field: Field, values: Param) -> FilterItem {
    make_condition(field, FilterOperator::NotIn, values)
}

pub fn exists(field: Field) -> FilterItem {
    FilterItem::Exists(ExistsFilter {
        field,
        exists: true,
    })
}

pub fn not_exists(field: Field) -> FilterItem {
    FilterItem::Exists(ExistsFilter {
        field,
        exists: false,
    })
}

pub fn regex(field: Field, pattern: Param) -> FilterItem {
    FilterItem::Regex(RegexFilter {
        field,
        pattern,
        options: None,
    })
}

pub fn regex_with_options(field: Field, pattern: Param, options: Param) -> FilterItem {
    FilterItem::Regex(RegexFilter {
        field,
        pattern,
        options: Some(options),
    })
}

pub fn and(conditions: impl IntoIterator<Item = FilterItem>) -> FilterItem {
    make_group(LogicOperator::And, conditions)
}

pub fn or(conditions: impl IntoIterator<Item = FilterItem>) -> FilterItem {
    make_group(LogicOperator::Or, conditions)
}

pub fn nor(conditions: impl IntoIterator<Item = FilterItem>) -> FilterItem {
    make_group(LogicOperator::Nor, conditions)
}

/// Like [`and`], but rejects an empty condition list.
pub fn try_and(conditions: impl IntoIterator<Item = FilterItem>) -> DocqlResult<FilterItem> {
    try_group(LogicOperator::And, conditions)
}

pub fn try_or(conditions: impl IntoIterator<Item = FilterItem>) -> DocqlResult<FilterItem> {
    try_group(LogicOperator::Or, conditions)
}

pub fn try_nor(conditions: impl IntoIterator<Item = FilterItem>) -> DocqlResult<FilterItem> {
    try_group(LogicOperator::Nor, conditions)
}

/// Inclusive range (`min <= field <= max`). Either bound may be omitted.
pub fn range(field: Field, min: Option<Param>, max: Option<Param>) -> FilterItem {
    FilterItem::Range(RangeFilter {
        field,
        min,
        max,
        min_exclusive: false,
        max_exclusive: false,
    })
}

pub fn range_exclusive(field: Field, min: Option<Param>, max: Option<Param>) -> FilterItem {
    FilterItem::Range(RangeFilter {
        field,
        min,
        max,
        min_exclusive: true,
        max_exclusive: true,
    })
}

/// Like [`range`], but requires at least one bound.
pub fn try_range(field: Field, min: Option<Param>, max: Option<Param>) -> DocqlResult<FilterItem> {
    if min.is_none() && max.is_none() {
        return Err(DocqlError::Builder(format!(
            "range on '{}' requires a min or max bound",
            field.path()
        )));
    }
    Ok(range(field, min, max))
}

/// `$near` around a point, limited to `radius`.
pub fn geo(field: Field, lon: Param, lat: Param, radius: Param) -> FilterItem {
    FilterItem::Geo(GeoFilter {
        field,
        operator: FilterOperator::Near,
        center: GeoPoint { lon, lat },
        radius: Some(radius),
        max_distance: None,
        min_distance: None,
    })
}

pub fn all(field: Field, values: Param) -> FilterItem {
    FilterItem::Array(ArrayFilter {
        field,
        operator: FilterOperator::All,
        value: values,
    })
}

pub fn size(field: Field, len: Param) -> FilterItem {
    FilterItem::Array(ArrayFilter {
        field,
        operator: FilterOperator::Size,
        value: len,
    })
}

pub fn elem_match(field: Field, conditions: impl IntoIterator<Item = FilterItem>) -> FilterItem {
    FilterItem::ElemMatch(ElemMatch {
        field,
        conditions: conditions.into_iter().collect(),
    })
}

pub fn text_search(search: Param) -> FilterItem {
    FilterItem::TextSearch(TextSearch {
        search,
        language: None,
        case_sensitive: false,
        diacritic_sensitive: false,
    })
}
