//! Filter predicates.

use super::operators::{FilterOperator, LogicOperator};
use crate::ident::{Field, Param};
use serde::Serialize;

/// A predicate over documents. `Group` and `ElemMatch` nest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterItem {
    Condition(Condition),
    Group(FilterGroup),
    Range(RangeFilter),
    Regex(RegexFilter),
    TextSearch(TextSearch),
    Geo(GeoFilter),
    Array(ArrayFilter),
    ElemMatch(ElemMatch),
    Exists(ExistsFilter),
}

/// `field <op> :param`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub field: Field,
    pub operator: FilterOperator,
    pub value: Param,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterGroup {
    pub logic: LogicOperator,
    pub conditions: Vec<FilterItem>,
}

/// Bounded comparison. At least one bound is expected but not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeFilter {
    pub field: Field,
    pub min: Option<Param>,
    pub max: Option<Param>,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegexFilter {
    pub field: Field,
    pub pattern: Param,
    pub options: Option<Param>,
}

/// Full-text search over the collection's text index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSearch {
    pub search: Param,
    pub language: Option<Param>,
    pub case_sensitive: bool,
    pub diacritic_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lon: Param,
    pub lat: Param,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFilter {
    pub field: Field,
    pub operator: FilterOperator,
    pub center: GeoPoint,
    pub radius: Option<Param>,
    pub max_distance: Option<Param>,
    pub min_distance: Option<Param>,
}

/// `$all` / `$size` on an array field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayFilter {
    pub field: Field,
    pub operator: FilterOperator,
    pub value: Param,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElemMatch {
    pub field: Field,
    pub conditions: Vec<FilterItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistsFilter {
    pub field: Field,
    pub exists: bool,
}

impl FilterItem {
    /// Short variant name, used in capability errors.
    pub fn kind(&self) -> &'static str {
        match self {
            FilterItem::Condition(_) => "condition",
            FilterItem::Group(_) => "group",
            FilterItem::Range(_) => "range filter",
            FilterItem::Regex(_) => "regex filter",
            FilterItem::TextSearch(_) => "text search",
            FilterItem::Geo(_) => "geo filter",
            FilterItem::Array(_) => "array filter",
            FilterItem::ElemMatch(_) => "elemMatch filter",
            FilterItem::Exists(_) => "exists filter",
        }
    }

    /// Deepest nesting level below this node. A root with no nested children
    /// is level 0; each `Group` or `ElemMatch` with children adds one.
    pub fn nesting(&self) -> usize {
        let children = match self {
            FilterItem::Group(g) => &g.conditions,
            FilterItem::ElemMatch(e) => &e.conditions,
            _ => return 0,
        };
        children.iter().map(FilterItem::nesting).max().map_or(0, |d| d + 1)
    }

    /// Logic of the first group with no conditions, searching depth first.
    pub fn empty_group(&self) -> Option<LogicOperator> {
        match self {
            FilterItem::Group(g) if g.conditions.is_empty() => Some(g.logic),
            FilterItem::Group(FilterGroup { conditions, .. })
            | FilterItem::ElemMatch(ElemMatch { conditions, .. }) => {
                conditions.iter().find_map(FilterItem::empty_group)
            }
            _ => None,
        }
    }
}

impl From<Condition> for FilterItem {
    fn from(c: Condition) -> Self {
        FilterItem::Condition(c)
    }
}

impl From<FilterGroup> for FilterItem {
    fn from(g: FilterGroup) -> Self {
        FilterItem::Group(g)
    }
}

impl From<RangeFilter> for FilterItem {
    fn from(r: RangeFilter) -> Self {
        FilterItem::Range(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(path: &str) -> FilterItem {
        FilterItem::Condition(Condition {
            field: Field::new("users", path),
            operator: FilterOperator::Eq,
            value: Param::new(path),
        })
    }

    #[test]
    fn test_nesting() {
        assert_eq!(cond("a").nesting(), 0);

        let group = FilterItem::Group(FilterGroup {
            logic: LogicOperator::And,
            conditions: vec![cond("a"), cond("b")],
        });
        assert_eq!(group.nesting(), 1);

        let nested = FilterItem::ElemMatch(ElemMatch {
            field: Field::new("users", "tags"),
            conditions: vec![group],
        });
        assert_eq!(nested.nesting(), 2);
    }

    #[test]
    fn test_empty_group_nesting() {
        let group = FilterItem::Group(FilterGroup {
            logic: LogicOperator::Or,
            conditions: vec![],
        });
        assert_eq!(group.nesting(), 0);
        assert_eq!(group.kind(), "group");
        assert_eq!(group.empty_group(), Some(LogicOperator::Or));
    }

    #[test]
    fn test_empty_group_found_below_elem_match() {
        let item = FilterItem::ElemMatch(ElemMatch {
            field: Field::new("users", "tags"),
            conditions: vec![
                cond("a"),
                FilterItem::Group(FilterGroup {
                    logic: LogicOperator::And,
                    conditions: vec![cond("b")],
                }),
                FilterItem::Group(FilterGroup {
                    logic: LogicOperator::Nor,
                    conditions: vec![],
                }),
            ],
        });
        assert_eq!(item.empty_group(), Some(LogicOperator::Nor));
        assert_eq!(cond("a").empty_group(), None);
    }
}
