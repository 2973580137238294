//! Options shared by `Repository::search` and `Repository::aggregate`.
//!
//! Each option knows which builder it affects; applying it to the other one
//! is a no-op, so a single option list can be reused across both calls.

use serde::{Deserialize, Serialize};

use crate::query::{AggregateBuilder, GroupKey, ReduceFunction, Reducer, SearchBuilder, SortOrder};

/// Builder a [`QueryOption`] acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Search,
    Aggregate,
}

const SEARCH_ONLY: &[Target] = &[Target::Search];
const AGGREGATE_ONLY: &[Target] = &[Target::Aggregate];
const BOTH: &[Target] = &[Target::Search, Target::Aggregate];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOption {
    Select { fields: Vec<String> },
    Limit { offset: usize, limit: usize },
    Sort { field: String, order: SortOrder },
    Group { keys: Vec<GroupKey> },
    Reduce { reducer: Reducer },
}

impl QueryOption {
    pub fn select<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryOption::Select {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn limit(offset: usize, limit: usize) -> Self {
        QueryOption::Limit { offset, limit }
    }

    pub fn sort_asc(field: impl Into<String>) -> Self {
        QueryOption::Sort {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn sort_desc(field: impl Into<String>) -> Self {
        QueryOption::Sort {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    pub fn group(keys: impl IntoIterator<Item = GroupKey>) -> Self {
        QueryOption::Group {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn reduce(reducer: Reducer) -> Self {
        QueryOption::Reduce { reducer }
    }

    pub fn count(alias: impl Into<String>) -> Self {
        Self::reduce(Reducer::count(alias))
    }

    pub fn count_distinct(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::reduce(Reducer::new(ReduceFunction::CountDistinct, field, alias))
    }

    pub fn sum(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::reduce(Reducer::new(ReduceFunction::Sum, field, alias))
    }

    pub fn avg(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::reduce(Reducer::new(ReduceFunction::Avg, field, alias))
    }

    pub fn min(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::reduce(Reducer::new(ReduceFunction::Min, field, alias))
    }

    pub fn max(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::reduce(Reducer::new(ReduceFunction::Max, field, alias))
    }

    /// Builders this option affects
    pub fn targets(&self) -> &'static [Target] {
        match self {
            QueryOption::Select { .. } | QueryOption::Sort { .. } => SEARCH_ONLY,
            QueryOption::Limit { .. } => BOTH,
            QueryOption::Group { .. } | QueryOption::Reduce { .. } => AGGREGATE_ONLY,
        }
    }

    pub fn applies_to(&self, target: Target) -> bool {
        self.targets().contains(&target)
    }

    pub fn apply_to_search(&self, builder: &mut SearchBuilder) {
        match self {
            QueryOption::Select { fields } => {
                builder.select(fields.iter().map(String::as_str));
            }
            QueryOption::Limit { offset, limit } => {
                builder.limit(*offset, *limit);
            }
            QueryOption::Sort { field, order } => {
                builder.sort_by(field.as_str(), *order);
            }
            QueryOption::Group { .. } | QueryOption::Reduce { .. } => {}
        }
    }

    pub fn apply_to_aggregate(&self, builder: &mut AggregateBuilder) {
        match self {
            QueryOption::Limit { offset, limit } => {
                builder.limit(*offset, *limit);
            }
            QueryOption::Group { keys } => {
                builder.group_by(keys.iter().cloned());
            }
            QueryOption::Reduce { reducer } => {
                builder.reduce(reducer.clone());
            }
            QueryOption::Select { .. } | QueryOption::Sort { .. } => {}
        }
    }
}
