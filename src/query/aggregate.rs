use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::compile::query_string;
use super::expr::{field_ref, Expr};
use super::group::GroupKey;
use super::{dispatch, QueryError, DEFAULT_LIMIT};
use crate::executor::{Command, Executor};
use crate::reply::{decode_reply, Decoded, Row};

pub const AGGREGATE_COMMAND: &str = "FT.AGGREGATE";

/// Reduction functions understood by the GROUPBY pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReduceFunction {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl ReduceFunction {
    pub fn name(&self) -> &'static str {
        match self {
            ReduceFunction::Count => "COUNT",
            ReduceFunction::CountDistinct => "COUNT_DISTINCT",
            ReduceFunction::Sum => "SUM",
            ReduceFunction::Avg => "AVG",
            ReduceFunction::Min => "MIN",
            ReduceFunction::Max => "MAX",
        }
    }

    /// Number of positional arguments the engine expects
    pub fn arity(&self) -> usize {
        match self {
            ReduceFunction::Count => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for ReduceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One REDUCE step. `field` is empty for COUNT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reducer {
    pub function: ReduceFunction,
    #[serde(default)]
    pub field: String,
    pub alias: String,
}

impl Reducer {
    pub fn new(
        function: ReduceFunction,
        field: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            function,
            field: field.into(),
            alias: alias.into(),
        }
    }

    pub fn count(alias: impl Into<String>) -> Self {
        Self::new(ReduceFunction::Count, "", alias)
    }

    /// `REDUCE COUNT 0 AS alias` / `REDUCE fn 1 @field AS alias`
    fn write_to(&self, cmd: &mut Command) {
        cmd.arg("REDUCE")
            .arg(self.function.name())
            .arg(self.function.arity().to_string());
        if self.function.arity() > 0 {
            cmd.arg(field_ref(&self.field));
        }
        cmd.arg("AS").arg(self.alias.as_str());
    }
}

/// Builder for `FT.AGGREGATE`.
///
/// Reducers are emitted in the order they were added; the engine runs them
/// as a pipeline.
///
/// ```
/// use ftquery::query::{AggregateBuilder, GroupKey};
///
/// let mut agg = AggregateBuilder::new("order_idx");
/// agg.group_by([GroupKey::by("warehouse_id")])
///     .count("orders")
///     .sum("qty", "total_qty");
/// assert_eq!(
///     agg.command().to_string(),
///     "FT.AGGREGATE order_idx * GROUPBY 1 @warehouse_id REDUCE COUNT 0 AS orders REDUCE SUM 1 @qty AS total_qty LIMIT 0 10000"
/// );
/// ```
#[derive(Clone)]
pub struct AggregateBuilder {
    index: String,
    filter: Option<Expr>,
    groups: Vec<GroupKey>,
    reducers: Vec<Reducer>,
    offset: usize,
    limit: usize,
    executor: Option<Arc<dyn Executor>>,
}

impl AggregateBuilder {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            filter: None,
            groups: Vec::new(),
            reducers: Vec::new(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            executor: None,
        }
    }

    pub fn filter(&mut self, expr: Expr) -> &mut Self {
        self.filter = Some(expr);
        self
    }

    /// Group keys; replaces any previous grouping
    pub fn group_by(&mut self, keys: impl IntoIterator<Item = GroupKey>) -> &mut Self {
        self.groups = keys.into_iter().collect();
        self
    }

    /// Append a reducer. No check is made that the field exists.
    pub fn reduce(&mut self, reducer: Reducer) -> &mut Self {
        self.reducers.push(reducer);
        self
    }

    pub fn count(&mut self, alias: impl Into<String>) -> &mut Self {
        self.reduce(Reducer::count(alias))
    }

    pub fn count_distinct(
        &mut self,
        field: impl Into<String>,
        alias: impl Into<String>,
    ) -> &mut Self {
        self.reduce(Reducer::new(ReduceFunction::CountDistinct, field, alias))
    }

    pub fn sum(&mut self, field: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.reduce(Reducer::new(ReduceFunction::Sum, field, alias))
    }

    pub fn avg(&mut self, field: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.reduce(Reducer::new(ReduceFunction::Avg, field, alias))
    }

    pub fn min(&mut self, field: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.reduce(Reducer::new(ReduceFunction::Min, field, alias))
    }

    pub fn max(&mut self, field: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.reduce(Reducer::new(ReduceFunction::Max, field, alias))
    }

    pub fn limit(&mut self, offset: usize, limit: usize) -> &mut Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn using(&mut self, executor: Arc<dyn Executor>) -> &mut Self {
        self.executor = Some(executor);
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn reducers(&self) -> &[Reducer] {
        &self.reducers
    }

    /// The full argument vector, without executing anything
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(AGGREGATE_COMMAND);
        cmd.arg(self.index.as_str())
            .arg(query_string(self.filter.as_ref()));

        // Aliased keys are projected first so GROUPBY can refer to them.
        for key in &self.groups {
            if let Some(alias) = key.alias_name() {
                cmd.arg("APPLY").arg(key.reference()).arg("AS").arg(alias);
            }
        }

        cmd.arg("GROUPBY").arg(self.groups.len().to_string());
        for key in &self.groups {
            cmd.arg(key.group_ref());
        }

        for reducer in &self.reducers {
            reducer.write_to(&mut cmd);
        }

        cmd.arg("LIMIT")
            .arg(self.offset.to_string())
            .arg(self.limit.to_string());
        cmd
    }

    /// Execute and decode into rows
    pub fn run(&self) -> Result<Vec<Row>, QueryError> {
        self.run_decoded().map(|decoded| decoded.rows)
    }

    /// Execute and decode, keeping the engine-reported total
    pub fn run_decoded(&self) -> Result<Decoded, QueryError> {
        let reply = dispatch(self.executor.as_ref(), &self.command())?;
        Ok(decode_reply(&reply)?)
    }
}

impl fmt::Debug for AggregateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateBuilder")
            .field("index", &self.index)
            .field("filter", &self.filter)
            .field("groups", &self.groups)
            .field("reducers", &self.reducers)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("has_executor", &self.executor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;
    use crate::reply::Reply;
    use serde_json::json;

    fn args(cmd: &Command) -> Vec<&str> {
        cmd.args().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_default_command() {
        let agg = AggregateBuilder::new("order_idx");
        assert_eq!(
            args(&agg.command()),
            vec!["FT.AGGREGATE", "order_idx", "*", "GROUPBY", "0", "LIMIT", "0", "10000"]
        );
    }

    #[test]
    fn test_reducer_order_and_arity() {
        let mut agg = AggregateBuilder::new("order_idx");
        agg.group_by([GroupKey::by("warehouse_id"), GroupKey::by("status")])
            .count("orders")
            .sum("qty", "total_qty")
            .avg("@qty", "avg_qty");

        assert_eq!(
            args(&agg.command()),
            vec![
                "FT.AGGREGATE",
                "order_idx",
                "*",
                "GROUPBY",
                "2",
                "@warehouse_id",
                "@status",
                "REDUCE",
                "COUNT",
                "0",
                "AS",
                "orders",
                "REDUCE",
                "SUM",
                "1",
                "@qty",
                "AS",
                "total_qty",
                "REDUCE",
                "AVG",
                "1",
                "@qty",
                "AS",
                "avg_qty",
                "LIMIT",
                "0",
                "10000",
            ]
        );
    }

    #[test]
    fn test_reducers_keep_call_order() {
        let mut agg = AggregateBuilder::new("idx");
        agg.max("qty", "max_qty").count("n").min("qty", "min_qty");
        let names: Vec<ReduceFunction> = agg.reducers().iter().map(|r| r.function).collect();
        assert_eq!(
            names,
            vec![ReduceFunction::Max, ReduceFunction::Count, ReduceFunction::Min]
        );

        let cmd = agg.command();
        let max_at = cmd.position("MAX").unwrap();
        let count_at = cmd.position("COUNT").unwrap();
        let min_at = cmd.position("MIN").unwrap();
        assert!(max_at < count_at && count_at < min_at);
    }

    #[test]
    fn test_group_by_replaces() {
        let mut agg = AggregateBuilder::new("idx");
        agg.group_by([GroupKey::by("a"), GroupKey::by("b")])
            .group_by([GroupKey::by("c")]);
        assert_eq!(&args(&agg.command())[3..6], ["GROUPBY", "1", "@c"]);
    }

    #[test]
    fn test_aliased_group_key_uses_apply() {
        let mut agg = AggregateBuilder::new("idx");
        agg.group_by([
            GroupKey::by_expr("floor(@created_ts/86400)").alias("day"),
            GroupKey::by("status"),
        ])
        .count("n");
        assert_eq!(
            args(&agg.command()),
            vec![
                "FT.AGGREGATE",
                "idx",
                "*",
                "APPLY",
                "floor(@created_ts/86400)",
                "AS",
                "day",
                "GROUPBY",
                "2",
                "@day",
                "@status",
                "REDUCE",
                "COUNT",
                "0",
                "AS",
                "n",
                "LIMIT",
                "0",
                "10000",
            ]
        );
    }

    #[test]
    fn test_count_distinct() {
        let mut agg = AggregateBuilder::new("idx");
        agg.count_distinct("user_id", "users");
        let cmd = agg.command();
        let at = cmd.position("REDUCE").unwrap();
        assert_eq!(
            &args(&cmd)[at..at + 6],
            ["REDUCE", "COUNT_DISTINCT", "1", "@user_id", "AS", "users"]
        );
    }

    #[test]
    fn test_filter_and_limit() {
        let mut agg = AggregateBuilder::new("idx");
        agg.filter(Expr::eq("status", "PENDING")).limit(0, 150);
        let cmd = agg.command();
        assert_eq!(cmd.args()[2], "(@status:{PENDING})");
        assert_eq!(&args(&cmd)[cmd.len() - 3..], ["LIMIT", "0", "150"]);
    }

    #[test]
    fn test_run_without_executor() {
        let agg = AggregateBuilder::new("idx");
        assert!(matches!(agg.run(), Err(QueryError::ExecutorNotSet)));
    }

    #[test]
    fn test_run_keyed_reply() {
        let exec = Arc::new(RecordingExecutor::new());
        exec.push_reply(Reply::from(json!({
            "total_results": 2,
            "results": [
                {"extra_attributes": {"warehouse_id": "1", "orders": "3"}},
                {"extra_attributes": {"warehouse_id": "2", "orders": "5"}}
            ]
        })));

        let mut agg = AggregateBuilder::new("order_idx");
        agg.group_by([GroupKey::by("warehouse_id")])
            .count("orders")
            .using(exec.clone());
        let decoded = agg.run_decoded().unwrap();

        assert_eq!(decoded.total(), 2);
        assert_eq!(decoded.rows[1]["orders"], "5");
        assert_eq!(exec.commands().len(), 1);
    }

    #[test]
    fn test_reducer_json() {
        let reducer: Reducer =
            serde_json::from_value(json!({"function": "SUM", "field": "qty", "alias": "total"}))
                .unwrap();
        assert_eq!(reducer, Reducer::new(ReduceFunction::Sum, "qty", "total"));

        let count: Reducer =
            serde_json::from_value(json!({"function": "COUNT", "alias": "n"})).unwrap();
        assert_eq!(count, Reducer::count("n"));
    }
}
