use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::compile::query_string;
use super::expr::Expr;
use super::{dispatch, QueryError, DEFAULT_LIMIT};
use crate::executor::{Command, Executor};
use crate::reply::{decode_documents, decode_reply, Decoded, Document, Row};

pub const SEARCH_COMMAND: &str = "FT.SEARCH";

/// Sort direction for SORTBY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for `FT.SEARCH`.
///
/// ```
/// use ftquery::query::{Expr, SearchBuilder, SortOrder};
///
/// let mut search = SearchBuilder::new("order_idx");
/// search
///     .filter(Expr::eq("status", "PENDING"))
///     .select(["order_id", "qty"])
///     .sort_by("promise_ts", SortOrder::Asc)
///     .limit(0, 50);
/// assert_eq!(
///     search.command().to_string(),
///     "FT.SEARCH order_idx (@status:{PENDING}) RETURN 2 order_id qty SORTBY promise_ts ASC LIMIT 0 50"
/// );
/// ```
#[derive(Clone)]
pub struct SearchBuilder {
    index: String,
    filter: Option<Expr>,
    return_fields: Vec<String>,
    sort: Option<(String, SortOrder)>,
    offset: usize,
    limit: usize,
    executor: Option<Arc<dyn Executor>>,
}

impl SearchBuilder {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            filter: None,
            return_fields: Vec::new(),
            sort: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
            executor: None,
        }
    }

    pub fn filter(&mut self, expr: Expr) -> &mut Self {
        self.filter = Some(expr);
        self
    }

    /// Fields to RETURN; replaces any previous selection
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.return_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort_by(&mut self, field: impl Into<String>, order: SortOrder) -> &mut Self {
        self.sort = Some((field.into(), order));
        self
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

    pub fn filter_expr(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    /// The full argument vector, without executing anything
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(SEARCH_COMMAND);
        cmd.arg(self.index.as_str())
            .arg(query_string(self.filter.as_ref()));

        if !self.return_fields.is_empty() {
            cmd.arg("RETURN")
                .arg(self.return_fields.len().to_string())
                .args_from(self.return_fields.iter().map(String::as_str));
        }

        if let Some((field, order)) = &self.sort {
            cmd.arg("SORTBY").arg(field.as_str()).arg(order.as_str());
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

    /// Execute and decode into typed documents
    pub fn run_as<T: Document>(&self) -> Result<Vec<T>, QueryError> {
        let reply = dispatch(self.executor.as_ref(), &self.command())?;
        Ok(decode_documents(&reply)?)
    }
}

impl fmt::Debug for SearchBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchBuilder")
            .field("index", &self.index)
            .field("filter", &self.filter)
            .field("return_fields", &self.return_fields)
            .field("sort", &self.sort)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("has_executor", &self.executor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorError, RecordingExecutor};
    use crate::reply::{DecodeError, Reply, Schema};
    use serde_json::json;

    fn args(cmd: &Command) -> Vec<&str> {
        cmd.args().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_default_command() {
        let search = SearchBuilder::new("order_idx");
        assert_eq!(
            args(&search.command()),
            vec!["FT.SEARCH", "order_idx", "*", "LIMIT", "0", "10000"]
        );
    }

    #[test]
    fn test_match_all_filter_is_wildcard() {
        let mut search = SearchBuilder::new("order_idx");
        search.filter(Expr::match_all());
        assert_eq!(search.command().args()[2], "*");
    }

    #[test]
    fn test_filter_wrapped_in_group() {
        let mut search = SearchBuilder::new("order_idx");
        search.filter(Expr::and([
            Expr::eq("status", "PENDING"),
            Expr::is_in("warehouse_id", [45, 46]),
        ]));
        assert_eq!(
            search.command().args()[2],
            "((@status:{PENDING} @warehouse_id:{45|46}))"
        );
    }

    #[test]
    fn test_full_command_order() {
        let mut search = SearchBuilder::new("order_idx");
        search
            .filter(Expr::eq("status", "PENDING"))
            .select(["order_id", "qty", "promise_ts"])
            .sort_by("promise_ts", SortOrder::Desc)
            .limit(10, 20);
        assert_eq!(
            args(&search.command()),
            vec![
                "FT.SEARCH",
                "order_idx",
                "(@status:{PENDING})",
                "RETURN",
                "3",
                "order_id",
                "qty",
                "promise_ts",
                "SORTBY",
                "promise_ts",
                "DESC",
                "LIMIT",
                "10",
                "20",
            ]
        );
    }

    #[test]
    fn test_select_replaces_previous() {
        let mut search = SearchBuilder::new("idx");
        search.select(["a", "b"]).select(["c"]);
        let cmd = search.command();
        assert_eq!(&cmd.args()[3..6], ["RETURN", "1", "c"]);
    }

    #[test]
    fn test_run_without_executor() {
        let search = SearchBuilder::new("idx");
        assert!(matches!(search.run(), Err(QueryError::ExecutorNotSet)));
    }

    #[test]
    fn test_run_decodes_rows() {
        let exec = Arc::new(RecordingExecutor::new());
        exec.push_reply(Reply::from(json!([
            2,
            "doc:1", ["status", "PENDING"],
            "doc:2", ["status", "SHIPPED"]
        ])));

        let mut search = SearchBuilder::new("order_idx");
        search.filter(Expr::eq("status", "PENDING")).using(exec.clone());
        let rows = search.run().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["status"], "SHIPPED");
        assert_eq!(exec.last_command(), Some(search.command()));
    }

    #[test]
    fn test_transport_error_propagates() {
        let exec = Arc::new(RecordingExecutor::new());
        exec.push_error(ExecutorError::Connection("refused".into()));

        let mut search = SearchBuilder::new("idx");
        search.using(exec);
        match search.run() {
            Err(QueryError::Transport(err)) => {
                assert_eq!(err, ExecutorError::Connection("refused".into()))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_engine_error_reply_keeps_message() {
        let exec = Arc::new(RecordingExecutor::new());
        exec.push_reply(Reply::Error("order_idx: no such index".into()));

        let mut search = SearchBuilder::new("order_idx");
        search.using(exec);
        let err = search.run().unwrap_err();
        match &err {
            QueryError::Transport(ExecutorError::Engine(message)) => {
                assert_eq!(message, "order_idx: no such index")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("order_idx: no such index"));
    }

    #[test]
    fn test_decode_error_propagates() {
        let exec = Arc::new(RecordingExecutor::with_fallback(Reply::Int(1)));
        let mut search = SearchBuilder::new("idx");
        search.using(exec);
        assert!(matches!(
            search.run(),
            Err(QueryError::Decode(DecodeError::UnsupportedReply("int")))
        ));
    }

    #[derive(Debug, Default)]
    struct Order {
        id: String,
        qty: i64,
    }

    impl Document for Order {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .text("order_id", |o, v| o.id = v)
                .integer("qty", |o, v| o.qty = v)
        }
    }

    #[test]
    fn test_run_as_documents() {
        let exec = Arc::new(RecordingExecutor::new());
        exec.push_reply(Reply::from(json!({
            "total_results": 1,
            "results": [{"id": "order:101", "extra_attributes": {"order_id": "101", "qty": "7"}}]
        })));

        let mut search = SearchBuilder::new("order_idx");
        search.using(exec);
        let orders: Vec<Order> = search.run_as().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "101");
        assert_eq!(orders[0].qty, 7);
    }
}
