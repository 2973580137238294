//! Index-bound façade over the query builders.
//!
//! ```
//! use std::sync::Arc;
//! use ftquery::executor::RecordingExecutor;
//! use ftquery::query::Expr;
//! use ftquery::repository::{QueryOption, Repository};
//!
//! let repo = Repository::new("order_idx", Arc::new(RecordingExecutor::new()));
//! let search = repo.search_builder(
//!     Expr::and([Expr::eq("status", "PENDING"), Expr::is_in("warehouse_id", [45, 46])]),
//!     &[
//!         QueryOption::select(["order_id", "qty"]),
//!         QueryOption::sort_asc("promise_ts"),
//!         QueryOption::limit(0, 1000),
//!     ],
//! );
//! assert_eq!(
//!     search.command().to_string(),
//!     "FT.SEARCH order_idx ((@status:{PENDING} @warehouse_id:{45|46})) RETURN 2 order_id qty SORTBY promise_ts ASC LIMIT 0 1000"
//! );
//! ```

pub mod options;

pub use options::{QueryOption, Target};

use std::fmt;
use std::sync::Arc;

use crate::config::{ClientConfig, ConfigError};
use crate::executor::Executor;
use crate::query::{AggregateBuilder, Expr, QueryError, SearchBuilder, DEFAULT_LIMIT};
use crate::reply::{Document, Row};

/// Runs searches and aggregations against one index
#[derive(Clone)]
pub struct Repository {
    index: String,
    default_limit: usize,
    executor: Arc<dyn Executor>,
}

impl Repository {
    pub fn new(index: impl Into<String>, executor: Arc<dyn Executor>) -> Self {
        Self {
            index: index.into(),
            default_limit: DEFAULT_LIMIT,
            executor,
        }
    }

    /// Build from config; the config must name an index
    pub fn from_config(
        config: &ClientConfig,
        executor: Arc<dyn Executor>,
    ) -> Result<Self, ConfigError> {
        let index = config.index.clone().ok_or(ConfigError::MissingIndex)?;
        Ok(Self {
            index,
            default_limit: config.default_limit,
            executor,
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// A search builder with `filter` and `options` applied, ready to run
    pub fn search_builder(&self, filter: Expr, options: &[QueryOption]) -> SearchBuilder {
        let mut builder = SearchBuilder::new(self.index.as_str());
        builder
            .filter(filter)
            .limit(0, self.default_limit)
            .using(Arc::clone(&self.executor));
        for option in options {
            option.apply_to_search(&mut builder);
        }
        builder
    }

    /// An aggregate builder with `filter` and `options` applied, ready to run
    pub fn aggregate_builder(&self, filter: Expr, options: &[QueryOption]) -> AggregateBuilder {
        let mut builder = AggregateBuilder::new(self.index.as_str());
        builder
            .filter(filter)
            .limit(0, self.default_limit)
            .using(Arc::clone(&self.executor));
        for option in options {
            option.apply_to_aggregate(&mut builder);
        }
        builder
    }

    /// Run `FT.SEARCH` and return raw rows
    pub fn search(&self, filter: Expr, options: &[QueryOption]) -> Result<Vec<Row>, QueryError> {
        self.search_builder(filter, options).run()
    }

    /// Run `FT.SEARCH` and decode into documents
    pub fn search_as<T: Document>(
        &self,
        filter: Expr,
        options: &[QueryOption],
    ) -> Result<Vec<T>, QueryError> {
        self.search_builder(filter, options).run_as()
    }

    /// Run `FT.AGGREGATE` and return raw rows
    pub fn aggregate(&self, filter: Expr, options: &[QueryOption]) -> Result<Vec<Row>, QueryError> {
        self.aggregate_builder(filter, options).run()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("index", &self.index)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}
