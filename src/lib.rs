//! ftquery: query building and reply decoding for RediSearch-compatible engines
//!
//! Filters are written as a small expression tree, compiled to the engine's
//! query syntax, and wrapped into `FT.SEARCH` / `FT.AGGREGATE` argument
//! vectors. Sending a command is delegated to an [`Executor`]; the reply it
//! returns is decoded into string rows or typed documents.
//!
//! # Features
//!
//! - **Filter expressions**: equality, set membership, numeric ranges, and/or/not
//! - **Search builder**: RETURN projection, SORTBY, LIMIT
//! - **Aggregate builder**: GROUPBY with aliased keys, ordered REDUCE steps
//! - **Reply decoding**: legacy array and keyed-map reply shapes
//! - **Typed documents**: explicit field schemas, cached per type
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ftquery::executor::RecordingExecutor;
//! use ftquery::query::{Expr, SearchBuilder};
//! use ftquery::reply::Reply;
//!
//! let exec = Arc::new(RecordingExecutor::new());
//! exec.push_reply(Reply::from(serde_json::json!([
//!     1, "order:1", ["order_id", "1", "status", "PENDING"]
//! ])));
//!
//! let mut search = SearchBuilder::new("order_idx");
//! search.filter(Expr::eq("status", "PENDING")).using(exec);
//! let rows = search.run().unwrap();
//! assert_eq!(rows[0]["status"], "PENDING");
//! ```

pub mod cli;
pub mod config;
pub mod executor;
pub mod query;
pub mod reply;
pub mod repository;

// Re-export commonly used types
pub use config::{ClientConfig, ConfigError};
pub use executor::{Command, Executor, ExecutorError};
pub use query::{AggregateBuilder, Expr, GroupKey, QueryError, SearchBuilder, SortOrder};
pub use reply::{DecodeError, Document, Reply, Row, Schema};
pub use repository::{QueryOption, Repository};
