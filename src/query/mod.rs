pub mod aggregate;
pub mod compile;
pub mod expr;
pub mod group;
pub mod pool;
pub mod search;

use std::sync::Arc;

pub use aggregate::{AggregateBuilder, ReduceFunction, Reducer, AGGREGATE_COMMAND};
pub use compile::{compile, query_string};
pub use expr::{field_ref, Expr, Scalar, FIELD_SIGIL};
pub use group::GroupKey;
pub use pool::PooledBuffer;
pub use search::{SearchBuilder, SortOrder, SEARCH_COMMAND};

use crate::executor::{Command, Executor, ExecutorError};
use crate::reply::{DecodeError, Reply};

/// Page size used when the caller never calls `limit()`
pub const DEFAULT_LIMIT: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Executor not set (call using() first)")]
    ExecutorNotSet,

    #[error("Transport error: {0}")]
    Transport(#[from] ExecutorError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Hand a command to the bound executor. A top-level error reply is
/// surfaced as [`ExecutorError::Engine`] carrying the engine's message.
pub(crate) fn dispatch(
    executor: Option<&Arc<dyn Executor>>,
    command: &Command,
) -> Result<Reply, QueryError> {
    let Some(executor) = executor else {
        return Err(QueryError::ExecutorNotSet);
    };

    tracing::debug!(command = %command, args = command.len(), "dispatching command");
    match executor.execute(command) {
        Ok(Reply::Error(message)) => {
            tracing::warn!(
                command = %command.name(),
                error = %message,
                "engine returned an error reply"
            );
            Err(ExecutorError::Engine(message).into())
        }
        Ok(reply) => Ok(reply),
        Err(err) => {
            tracing::warn!(command = %command.name(), error = %err, "executor failed");
            Err(err.into())
        }
    }
}
