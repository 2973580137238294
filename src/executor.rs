//! Executor boundary
//!
//! The crate never talks to the network itself. Builders hand a [`Command`]
//! to an [`Executor`] and decode whatever [`Reply`] comes back. Connection
//! handling, authentication, timeouts and retries all belong to the
//! executor implementation.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::reply::Reply;

/// A complete command: name followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            args: vec![name.into()],
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args_from<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command name (`FT.SEARCH`, `FT.AGGREGATE`, ...)
    pub fn name(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    /// Every element, name included
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }

    /// Position of the first occurrence of `token`
    pub fn position(&self, token: &str) -> Option<usize> {
        self.args.iter().position(|arg| arg == token)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Sends commands to the engine
pub trait Executor: Send + Sync {
    fn execute(&self, command: &Command) -> Result<Reply, ExecutorError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// An executor that records every command and answers from a queue of
/// canned replies, falling back to a default reply once the queue is empty.
///
/// Useful for dry runs and tests.
pub struct RecordingExecutor {
    replies: Mutex<VecDeque<Result<Reply, ExecutorError>>>,
    fallback: Reply,
    commands: Mutex<Vec<Command>>,
}

impl RecordingExecutor {
    /// Answers every command with an empty result set
    pub fn new() -> Self {
        Self::with_fallback(Reply::Array(vec![Reply::Int(0)]))
    }

    pub fn with_fallback(fallback: Reply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for the next command
    pub fn push_reply(&self, reply: impl Into<Reply>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    /// Queue a failure for the next command
    pub fn push_error(&self, error: ExecutorError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Commands seen so far, oldest first
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn last_command(&self) -> Option<Command> {
        self.commands.lock().last().cloned()
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for RecordingExecutor {
    fn execute(&self, command: &Command) -> Result<Reply, ExecutorError> {
        self.commands.lock().push(command.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let mut cmd = Command::new("FT.SEARCH");
        cmd.arg("order_idx").arg("*").args_from(["LIMIT", "0", "10"]);
        assert_eq!(cmd.to_string(), "FT.SEARCH order_idx * LIMIT 0 10");
        assert_eq!(cmd.name(), "FT.SEARCH");
        assert_eq!(cmd.len(), 6);
        assert_eq!(cmd.position("LIMIT"), Some(3));
    }

    #[test]
    fn test_recording_executor_queue() {
        let exec = RecordingExecutor::new();
        exec.push_reply(Reply::Int(1));
        exec.push_error(ExecutorError::Timeout(Duration::from_secs(1)));

        let cmd = Command::new("PING");
        assert_eq!(exec.execute(&cmd), Ok(Reply::Int(1)));
        assert_eq!(
            exec.execute(&cmd),
            Err(ExecutorError::Timeout(Duration::from_secs(1)))
        );
        assert_eq!(exec.execute(&cmd), Ok(Reply::Array(vec![Reply::Int(0)])));
        assert_eq!(exec.commands().len(), 3);
        assert_eq!(exec.last_command(), Some(cmd));
    }
}
