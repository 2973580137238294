use serde::{Deserialize, Serialize};

use crate::query::{pool, DEFAULT_LIMIT};

pub const ENV_INDEX: &str = "FTQUERY_INDEX";
pub const ENV_DEFAULT_LIMIT: &str = "FTQUERY_DEFAULT_LIMIT";
pub const ENV_POOL_BUFFERS: &str = "FTQUERY_POOL_BUFFERS";
pub const ENV_POOL_CAPACITY: &str = "FTQUERY_POOL_CAPACITY";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Index queried when a request does not name one
    pub index: Option<String>,
    /// Page size applied before any explicit limit option
    pub default_limit: usize,
    /// Idle buffers kept by the compile buffer pool
    pub pool_max_buffers: usize,
    /// Buffers larger than this are not returned to the pool
    pub pool_max_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            index: None,
            default_limit: DEFAULT_LIMIT,
            pool_max_buffers: pool::DEFAULT_MAX_BUFFERS,
            pool_max_capacity: pool::DEFAULT_MAX_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Create a config from environment variables
    /// FTQUERY_INDEX=order_idx
    /// FTQUERY_DEFAULT_LIMIT=10000
    /// FTQUERY_POOL_BUFFERS=64
    /// FTQUERY_POOL_CAPACITY=16384
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let index = lookup(ENV_INDEX)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            index,
            default_limit: parse_usize(&lookup, ENV_DEFAULT_LIMIT, defaults.default_limit)?,
            pool_max_buffers: parse_usize(&lookup, ENV_POOL_BUFFERS, defaults.pool_max_buffers)?,
            pool_max_capacity: parse_usize(&lookup, ENV_POOL_CAPACITY, defaults.pool_max_capacity)?,
        })
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Push the pool limits to the process-wide buffer pool
    pub fn apply_pool_limits(&self) {
        pool::configure(self.pool_max_buffers, self.pool_max_capacity);
        tracing::debug!(
            max_buffers = self.pool_max_buffers,
            max_capacity = self.pool_max_capacity,
            "configured buffer pool"
        );
    }
}

fn parse_usize<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("No index configured (set FTQUERY_INDEX or name one in the request)")]
    MissingIndex,
}
