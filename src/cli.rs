//! Command-line front end: dry-run command compilation and reply decoding
//! from JSON files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ClientConfig, ConfigError};
use crate::executor::{Command, RecordingExecutor};
use crate::query::Expr;
use crate::reply::{decode_reply, DecodeError, Reply};
use crate::repository::{QueryOption, Repository};

pub const USAGE: &str = "usage: ftquery <search|aggregate|decode> <file.json>";

/// A search or aggregate request as read from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    pub index: Option<String>,
    pub filter: Option<Expr>,
    pub options: Vec<QueryOption>,
}

/// Decoded rows as printed by `ftquery decode`
#[derive(Debug, Serialize)]
pub struct DecodeOutput {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_total: Option<i64>,
    pub rows: Vec<BTreeMap<String, String>>,
}

#[derive(Debug)]
pub enum Action {
    Search(PathBuf),
    Aggregate(PathBuf),
    Decode(PathBuf),
}

impl Action {
    pub fn parse<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        match args.as_slice() {
            [action, path] => {
                let path = PathBuf::from(path);
                match action.as_str() {
                    "search" => Ok(Action::Search(path)),
                    "aggregate" => Ok(Action::Aggregate(path)),
                    "decode" => Ok(Action::Decode(path)),
                    other => Err(CliError::Usage(format!("unknown command '{}'", other))),
                }
            }
            _ => Err(CliError::Usage(USAGE.to_string())),
        }
    }
}

/// Run one action and return what should be printed
pub fn run(action: &Action, config: &ClientConfig) -> Result<String, CliError> {
    match action {
        Action::Search(path) => {
            let request: Request = read_json(path)?;
            Ok(compile_request(&request, config, false)?.to_string())
        }
        Action::Aggregate(path) => {
            let request: Request = read_json(path)?;
            Ok(compile_request(&request, config, true)?.to_string())
        }
        Action::Decode(path) => {
            let raw: serde_json::Value = read_json(path)?;
            let output = decode_output(&Reply::from(raw))?;
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}

/// Compile a request into its command without running it
pub fn compile_request(
    request: &Request,
    config: &ClientConfig,
    aggregate: bool,
) -> Result<Command, CliError> {
    let config = match &request.index {
        Some(index) => config.clone().with_index(index.as_str()),
        None => config.clone(),
    };
    let repo = Repository::from_config(&config, Arc::new(RecordingExecutor::new()))?;
    let filter = request.filter.clone().unwrap_or_default();
    Ok(if aggregate {
        repo.aggregate_builder(filter, &request.options).command()
    } else {
        repo.search_builder(filter, &request.options).command()
    })
}

pub fn decode_output(reply: &Reply) -> Result<DecodeOutput, CliError> {
    let decoded = decode_reply(reply)?;
    Ok(DecodeOutput {
        total: decoded.total(),
        reported_total: decoded.reported_total,
        rows: decoded
            .rows
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(value: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn test_parse_actions() {
        assert!(matches!(Action::parse(["search", "q.json"]), Ok(Action::Search(_))));
        assert!(matches!(Action::parse(["decode", "r.json"]), Ok(Action::Decode(_))));
        assert!(matches!(Action::parse(["explain", "q.json"]), Err(CliError::Usage(_))));
        assert!(matches!(Action::parse(["search"]), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_search_request() {
        let file = json_file(serde_json::json!({
            "index": "order_idx",
            "filter": {"op": "eq", "field": "status", "value": "PENDING"},
            "options": [
                {"kind": "select", "fields": ["order_id", "qty"]},
                {"kind": "limit", "offset": 0, "limit": 50}
            ]
        }));
        let action = Action::Search(file.path().to_path_buf());
        let out = run(&action, &ClientConfig::default()).unwrap();
        assert_eq!(
            out,
            "FT.SEARCH order_idx (@status:{PENDING}) RETURN 2 order_id qty LIMIT 0 50"
        );
    }

    #[test]
    fn test_aggregate_request_uses_config_index() {
        let file = json_file(serde_json::json!({
            "options": [
                {"kind": "group", "keys": [{"reference": "@warehouse_id"}]},
                {"kind": "reduce", "reducer": {"function": "COUNT", "alias": "orders"}}
            ]
        }));
        let config = ClientConfig::default().with_index("order_idx");
        let out = run(&Action::Aggregate(file.path().to_path_buf()), &config).unwrap();
        assert_eq!(
            out,
            "FT.AGGREGATE order_idx * GROUPBY 1 @warehouse_id REDUCE COUNT 0 AS orders LIMIT 0 10000"
        );
    }

    #[test]
    fn test_missing_index() {
        let request = Request::default();
        let err = compile_request(&request, &ClientConfig::default(), false).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::MissingIndex)));
    }

    #[test]
    fn test_decode_file() {
        let file = json_file(serde_json::json!([
            2,
            "doc:1", ["status", "PENDING"],
            "doc:2", ["status", "SHIPPED"]
        ]));
        let action = Action::Decode(file.path().to_path_buf());
        let out = run(&action, &ClientConfig::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total"], 2);
        assert_eq!(parsed["reported_total"], 2);
        assert_eq!(parsed["rows"][1]["status"], "SHIPPED");
    }

    #[test]
    fn test_unreadable_file() {
        let err = run(
            &Action::Decode(PathBuf::from("/nonexistent/reply.json")),
            &ClientConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
