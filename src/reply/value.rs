use std::fmt;

/// An untyped engine reply, as handed back by an executor.
///
/// Mirrors the value space of the RESP2/RESP3 protocols. Map keys are
/// themselves replies: the decoder coerces them to strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Int(i64),
    Double(f64),
    Bool(bool),
    /// Verified UTF-8 text (simple strings, RESP3 verbatim strings)
    Text(String),
    /// Binary-safe bulk string
    Bulk(Vec<u8>),
    Array(Vec<Reply>),
    Map(Vec<(Reply, Reply)>),
    /// An error reply embedded in an otherwise successful response
    Error(String),
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Int(_) => "int",
            Reply::Double(_) => "double",
            Reply::Bool(_) => "bool",
            Reply::Text(_) => "text",
            Reply::Bulk(_) => "bulk",
            Reply::Array(_) => "array",
            Reply::Map(_) => "map",
            Reply::Error(_) => "error",
        }
    }

    /// Scalars are everything but arrays and maps
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Reply::Array(_) | Reply::Map(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Reply::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Trimmed textual form of any reply. Total: nested arrays and maps
    /// render as `[a, b]` and `{k: v}`.
    pub fn to_text(&self) -> String {
        match self {
            Reply::Nil => String::new(),
            Reply::Int(v) => v.to_string(),
            Reply::Double(v) => format_double(*v),
            Reply::Bool(b) => b.to_string(),
            Reply::Text(s) => s.trim().to_string(),
            Reply::Bulk(bytes) => String::from_utf8_lossy(bytes).trim().to_string(),
            Reply::Error(msg) => msg.trim().to_string(),
            Reply::Array(items) => {
                let parts: Vec<String> = items.iter().map(Reply::to_text).collect();
                format!("[{}]", parts.join(", "))
            }
            Reply::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_text(), v.to_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Look up a string key in a map reply
    pub fn get(&self, key: &str) -> Option<&Reply> {
        match self {
            Reply::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.to_text() == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

fn format_double(v: f64) -> String {
    if v.is_infinite() {
        if v.is_sign_positive() { "inf" } else { "-inf" }.to_string()
    } else {
        v.to_string()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Text(s)
    }
}

impl From<i64> for Reply {
    fn from(v: i64) -> Self {
        Reply::Int(v)
    }
}

impl From<f64> for Reply {
    fn from(v: f64) -> Self {
        Reply::Double(v)
    }
}

impl From<Vec<Reply>> for Reply {
    fn from(items: Vec<Reply>) -> Self {
        Reply::Array(items)
    }
}

/// JSON fixtures: objects become maps with text keys, integral numbers
/// become `Int`, other numbers `Double`
impl From<serde_json::Value> for Reply {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Reply::Nil,
            serde_json::Value::Bool(b) => Reply::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Reply::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Reply::Double(f)
                } else {
                    Reply::Text(n.to_string())
                }
            }
            serde_json::Value::String(s) => Reply::Text(s),
            serde_json::Value::Array(items) => {
                Reply::Array(items.into_iter().map(Reply::from).collect())
            }
            serde_json::Value::Object(obj) => Reply::Map(
                obj.into_iter()
                    .map(|(k, v)| (Reply::Text(k), Reply::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_scalars() {
        assert_eq!(Reply::Text("  PENDING ".into()).to_text(), "PENDING");
        assert_eq!(Reply::Bulk(b" 42\r\n".to_vec()).to_text(), "42");
        assert_eq!(Reply::Int(-7).to_text(), "-7");
        assert_eq!(Reply::Double(3.5).to_text(), "3.5");
        assert_eq!(Reply::Double(3.0).to_text(), "3");
        assert_eq!(Reply::Bool(true).to_text(), "true");
        assert_eq!(Reply::Nil.to_text(), "");
    }

    #[test]
    fn test_to_text_nested() {
        let reply = Reply::Array(vec![Reply::Int(1), Reply::from("a")]);
        assert_eq!(reply.to_text(), "[1, a]");

        let reply = Reply::Map(vec![(Reply::from("k"), Reply::Int(2))]);
        assert_eq!(reply.to_text(), "{k: 2}");
    }

    #[test]
    fn test_from_json() {
        let reply = Reply::from(serde_json::json!({
            "total_results": 1,
            "results": [1.5, "x", null]
        }));
        assert_eq!(reply.get("total_results"), Some(&Reply::Int(1)));
        assert_eq!(
            reply.get("results"),
            Some(&Reply::Array(vec![
                Reply::Double(1.5),
                Reply::Text("x".into()),
                Reply::Nil
            ]))
        );
        assert_eq!(reply.get("missing"), None);
    }

    #[test]
    fn test_map_lookup_with_binary_keys() {
        let reply = Reply::Map(vec![(Reply::Bulk(b"results".to_vec()), Reply::Array(vec![]))]);
        assert_eq!(reply.get("results"), Some(&Reply::Array(vec![])));
    }
}
