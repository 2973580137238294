//! Reply decoding
//!
//! Two wire shapes are accepted:
//!
//! - legacy arrays: `[count, id, [k, v, ...], id, [k, v, ...], ...]`. Ids
//!   and payloads alternate strictly; aggregate replies omit the ids and
//!   carry payloads only. Every payload slot must hold an array or a map.
//! - keyed maps: `{"results": [{"extra_attributes": {...}}, ...]}`. Each
//!   result yields its `extra_attributes`, else its `values`, else itself.
//!
//! Every value becomes its trimmed text. Decoding is all-or-nothing.

use std::collections::HashMap;

use super::value::Reply;

/// One decoded record: field name to textual value
pub type Row = HashMap<String, String>;

const RESULTS_KEY: &str = "results";
const TOTAL_KEY: &str = "total_results";
const EXTRA_ATTRIBUTES_KEY: &str = "extra_attributes";
const VALUES_KEY: &str = "values";

/// Rows decoded from one reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub rows: Vec<Row>,
    /// Match count the engine reported, if the reply carried one. It can be
    /// larger than `rows.len()` when LIMIT truncated the page.
    pub reported_total: Option<i64>,
}

impl Decoded {
    /// Number of rows actually present in the reply
    pub fn total(&self) -> usize {
        self.rows.len()
    }
}

/// A reply shape after top-level normalization
enum Shape<'a> {
    Legacy(&'a [Reply]),
    Keyed(Vec<(String, &'a Reply)>),
}

/// Decode a reply into rows
pub fn decode_rows(reply: &Reply) -> Result<Vec<Row>, DecodeError> {
    decode_reply(reply).map(|decoded| decoded.rows)
}

/// Decode a reply into rows plus the engine-reported total
pub fn decode_reply(reply: &Reply) -> Result<Decoded, DecodeError> {
    let shape = normalize(reply)?;
    let (hits, reported_total) = extract_hits(&shape)?;

    let rows = hits
        .into_iter()
        .map(payload_to_row)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::trace!(rows = rows.len(), reported_total = ?reported_total, "decoded reply");
    Ok(Decoded {
        rows,
        reported_total,
    })
}

fn normalize(reply: &Reply) -> Result<Shape<'_>, DecodeError> {
    match reply {
        Reply::Array(items) => Ok(Shape::Legacy(items)),
        Reply::Map(entries) => Ok(Shape::Keyed(string_keyed(entries))),
        other => Err(DecodeError::UnsupportedReply(other.kind())),
    }
}

fn string_keyed(entries: &[(Reply, Reply)]) -> Vec<(String, &Reply)> {
    entries.iter().map(|(k, v)| (k.to_text(), v)).collect()
}

fn lookup<'a>(entries: &[(String, &'a Reply)], key: &str) -> Option<&'a Reply> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
}

fn extract_hits<'a>(shape: &Shape<'a>) -> Result<(Vec<&'a Reply>, Option<i64>), DecodeError> {
    match shape {
        Shape::Keyed(top) => {
            let results = match lookup(top, RESULTS_KEY) {
                Some(Reply::Array(results)) => results,
                _ => return Err(DecodeError::MissingResults),
            };

            let mut hits = Vec::with_capacity(results.len());
            for result in results {
                let Reply::Map(entries) = result else {
                    return Err(DecodeError::UnknownHit(result.kind()));
                };
                let hit = string_keyed(entries);
                let payload = lookup(&hit, EXTRA_ATTRIBUTES_KEY)
                    .or_else(|| lookup(&hit, VALUES_KEY))
                    .unwrap_or(result);
                hits.push(payload);
            }

            let reported = lookup(top, TOTAL_KEY).and_then(Reply::as_i64);
            Ok((hits, reported))
        }
        Shape::Legacy(items) => {
            let items: &'a [Reply] = *items;
            let Some((first, rest)) = items.split_first() else {
                return Ok((Vec::new(), None));
            };
            let count = first
                .as_i64()
                .ok_or(DecodeError::MissingCount(first.kind()))?;

            Ok((legacy_payloads(rest)?, Some(count)))
        }
    }
}

/// Payload slots of a legacy reply body (everything after the count).
///
/// Search replies alternate `id, payload`; aggregate replies are payloads
/// only. The layout is picked from the first element and then enforced
/// positionally, so a scalar in a payload slot is an error.
fn legacy_payloads(body: &[Reply]) -> Result<Vec<&Reply>, DecodeError> {
    let Some(first) = body.first() else {
        return Ok(Vec::new());
    };

    if !first.is_scalar() {
        return body.iter().map(expect_payload).collect();
    }

    let mut payloads = Vec::with_capacity(body.len() / 2);
    for pair in body.chunks(2) {
        match pair {
            [id, payload] => {
                if !id.is_scalar() {
                    return Err(DecodeError::ExpectedDocId(id.kind()));
                }
                payloads.push(expect_payload(payload)?);
            }
            [id] => return Err(DecodeError::MissingPayload(id.to_text())),
            _ => {}
        }
    }
    Ok(payloads)
}

fn expect_payload(payload: &Reply) -> Result<&Reply, DecodeError> {
    if payload.is_scalar() {
        Err(DecodeError::UnsupportedPayload(payload.kind()))
    } else {
        Ok(payload)
    }
}

fn payload_to_row(payload: &Reply) -> Result<Row, DecodeError> {
    match payload {
        Reply::Array(items) => {
            let mut row = Row::with_capacity(items.len() / 2);
            for pair in items.chunks(2) {
                match pair {
                    [key, value] => {
                        row.insert(key.to_text(), value.to_text());
                    }
                    _ => return Err(DecodeError::UnpairedField(pair[0].to_text())),
                }
            }
            Ok(row)
        }
        Reply::Map(entries) => Ok(entries
            .iter()
            .map(|(k, v)| (k.to_text(), v.to_text()))
            .collect()),
        other => Err(DecodeError::UnsupportedPayload(other.kind())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported reply type: {0}")]
    UnsupportedReply(&'static str),

    #[error("missing results array")]
    MissingResults,

    #[error("unknown hit type: {0}")]
    UnknownHit(&'static str),

    #[error("first array element is not a count (got {0})")]
    MissingCount(&'static str),

    #[error("unsupported field payload type: {0}")]
    UnsupportedPayload(&'static str),

    #[error("field '{0}' has no value")]
    UnpairedField(String),

    #[error("expected a document id, got {0}")]
    ExpectedDocId(&'static str),

    #[error("document '{0}' has no payload")]
    MissingPayload(String),
}
