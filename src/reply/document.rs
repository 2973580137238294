//! Typed decoding
//!
//! A [`Document`] describes its wire fields through an explicit [`Schema`]:
//! each binding names a field, its kind, and a setter. Decoding looks each
//! declared name up in the row and parses the text best-effort; values that
//! do not parse are skipped and the field keeps its default.
//!
//! ```
//! use ftquery::reply::{Document, Schema};
//!
//! #[derive(Default)]
//! struct Order {
//!     status: String,
//!     qty: i64,
//! }
//!
//! impl Document for Order {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .text("@status", |o, v| o.status = v)
//!             .integer("qty", |o, v| o.qty = v)
//!     }
//! }
//! ```

use dashmap::DashMap;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use super::decode::{decode_rows, DecodeError, Row};
use super::value::Reply;
use crate::query::FIELD_SIGIL;

/// Target kind of a document field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
}

/// Wire name and kind of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMeta {
    pub name: String,
    pub kind: FieldKind,
}

enum Setter<T> {
    Text(fn(&mut T, String)),
    Integer(fn(&mut T, i64)),
    Float(fn(&mut T, f64)),
    Boolean(fn(&mut T, bool)),
}

impl<T> Setter<T> {
    fn kind(&self) -> FieldKind {
        match self {
            Setter::Text(_) => FieldKind::String,
            Setter::Integer(_) => FieldKind::Integer,
            Setter::Float(_) => FieldKind::Float,
            Setter::Boolean(_) => FieldKind::Boolean,
        }
    }
}

struct FieldBinding<T> {
    meta: FieldMeta,
    setter: Setter<T>,
}

/// Field bindings for a document type
pub struct Schema<T> {
    fields: Vec<FieldBinding<T>>,
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn text(self, name: &str, set: fn(&mut T, String)) -> Self {
        self.bind(name, Setter::Text(set))
    }

    pub fn integer(self, name: &str, set: fn(&mut T, i64)) -> Self {
        self.bind(name, Setter::Integer(set))
    }

    pub fn float(self, name: &str, set: fn(&mut T, f64)) -> Self {
        self.bind(name, Setter::Float(set))
    }

    pub fn boolean(self, name: &str, set: fn(&mut T, bool)) -> Self {
        self.bind(name, Setter::Boolean(set))
    }

    fn bind(mut self, name: &str, setter: Setter<T>) -> Self {
        let meta = FieldMeta {
            name: name.trim_start_matches(FIELD_SIGIL).to_string(),
            kind: setter.kind(),
        };
        self.fields.push(FieldBinding { meta, setter });
        self
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().map(|binding| &binding.meta)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy every declared field present in `row` into `target`
    pub fn apply(&self, target: &mut T, row: &Row) {
        for binding in &self.fields {
            let Some(raw) = row.get(&binding.meta.name) else {
                continue;
            };
            let applied = match &binding.setter {
                Setter::Text(set) => {
                    set(target, raw.clone());
                    true
                }
                Setter::Integer(set) => match raw.trim().parse::<i64>() {
                    Ok(v) => {
                        set(target, v);
                        true
                    }
                    Err(_) => false,
                },
                Setter::Float(set) => match raw.trim().parse::<f64>() {
                    Ok(v) => {
                        set(target, v);
                        true
                    }
                    Err(_) => false,
                },
                Setter::Boolean(set) => match parse_bool(raw) {
                    Some(v) => {
                        set(target, v);
                        true
                    }
                    None => false,
                },
            };
            if !applied {
                tracing::trace!(
                    field = %binding.meta.name,
                    kind = ?binding.meta.kind,
                    value = %raw,
                    "skipping unparsable field"
                );
            }
        }
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A type that can be filled from a decoded row
pub trait Document: Default + Send + Sync + 'static {
    /// Field bindings. Called once per type; the result is cached.
    fn schema() -> Schema<Self>;
}

type SchemaCache = DashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static SCHEMAS: OnceLock<SchemaCache> = OnceLock::new();

/// Cached schema for `T`, built on first use.
///
/// Concurrent first calls may each build the schema; the first insert wins
/// and every caller gets an identical value.
pub fn schema_of<T: Document>() -> Arc<Schema<T>> {
    let cache = SCHEMAS.get_or_init(DashMap::new);
    let id = TypeId::of::<T>();

    let cached = cache.get(&id).map(|entry| Arc::clone(entry.value()));
    let erased = match cached {
        Some(erased) => erased,
        None => {
            // Built outside the entry lock: a schema may look up other schemas.
            let built: Arc<dyn Any + Send + Sync> = Arc::new(T::schema());
            Arc::clone(cache.entry(id).or_insert(built).value())
        }
    };

    erased
        .downcast::<Schema<T>>()
        .unwrap_or_else(|_| Arc::new(T::schema()))
}

/// Fill a fresh `T` from a row
pub fn from_row<T: Document>(row: &Row) -> T {
    let mut doc = T::default();
    schema_of::<T>().apply(&mut doc, row);
    doc
}

/// Decode a reply straight into documents
pub fn decode_documents<T: Document>(reply: &Reply) -> Result<Vec<T>, DecodeError> {
    let rows = decode_rows(reply)?;
    let schema = schema_of::<T>();
    Ok(rows
        .iter()
        .map(|row| {
            let mut doc = T::default();
            schema.apply(&mut doc, row);
            doc
        })
        .collect())
}
