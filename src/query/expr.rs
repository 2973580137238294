//! Filter expression AST
//!
//! Expressions are plain owned values. They know nothing about the wire
//! protocol beyond "compile me"; the grammar itself lives in `compile.rs` so
//! every node shares the same formatting rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::compile;

/// Marker the engine expects in front of every field reference
pub const FIELD_SIGIL: char = '@';

/// A scalar carried by a leaf predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::UInt(_) => "uint",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
        }
    }

    /// Positive infinity, spelled the way numeric ranges expect it
    pub fn pos_inf() -> Self {
        Scalar::Float(f64::INFINITY)
    }

    /// Negative infinity
    pub fn neg_inf() -> Self {
        Scalar::Float(f64::NEG_INFINITY)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::UInt(u) => write!(f, "{}", u),
            Scalar::Float(v) if v.is_infinite() => {
                f.write_str(if v.is_sign_positive() { "+inf" } else { "-inf" })
            }
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::Str(s.clone())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v as f64)
    }
}

macro_rules! scalar_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::Int(v as i64)
            }
        })*
    };
}

macro_rules! scalar_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::UInt(v as u64)
            }
        })*
    };
}

scalar_from_signed!(i8, i16, i32, i64, isize);
scalar_from_unsigned!(u8, u16, u32, u64, usize);

/// A filter expression.
///
/// Built through the constructors below and consumed by the command
/// builders. Serializable so filters can be stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// `@field:{value}`
    Eq { field: String, value: Scalar },
    /// `@field:{v1|v2|...}`
    In { field: String, values: Vec<Scalar> },
    /// `@field:[lo hi]` or `@field:(lo hi)`
    Range {
        field: String,
        low: Scalar,
        high: Scalar,
        inclusive: bool,
    },
    /// Implicit conjunction: `(a b ...)`
    And { exprs: Vec<Expr> },
    /// `(a|b|...)`
    Or { exprs: Vec<Expr> },
    /// `-(x)`
    Not { expr: Box<Expr> },
    /// `*`
    MatchAll,
}

impl Expr {
    /// Equality on a tag field
    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Expr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Set membership on a tag field.
    ///
    /// An empty value list compiles to `@field:{}`, which the engine treats
    /// as matching nothing. The literal form is kept rather than rejected so
    /// that dynamically built filters stay total.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Expr::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Numeric range; `inclusive` applies to both bounds
    pub fn range(
        field: impl Into<String>,
        low: impl Into<Scalar>,
        high: impl Into<Scalar>,
        inclusive: bool,
    ) -> Self {
        Expr::Range {
            field: field.into(),
            low: low.into(),
            high: high.into(),
            inclusive,
        }
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::range(field, value, Scalar::pos_inf(), false)
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::range(field, value, Scalar::pos_inf(), true)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::range(field, Scalar::neg_inf(), value, false)
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::range(field, Scalar::neg_inf(), value, true)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And {
            exprs: exprs.into_iter().collect(),
        }
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or {
            exprs: exprs.into_iter().collect(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not {
            expr: Box::new(expr),
        }
    }

    pub fn match_all() -> Self {
        Expr::MatchAll
    }

    /// True for the `*` sentinel
    pub fn is_match_all(&self) -> bool {
        matches!(self, Expr::MatchAll)
    }

    /// Compile into the engine's query syntax
    pub fn compile(&self) -> String {
        compile::compile(self)
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::MatchAll
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

/// Prefix a field with the sigil unless it already carries one
pub fn field_ref(field: &str) -> String {
    if field.starts_with(FIELD_SIGIL) {
        field.to_string()
    } else {
        format!("{}{}", FIELD_SIGIL, field)
    }
}
