//! Query string compiler
//!
//! All node writers live here so every node shares the same formatting
//! rules. Compilation is total: every constructible [`Expr`] has exactly one
//! compiled form and nothing here can fail.
//!
//! Values are written verbatim. Characters with meaning in the query syntax
//! (`{`, `}`, `|`, `(`, `)`) are not escaped; callers passing user input are
//! responsible for sanitizing it.

use std::fmt::Write;

use super::expr::{Expr, Scalar, FIELD_SIGIL};
use super::pool::PooledBuffer;

/// Compile an expression into the engine's query syntax
pub fn compile(expr: &Expr) -> String {
    let mut buf = PooledBuffer::acquire();
    write_expr(&mut buf, expr);
    buf.to_owned_string()
}

/// Query argument for a builder: `*` for no filter or the match-all
/// sentinel, otherwise the compiled filter wrapped in one outer group
pub fn query_string(filter: Option<&Expr>) -> String {
    match filter {
        None | Some(Expr::MatchAll) => "*".to_string(),
        Some(expr) => {
            let mut buf = PooledBuffer::acquire();
            buf.push('(');
            write_expr(&mut buf, expr);
            buf.push(')');
            buf.to_owned_string()
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Eq { field, value } => {
            write_field(out, field);
            out.push_str(":{");
            write_scalar(out, value);
            out.push('}');
        }
        Expr::In { field, values } => {
            write_field(out, field);
            out.push_str(":{");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                write_scalar(out, value);
            }
            out.push('}');
        }
        Expr::Range {
            field,
            low,
            high,
            inclusive,
        } => {
            let (open, close) = if *inclusive { ('[', ']') } else { ('(', ')') };
            write_field(out, field);
            out.push(':');
            out.push(open);
            write_scalar(out, low);
            out.push(' ');
            write_scalar(out, high);
            out.push(close);
        }
        Expr::And { exprs } => write_group(out, exprs, " "),
        Expr::Or { exprs } => write_group(out, exprs, "|"),
        Expr::Not { expr } => {
            out.push_str("-(");
            write_expr(out, expr);
            out.push(')');
        }
        Expr::MatchAll => out.push('*'),
    }
}

/// `(a b)` / `(a|b)`
fn write_group(out: &mut String, exprs: &[Expr], sep: &str) {
    out.push('(');
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_expr(out, expr);
    }
    out.push(')');
}

fn write_field(out: &mut String, field: &str) {
    if !field.starts_with(FIELD_SIGIL) {
        out.push(FIELD_SIGIL);
    }
    out.push_str(field);
}

fn write_scalar(out: &mut String, value: &Scalar) {
    match value {
        Scalar::Str(s) => out.push_str(s),
        // Writing into a String never fails.
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}
