use serde::{Deserialize, Serialize};

use super::expr::{field_ref, FIELD_SIGIL};

/// A GROUPBY key: a field or a raw expression, with an optional alias.
///
/// Without an alias the reference is emitted straight into the GROUPBY
/// clause. With an alias the aggregate builder first projects the reference
/// with `APPLY <reference> AS <alias>` and then groups by `@<alias>`, so
/// expression keys such as `floor(@created_ts/86400)` become groupable.
///
/// When read from JSON, a `reference` that is a bare field name gets its `@`
/// like [`GroupKey::by`]; anything else is kept raw like [`GroupKey::by_expr`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GroupKeyRepr")]
pub struct GroupKey {
    reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
}

impl GroupKey {
    /// Group by a field; the field reference gets its `@` if missing
    pub fn by(field: impl AsRef<str>) -> Self {
        Self {
            reference: field_ref(field.as_ref()),
            alias: None,
        }
    }

    /// Group by a raw expression, emitted as-is
    pub fn by_expr(expr: impl Into<String>) -> Self {
        Self {
            reference: expr.into(),
            alias: None,
        }
    }

    /// Name the output column for this key
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let alias = alias.trim_start_matches(FIELD_SIGIL).to_string();
        self.alias = Some(alias);
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// What goes into the GROUPBY clause
    pub fn group_ref(&self) -> String {
        match &self.alias {
            Some(alias) => field_ref(alias),
            None => self.reference.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GroupKeyRepr {
    reference: String,
    #[serde(default)]
    alias: Option<String>,
}

impl From<GroupKeyRepr> for GroupKey {
    fn from(repr: GroupKeyRepr) -> Self {
        let key = if is_bare_field(&repr.reference) {
            GroupKey::by(&repr.reference)
        } else {
            GroupKey::by_expr(repr.reference)
        };
        match repr.alias {
            Some(alias) => key.alias(alias),
            None => key,
        }
    }
}

fn is_bare_field(reference: &str) -> bool {
    !reference.is_empty()
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl From<&str> for GroupKey {
    fn from(field: &str) -> Self {
        GroupKey::by(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_normalizes_field() {
        assert_eq!(GroupKey::by("warehouse_id").reference(), "@warehouse_id");
        assert_eq!(GroupKey::by("@status").reference(), "@status");
    }

    #[test]
    fn test_by_expr_is_raw() {
        let key = GroupKey::by_expr("floor(@created_ts/86400)");
        assert_eq!(key.reference(), "floor(@created_ts/86400)");
        assert_eq!(key.group_ref(), "floor(@created_ts/86400)");
    }

    #[test]
    fn test_json_bare_field_gets_sigil() {
        let key: GroupKey =
            serde_json::from_value(serde_json::json!({"reference": "warehouse_id"})).unwrap();
        assert_eq!(key, GroupKey::by("warehouse_id"));
        assert_eq!(key.group_ref(), "@warehouse_id");

        let key: GroupKey =
            serde_json::from_value(serde_json::json!({"reference": "@status"})).unwrap();
        assert_eq!(key.reference(), "@status");
    }

    #[test]
    fn test_json_expression_kept_raw() {
        let key: GroupKey = serde_json::from_value(serde_json::json!({
            "reference": "floor(@created_ts/86400)",
            "alias": "@day"
        }))
        .unwrap();
        assert_eq!(key.reference(), "floor(@created_ts/86400)");
        assert_eq!(key.alias_name(), Some("day"));
    }

    #[test]
    fn test_alias_changes_group_ref() {
        let key = GroupKey::by_expr("floor(@created_ts/86400)").alias("day");
        assert_eq!(key.alias_name(), Some("day"));
        assert_eq!(key.group_ref(), "@day");

        let key = GroupKey::by("status").alias("@state");
        assert_eq!(key.alias_name(), Some("state"));
    }
}
