use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One table or materialized view to copy.
///
/// `is_view = true` marks a materialized view that is copied into the target
/// as a plain table holding a snapshot of its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationEntry {
    pub schema: String,
    #[serde(alias = "name")]
    pub object_name: String,
    #[serde(default)]
    pub is_view: bool,
}

impl DuplicationEntry {
    pub fn table(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            object_name: name.into(),
            is_view: false,
        }
    }

    pub fn materialized_view(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            object_name: name.into(),
            is_view: true,
        }
    }

    /// `schema.object`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.object_name)
    }
}

/// Ordered list of objects to duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationPlan {
    #[serde(default)]
    pub entries: Vec<DuplicationEntry>,
}

impl DuplicationPlan {
    pub fn new(entries: Vec<DuplicationEntry>) -> Self {
        Self { entries }
    }

    /// Parse a plan from TOML (`[[entries]]` tables) and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let plan: DuplicationPlan =
            toml::from_str(content).map_err(|err| Error::Config(format!("plan: {err}")))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Names are spliced into generated SQL unquoted, so only plain
    /// identifiers are accepted.
    pub fn validate(&self) -> Result<()> {
        for (idx, entry) in self.entries.iter().enumerate() {
            for (field, value) in [("schema", &entry.schema), ("name", &entry.object_name)] {
                if !is_plain_identifier(value) {
                    return Err(Error::Config(format!(
                        "plan entry {idx}: {field} {value:?} is not a plain identifier"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lower-case letters, digits, `_` and `$`, not starting with a digit or
/// `$`. These are the names that keep their spelling when spliced into SQL
/// unquoted; anything upper-case would be folded onto another relation.
pub fn is_plain_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if (first.is_alphabetic() && !first.is_uppercase()) || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| (ch.is_alphanumeric() && !ch.is_uppercase()) || ch == '_' || ch == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plan_with_defaults() {
        let plan = DuplicationPlan::from_toml_str(
            r#"
            [[entries]]
            schema = "public"
            name = "users"

            [[entries]]
            schema = "analytics"
            object_name = "mv_stats"
            is_view = true
            "#,
        )
        .expect("parse plan");

        assert_eq!(
            plan.entries,
            vec![
                DuplicationEntry::table("public", "users"),
                DuplicationEntry::materialized_view("analytics", "mv_stats"),
            ]
        );
    }

    #[test]
    fn rejects_names_that_are_not_identifiers() {
        let err = DuplicationPlan::from_toml_str(
            r#"
            [[entries]]
            schema = "public"
            name = "users; drop table x"
            "#,
        )
        .expect_err("should reject");
        assert!(err.to_string().contains("plan entry 0: name"));
    }

    #[test]
    fn rejects_mixed_case_names_that_would_fold_onto_another_table() {
        let err = DuplicationPlan::from_toml_str(
            r#"
            [[entries]]
            schema = "public"
            name = "Users"
            "#,
        )
        .expect_err("mixed case is ambiguous unquoted");
        assert!(err.to_string().contains("\"Users\" is not a plain identifier"));

        let err = DuplicationPlan::from_toml_str(
            r#"
            [[entries]]
            schema = "Sales"
            name = "orders"
            "#,
        )
        .expect_err("schema is checked too");
        assert!(err.to_string().contains("plan entry 0: schema"));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_plain_identifier("_tmp$1"));
        assert!(is_plain_identifier("users"));
        assert!(!is_plain_identifier("Users"));
        assert!(!is_plain_identifier("orderItems"));
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("1abc"));
        assert!(!is_plain_identifier("a.b"));
    }
}
