use std::fmt;

/// A single scalar read from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Null,
    Text(String),
    /// Numeric value in its server text form.
    Number(String),
    Bool(bool),
    /// Value rendered verbatim, without quoting.
    Other(String),
}

impl RowValue {
    pub fn text(value: impl Into<String>) -> Self {
        RowValue::Text(value.into())
    }

    pub fn number(value: impl fmt::Display) -> Self {
        RowValue::Number(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }

    /// Text content for `Text`, `Number` and `Other`; `None` for the rest.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RowValue::Text(value) | RowValue::Number(value) | RowValue::Other(value) => {
                Some(value)
            }
            RowValue::Null | RowValue::Bool(_) => None,
        }
    }
}

/// Marker string that older row representations used for NULL.
pub const LEGACY_NULL_MARKER: &str = "None";

/// Render a value as a SQL literal.
///
/// `Text("None")` renders as `NULL`. Rows used to arrive fully stringified
/// and NULLs came through as that marker; the arm is kept so existing data
/// copies the same way.
pub fn render_literal(value: &RowValue) -> String {
    match value {
        RowValue::Null => "NULL".to_string(),
        RowValue::Text(text) if text == LEGACY_NULL_MARKER => "NULL".to_string(),
        RowValue::Text(text) => quote_literal(text),
        RowValue::Number(number) => number.clone(),
        RowValue::Bool(true) => "TRUE".to_string(),
        RowValue::Bool(false) => "FALSE".to_string(),
        RowValue::Other(raw) => raw.clone(),
    }
}

/// Wrap text in single quotes, doubling embedded quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// One result row: column names paired with values, in driver order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, RowValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: RowValue) {
        self.fields.push((column.into(), value));
    }

    pub fn with(mut self, column: impl Into<String>, value: RowValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&RowValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text content of a column, `None` when missing or NULL.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(RowValue::as_str)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(render_literal(&RowValue::text("a'b")), "'a''b'");
        assert_eq!(render_literal(&RowValue::text("a'")), "'a'''");
    }

    #[test]
    fn null_and_legacy_marker_render_null() {
        assert_eq!(render_literal(&RowValue::Null), "NULL");
        assert_eq!(render_literal(&RowValue::text("None")), "NULL");
        assert_eq!(render_literal(&RowValue::text("none")), "'none'");
    }

    #[test]
    fn non_text_values_are_unquoted() {
        assert_eq!(render_literal(&RowValue::number(1)), "1");
        assert_eq!(render_literal(&RowValue::number("3.25")), "3.25");
        assert_eq!(render_literal(&RowValue::Bool(true)), "TRUE");
        assert_eq!(render_literal(&RowValue::Other("now()".into())), "now()");
    }

    #[test]
    fn quote_free_text_round_trips() {
        for input in ["", "plain", "with space", "dbl \"quote\"", "ünïcode", "1"] {
            let rendered = render_literal(&RowValue::text(input));
            let unwrapped = rendered
                .strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
                .expect("quoted literal");
            assert_eq!(unwrapped, input);
        }
    }

    #[test]
    fn row_keeps_column_order() {
        let row = Row::new()
            .with("id", RowValue::number(1))
            .with("name", RowValue::text("ada"));
        let columns: Vec<&str> = row.column_names().collect();
        assert_eq!(columns, vec!["id", "name"]);
        assert_eq!(row.get_str("name"), Some("ada"));
        assert_eq!(row.get_str("missing"), None);
    }
}
