use pgclone_core::{ColumnDescriptor, Row};

/// Assemble `CREATE TABLE schema.table (col type [NOT NULL], ...);` in the
/// order the columns were given.
pub fn create_table_statement(schema: &str, table: &str, columns: &[ColumnDescriptor]) -> String {
    let definitions: Vec<String> = columns
        .iter()
        .map(ColumnDescriptor::column_definition)
        .collect();
    format!("CREATE TABLE {schema}.{table} ({});", definitions.join(", "))
}

pub fn create_materialized_view_statement(schema: &str, view: &str, definition: &str) -> String {
    format!("CREATE MATERIALIZED VIEW {schema}.{view} AS {definition};")
}

/// Pull the view definition out of a `pg_matviews` lookup, without the
/// trailing semicolon the catalog stores.
pub fn definition_from_rows(rows: Option<Vec<Row>>) -> Option<String> {
    let rows = rows?;
    let definition = rows.first()?.get_str("definition")?;
    let trimmed = definition.trim().trim_end_matches(';').trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use pgclone_core::RowValue;

    use super::*;

    #[test]
    fn create_table_keeps_catalog_order() {
        let columns = vec![
            ColumnDescriptor::new("id", "integer", false),
            ColumnDescriptor::new("name", "character varying", true).with_length(50),
        ];
        assert_eq!(
            create_table_statement("public", "users", &columns),
            "CREATE TABLE public.users (id integer NOT NULL, name character varying(50));"
        );
    }

    #[test]
    fn definition_is_trimmed() {
        let rows = vec![Row::new().with(
            "definition",
            RowValue::text(" SELECT id,\n    cnt\n   FROM t;"),
        )];
        assert_eq!(
            definition_from_rows(Some(rows)).as_deref(),
            Some("SELECT id,\n    cnt\n   FROM t")
        );
    }

    #[test]
    fn missing_definition() {
        assert_eq!(definition_from_rows(None), None);
        assert_eq!(definition_from_rows(Some(Vec::new())), None);
        let rows = vec![Row::new().with("definition", RowValue::Null)];
        assert_eq!(definition_from_rows(Some(rows)), None);
    }
}
