use pgclone_connect::Database;
use pgclone_core::{Result, Row, render_literal};

const PROGRESS_EVERY: usize = 1_000;

pub fn select_all(schema: &str, object: &str) -> String {
    format!("SELECT * FROM {schema}.{object};")
}

/// One `INSERT` for `row`. Columns the row does not carry are written as
/// `NULL`.
pub fn insert_statement(schema: &str, object: &str, columns: &[&str], row: &Row) -> String {
    let values: Vec<String> = columns
        .iter()
        .map(|column| {
            row.get(column)
                .map(render_literal)
                .unwrap_or_else(|| "NULL".to_string())
        })
        .collect();
    format!(
        "INSERT INTO {schema}.{object} ({}) VALUES ({});",
        columns.join(", "),
        values.join(", ")
    )
}

/// Copy every row of `schema.object` from `source` into the same-named
/// relation on `target`, one statement per row in source order.
///
/// The column list comes from the first row. A failing `INSERT` is logged by
/// the target and the loop moves on. Returns the number of statements
/// issued.
pub async fn copy_rows(
    source: &dyn Database,
    target: &dyn Database,
    schema: &str,
    object: &str,
) -> Result<usize> {
    let rows = source
        .query(&select_all(schema, object))
        .await?
        .unwrap_or_default();
    let object_name = format!("{schema}.{object}");

    let Some(first) = rows.first() else {
        tracing::info!(event = "copy_skipped", object = %object_name, reason = "no rows");
        return Ok(0);
    };
    let columns: Vec<&str> = first.column_names().collect();

    for (idx, row) in rows.iter().enumerate() {
        target
            .execute(&insert_statement(schema, object, &columns, row))
            .await?;
        if (idx + 1) % PROGRESS_EVERY == 0 {
            tracing::debug!(event = "copy_progress", object = %object_name, rows = idx + 1);
        }
    }

    tracing::info!(event = "rows_copied", object = %object_name, rows = rows.len());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use pgclone_core::RowValue;

    use super::*;

    #[test]
    fn insert_renders_each_value_kind() {
        let row = Row::new()
            .with("id", RowValue::number(1))
            .with("name", RowValue::text("a'b"))
            .with("note", RowValue::Null)
            .with("legacy", RowValue::text("None"))
            .with("active", RowValue::Bool(false));
        let columns: Vec<&str> = row.column_names().collect();

        assert_eq!(
            insert_statement("public", "test", &columns, &row),
            "INSERT INTO public.test (id, name, note, legacy, active) VALUES (1, 'a''b', NULL, NULL, FALSE);"
        );
    }

    #[test]
    fn missing_column_becomes_null() {
        let row = Row::new().with("id", RowValue::number(7));
        assert_eq!(
            insert_statement("s", "t", &["id", "name"], &row),
            "INSERT INTO s.t (id, name) VALUES (7, NULL);"
        );
    }
}
