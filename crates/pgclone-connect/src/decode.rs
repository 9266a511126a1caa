//! Driver adapter: runs statements on a pooled connection and turns
//! result rows into [`Row`] values.
//!
//! Statements go through the simple-query protocol, so every value arrives
//! in its server text form and only the column type decides how it is
//! tagged.

use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row as _, TypeInfo, ValueRef};

use pgclone_core::{Row, RowValue};

/// Run `sql` and collect its rows. The pool acquires a connection for this
/// one call and takes it back when the call returns, on both paths.
pub(crate) async fn fetch_rows(pool: &PgPool, sql: &str) -> Result<Vec<Row>, sqlx::Error> {
    let rows = sqlx::raw_sql(sql).fetch_all(pool).await?;
    Ok(rows.iter().map(decode_row).collect())
}

pub(crate) async fn run_statement(pool: &PgPool, sql: &str) -> Result<u64, sqlx::Error> {
    let done = sqlx::raw_sql(sql).execute(pool).await?;
    Ok(done.rows_affected())
}

fn decode_row(row: &PgRow) -> Row {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let is_null = row
            .try_get_raw(idx)
            .map(|value| value.is_null())
            .unwrap_or(true);
        let value = if is_null {
            RowValue::Null
        } else {
            match row.try_get_unchecked::<String, _>(idx) {
                Ok(text) => classify(column.type_info().name(), text),
                Err(err) => {
                    tracing::warn!(
                        event = "value_decode_failed",
                        column = column.name(),
                        error = %err
                    );
                    RowValue::Null
                }
            }
        };
        out.push(column.name(), value);
    }
    out
}

/// Tag a text-form value by its Postgres type name.
pub(crate) fn classify(type_name: &str, text: String) -> RowValue {
    match type_name {
        "INT2" | "INT4" | "INT8" | "OID" | "FLOAT4" | "FLOAT8" | "NUMERIC" => {
            if matches!(text.as_str(), "NaN" | "Infinity" | "-Infinity") {
                RowValue::Text(text)
            } else {
                RowValue::Number(text)
            }
        }
        "BOOL" => RowValue::Bool(text == "t"),
        _ => RowValue::Text(text),
    }
}
