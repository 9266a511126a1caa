use async_trait::async_trait;

use pgclone_core::{ColumnDescriptor, Result, Row, quote_literal};

/// Statement-level access to one database.
///
/// `query` and `execute` only fail on connection problems. A statement that
/// errors is logged by the implementation and reported as `Ok(None)` (for
/// `query`) or silently completes (for `execute`).
#[async_trait]
pub trait Database: Send + Sync {
    /// Label used in log lines (`source`, `target`).
    fn role(&self) -> &str;

    async fn query(&self, sql: &str) -> Result<Option<Vec<Row>>>;

    async fn execute(&self, sql: &str) -> Result<()>;

    /// Columns of one relation in ordinal order. Empty when the relation is
    /// unknown or the catalog query failed.
    async fn describe_columns(&self, schema: &str, relation: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows = self
            .query(&describe_columns_sql(schema, relation))
            .await?
            .unwrap_or_default();
        Ok(rows.iter().filter_map(column_from_row).collect())
    }

    /// Like [`Database::describe_columns`], restricted to ordinary tables.
    /// Views and materialized views come back empty.
    async fn describe_table_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>> {
        let rows = self
            .query(&describe_table_columns_sql(schema, table))
            .await?
            .unwrap_or_default();
        Ok(rows.iter().filter_map(column_from_row).collect())
    }
}

/// Catalog query behind [`Database::describe_columns`].
pub fn describe_columns_sql(schema: &str, relation: &str) -> String {
    format!(
        "SELECT column_name, data_type, udt_name, character_maximum_length, \
         numeric_precision, numeric_scale, is_nullable \
         FROM information_schema.columns \
         WHERE table_schema = {} AND table_name = {} \
         ORDER BY ordinal_position;",
        quote_literal(schema),
        quote_literal(relation)
    )
}

/// Catalog query behind [`Database::describe_table_columns`].
pub fn describe_table_columns_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT c.column_name, c.data_type, c.udt_name, c.character_maximum_length, \
         c.numeric_precision, c.numeric_scale, c.is_nullable \
         FROM information_schema.columns c \
         JOIN pg_tables t ON t.schemaname = c.table_schema AND t.tablename = c.table_name \
         WHERE c.table_schema = {} AND c.table_name = {} \
         ORDER BY c.ordinal_position;",
        quote_literal(schema),
        quote_literal(table)
    )
}

/// Map one `information_schema.columns` row. Rows without a name or type
/// are skipped.
pub fn column_from_row(row: &Row) -> Option<ColumnDescriptor> {
    let int = |column: &str| row.get_str(column).and_then(|value| value.trim().parse().ok());
    Some(ColumnDescriptor {
        name: row.get_str("column_name")?.to_string(),
        data_type: row.get_str("data_type")?.to_string(),
        udt_name: row.get_str("udt_name").map(str::to_string),
        character_max_length: int("character_maximum_length"),
        numeric_precision: int("numeric_precision"),
        numeric_scale: int("numeric_scale"),
        is_nullable: !matches!(row.get_str("is_nullable"), Some("NO")),
    })
}
