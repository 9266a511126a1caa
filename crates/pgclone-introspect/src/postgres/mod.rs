use pgclone_connect::Database;
use pgclone_core::{Error, ObjectKind, Result};

use crate::adapter::Introspector;

mod mapper;
mod queries;

pub use queries::probe_view_name;

/// Introspector for PostgreSQL catalogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresIntrospector;

impl PostgresIntrospector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Introspector for PostgresIntrospector {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn generate_create_table(
        &self,
        db: &dyn Database,
        schema: &str,
        table: &str,
    ) -> Result<String> {
        generate_create_table(db, schema, table).await
    }

    async fn generate_create_materialized_view(
        &self,
        db: &dyn Database,
        schema: &str,
        view: &str,
    ) -> Result<String> {
        generate_create_materialized_view(db, schema, view).await
    }

    async fn generate_create_table_from_materialized_view(
        &self,
        db: &dyn Database,
        schema: &str,
        view: &str,
    ) -> Result<String> {
        generate_create_table_from_materialized_view(db, schema, view).await
    }
}

/// Build `CREATE TABLE` from the table's catalog columns. Only ordinary
/// tables qualify; a view of the same name is reported as not found.
pub async fn generate_create_table(db: &dyn Database, schema: &str, table: &str) -> Result<String> {
    let columns = db.describe_table_columns(schema, table).await?;
    if columns.is_empty() {
        return Err(Error::not_found(ObjectKind::Table, schema, table));
    }
    tracing::debug!(
        event = "table_described",
        object = %format!("{schema}.{table}"),
        columns = columns.len()
    );
    Ok(mapper::create_table_statement(schema, table, &columns))
}

/// Wrap the recorded definition of a materialized view.
pub async fn generate_create_materialized_view(
    db: &dyn Database,
    schema: &str,
    view: &str,
) -> Result<String> {
    let definition = fetch_definition(db, schema, view).await?;
    Ok(mapper::create_materialized_view_statement(
        schema,
        view,
        &definition,
    ))
}

/// Build `CREATE TABLE` for a materialized view.
///
/// Materialized views are missing from `information_schema.columns`, so the
/// definition is installed as a plain probe view next to it, the probe's
/// columns are read, and the probe is dropped again. The drop is issued
/// exactly once whatever the outcome of the column lookup.
pub async fn generate_create_table_from_materialized_view(
    db: &dyn Database,
    schema: &str,
    view: &str,
) -> Result<String> {
    let definition = fetch_definition(db, schema, view).await?;
    let probe = queries::probe_view_name(view);
    let object = format!("{schema}.{view}");

    let created = db
        .execute(&queries::create_probe_view(schema, &probe, &definition))
        .await;
    let described = match created {
        Ok(()) => {
            tracing::debug!(event = "probe_created", object = %object, probe = %probe);
            db.describe_columns(schema, &probe).await
        }
        Err(err) => Err(err),
    };

    let dropped = db.execute(&queries::drop_probe_view(schema, &probe)).await;
    tracing::debug!(event = "probe_dropped", object = %object, probe = %probe);

    let columns = described?;
    dropped?;

    if columns.is_empty() {
        return Err(Error::StructureAnalysis {
            schema: schema.to_string(),
            name: view.to_string(),
        });
    }
    Ok(mapper::create_table_statement(schema, view, &columns))
}

async fn fetch_definition(db: &dyn Database, schema: &str, view: &str) -> Result<String> {
    let rows = db.query(&queries::matview_definition(schema, view)).await?;
    mapper::definition_from_rows(rows)
        .ok_or_else(|| Error::not_found(ObjectKind::MaterializedView, schema, view))
}
