use serde::Serialize;

use pgclone_connect::Database;
use pgclone_core::{DuplicationEntry, Result};
use pgclone_introspect::{Introspector, PostgresIntrospector};

use crate::migrate::copy_rows;

/// How an object ended up in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyKind {
    Table,
    MaterializedViewAsTable,
}

impl CopyKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::MaterializedViewAsTable => "materialized view as table",
        }
    }
}

/// Outcome of one completed plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    pub schema: String,
    pub object_name: String,
    pub kind: CopyKind,
    /// `INSERT` statements issued; failed inserts are included.
    pub rows_copied: usize,
}

/// Entries completed by a [`Duplicator::duplicate`] run, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicationReport {
    pub entries: Vec<EntryOutcome>,
}

impl DuplicationReport {
    pub fn total_rows(&self) -> usize {
        self.entries.iter().map(|entry| entry.rows_copied).sum()
    }
}

/// Drives table and materialized view copies from a source to a target.
///
/// Entries run one after another. The first structural error (missing
/// object, unreadable view structure, lost connection) stops the run and
/// later entries are not touched; per-row insert failures do not.
#[derive(Debug, Clone, Default)]
pub struct Duplicator<I = PostgresIntrospector> {
    introspector: I,
}

impl Duplicator<PostgresIntrospector> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: Introspector> Duplicator<I> {
    pub fn with_introspector(introspector: I) -> Self {
        Self { introspector }
    }

    /// Copy every entry of `plan` from `source` into `target`.
    pub async fn duplicate(
        &self,
        source: &dyn Database,
        target: &dyn Database,
        plan: &[DuplicationEntry],
    ) -> Result<DuplicationReport> {
        let mut report = DuplicationReport::default();

        for (position, entry) in plan.iter().enumerate() {
            let object = entry.qualified_name();
            tracing::info!(
                event = "entry_started",
                object = %object,
                is_view = entry.is_view,
                position = position + 1,
                total = plan.len()
            );

            let outcome = if entry.is_view {
                self.copy_materialized_view_as_table(
                    source,
                    target,
                    &entry.schema,
                    &entry.object_name,
                )
                .await
            } else {
                self.copy_table(source, target, &entry.schema, &entry.object_name)
                    .await
            };

            match outcome {
                Ok(outcome) => report.entries.push(outcome),
                Err(err) => {
                    tracing::error!(
                        event = "entry_failed",
                        object = %object,
                        skipped = plan.len() - position - 1,
                        error = %err
                    );
                    return Err(err);
                }
            }
        }

        tracing::info!(
            event = "duplication_finished",
            entries = report.entries.len(),
            rows = report.total_rows()
        );
        Ok(report)
    }

    /// Recreate a table in the target and copy its rows.
    pub async fn copy_table(
        &self,
        source: &dyn Database,
        target: &dyn Database,
        schema: &str,
        table: &str,
    ) -> Result<EntryOutcome> {
        let ddl = self
            .introspector
            .generate_create_table(source, schema, table)
            .await?;
        create_table(target, schema, table, &ddl).await?;
        let rows_copied = copy_rows(source, target, schema, table).await?;

        tracing::info!(event = "table_copied", object = %format!("{schema}.{table}"), rows = rows_copied);
        Ok(EntryOutcome {
            schema: schema.to_string(),
            object_name: table.to_string(),
            kind: CopyKind::Table,
            rows_copied,
        })
    }

    /// Copy a materialized view as a live materialized view, populated by a
    /// refresh on the target.
    pub async fn copy_materialized_view(
        &self,
        source: &dyn Database,
        target: &dyn Database,
        schema: &str,
        view: &str,
    ) -> Result<()> {
        let ddl = self
            .introspector
            .generate_create_materialized_view(source, schema, view)
            .await?;
        create_materialized_view(target, schema, view, &ddl).await?;
        refresh_materialized_view(target, schema, view).await?;

        tracing::info!(event = "materialized_view_copied", object = %format!("{schema}.{view}"));
        Ok(())
    }

    /// Copy a materialized view into a plain table holding a snapshot of its
    /// rows. Rows are read from the materialized view itself.
    pub async fn copy_materialized_view_as_table(
        &self,
        source: &dyn Database,
        target: &dyn Database,
        schema: &str,
        view: &str,
    ) -> Result<EntryOutcome> {
        let ddl = self
            .introspector
            .generate_create_table_from_materialized_view(source, schema, view)
            .await?;
        create_table(target, schema, view, &ddl).await?;
        let rows_copied = copy_rows(source, target, schema, view).await?;

        tracing::info!(
            event = "materialized_view_copied_as_table",
            object = %format!("{schema}.{view}"),
            rows = rows_copied
        );
        Ok(EntryOutcome {
            schema: schema.to_string(),
            object_name: view.to_string(),
            kind: CopyKind::MaterializedViewAsTable,
            rows_copied,
        })
    }
}

/// Drop `schema.table` if present, then run `create_statement`.
pub async fn create_table(
    target: &dyn Database,
    schema: &str,
    table: &str,
    create_statement: &str,
) -> Result<()> {
    target
        .execute(&format!("DROP TABLE IF EXISTS {schema}.{table};"))
        .await?;
    target.execute(create_statement).await
}

pub async fn create_materialized_view(
    target: &dyn Database,
    schema: &str,
    view: &str,
    create_statement: &str,
) -> Result<()> {
    target
        .execute(&format!("DROP MATERIALIZED VIEW IF EXISTS {schema}.{view};"))
        .await?;
    target.execute(create_statement).await
}

pub async fn refresh_materialized_view(target: &dyn Database, schema: &str, view: &str) -> Result<()> {
    target
        .execute(&format!("REFRESH MATERIALIZED VIEW {schema}.{view};"))
        .await
}
