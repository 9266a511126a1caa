use async_trait::async_trait;

use pgclone_connect::Database;
use pgclone_core::Result;

/// Trait implemented by engines that can rebuild DDL from a live catalog.
#[async_trait]
pub trait Introspector: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// `CREATE TABLE` text for an existing table.
    async fn generate_create_table(
        &self,
        db: &dyn Database,
        schema: &str,
        table: &str,
    ) -> Result<String>;

    /// `CREATE MATERIALIZED VIEW` text wrapping the recorded definition.
    async fn generate_create_materialized_view(
        &self,
        db: &dyn Database,
        schema: &str,
        view: &str,
    ) -> Result<String>;

    /// `CREATE TABLE` text with the column structure of a materialized view.
    async fn generate_create_table_from_materialized_view(
        &self,
        db: &dyn Database,
        schema: &str,
        view: &str,
    ) -> Result<String>;
}
