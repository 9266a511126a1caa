//! In-memory [`Database`] for exercising introspection and duplication
//! without a server. Enabled by the `test-support` feature.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use pgclone_core::{ColumnDescriptor, Error, Result, Row, RowValue};

use crate::database::Database;

type Response = Result<Option<Vec<Row>>>;

/// Answers queries from a script and records every statement it sees.
///
/// A query first looks for a rule whose needle occurs in the SQL; rules are
/// checked in the order they were added and are never used up. Otherwise the
/// next queued response is taken, and an empty queue answers `Ok(Some([]))`.
pub struct ScriptedDatabase {
    role: &'static str,
    rules: Mutex<Vec<(String, Option<Vec<Row>>)>>,
    responses: Mutex<VecDeque<Response>>,
    statements: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedDatabase {
    pub fn new(role: &'static str) -> Self {
        Self {
            role,
            rules: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Queue the answer to the next query.
    pub fn respond(self, rows: Option<Vec<Row>>) -> Self {
        lock(&self.responses).push_back(Ok(rows));
        self
    }

    /// Queue a connection failure for the next query.
    pub fn respond_connection_lost(self) -> Self {
        lock(&self.responses).push_back(Err(Error::Connection("connection lost".to_string())));
        self
    }

    /// Answer every query containing `needle` with `rows`.
    pub fn respond_to(self, needle: &str, rows: Option<Vec<Row>>) -> Self {
        lock(&self.rules).push((needle.to_string(), rows));
        self
    }

    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    fn role(&self) -> &str {
        self.role
    }

    async fn query(&self, sql: &str) -> Result<Option<Vec<Row>>> {
        lock(&self.statements).push(sql.to_string());
        let ruled = lock(&self.rules)
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone());
        if let Some(rows) = ruled {
            return Ok(rows);
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or(Ok(Some(Vec::new())))
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        lock(&self.statements).push(sql.to_string());
        Ok(())
    }
}

/// `information_schema.columns` rows for the given columns.
pub fn catalog_rows(columns: &[ColumnDescriptor]) -> Vec<Row> {
    let opt_number = |value: Option<i32>| value.map(RowValue::number).unwrap_or(RowValue::Null);
    columns
        .iter()
        .map(|column| {
            Row::new()
                .with("column_name", RowValue::text(column.name.clone()))
                .with("data_type", RowValue::text(column.data_type.clone()))
                .with(
                    "udt_name",
                    column
                        .udt_name
                        .clone()
                        .map(RowValue::Text)
                        .unwrap_or(RowValue::Null),
                )
                .with(
                    "character_maximum_length",
                    opt_number(column.character_max_length),
                )
                .with("numeric_precision", opt_number(column.numeric_precision))
                .with("numeric_scale", opt_number(column.numeric_scale))
                .with(
                    "is_nullable",
                    RowValue::text(if column.is_nullable { "YES" } else { "NO" }),
                )
        })
        .collect()
}

/// A `pg_matviews` answer carrying `definition`.
pub fn definition_row(definition: &str) -> Vec<Row> {
    vec![Row::new().with("definition", RowValue::text(definition))]
}
