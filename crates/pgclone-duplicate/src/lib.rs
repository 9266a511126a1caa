//! Table and materialized view duplication between two databases.

pub mod migrate;
pub mod orchestrator;

pub use migrate::{copy_rows, insert_statement, select_all};
pub use orchestrator::{
    CopyKind, DuplicationReport, Duplicator, EntryOutcome, create_materialized_view,
    create_table, refresh_materialized_view,
};
