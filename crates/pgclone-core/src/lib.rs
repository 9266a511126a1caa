//! Core contracts and helpers for pgclone.
//!
//! This crate defines the duplication plan, catalog column metadata, row
//! values with their SQL literal rendering, and the error type shared by the
//! connection, introspection and duplication crates.

pub mod entry;
pub mod error;
pub mod types;
pub mod value;

pub use entry::{DuplicationEntry, DuplicationPlan, is_plain_identifier};
pub use error::{Error, ObjectKind, Result};
pub use types::ColumnDescriptor;
pub use value::{LEGACY_NULL_MARKER, Row, RowValue, quote_literal, render_literal};
