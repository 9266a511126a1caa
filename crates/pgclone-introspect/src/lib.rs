//! DDL synthesis from a live catalog.

pub mod adapter;
pub mod postgres;

pub use adapter::Introspector;
pub use postgres::{
    PostgresIntrospector, generate_create_materialized_view, generate_create_table,
    generate_create_table_from_materialized_view, probe_view_name,
};
