//! Pooled Postgres access for the source and target databases.

pub mod config;
pub mod credentials;
pub mod database;
mod decode;
pub mod service;
#[cfg(feature = "test-support")]
pub mod testing;

pub use config::{DatabaseSettings, Role, SslMode};
pub use credentials::{
    ManagedIdentityTokenProvider, POSTGRES_TOKEN_SCOPE, TokenProvider, resolve_password,
};
pub use database::{
    Database, column_from_row, describe_columns_sql, describe_table_columns_sql,
};
pub use service::{ConnectionService, MAX_CONNECTIONS, MIN_CONNECTIONS};
