use std::fmt;

use thiserror::Error;

/// Catalog object kinds that can be looked up in the source database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    MaterializedView,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Table => f.write_str("table"),
            ObjectKind::MaterializedView => f.write_str("materialized view"),
        }
    }
}

/// Core error type shared across pgclone crates.
///
/// Statement-level failures never show up here: the connection service logs
/// them and hands back an empty result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Pool creation, handshake or credential resolution failed.
    #[error("connection error: {0}")]
    Connection(String),
    /// The source catalog has no entry for the requested object.
    #[error("{kind} {schema}.{name} not found in source database")]
    NotFound {
        kind: ObjectKind,
        schema: String,
        name: String,
    },
    /// The probe view of a materialized view exposed no columns.
    #[error("could not analyze structure of materialized view {schema}.{name}")]
    StructureAnalysis { schema: String, name: String },
    /// Missing or malformed configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(kind: ObjectKind, schema: &str, name: &str) -> Self {
        Error::NotFound {
            kind,
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }
}

/// Convenience alias for results returned by pgclone crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_qualified_object() {
        let err = Error::not_found(ObjectKind::Table, "public", "users");
        assert_eq!(
            err.to_string(),
            "table public.users not found in source database"
        );
    }

    #[test]
    fn structure_analysis_names_the_view() {
        let err = Error::StructureAnalysis {
            schema: "analytics".to_string(),
            name: "daily".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not analyze structure of materialized view analytics.daily"
        );
    }
}
