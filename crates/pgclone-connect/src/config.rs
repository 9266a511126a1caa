use std::fmt;

use pgclone_core::{Error, Result};

/// Which side of a duplication a database plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Target,
}

impl Role {
    /// Prefix of the environment keys that configure this role.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Role::Source => "SRC",
            Role::Target => "DEST",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Target => "target",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport security requested for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    Prefer,
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disable" => Some(SslMode::Disable),
            "prefer" => Some(SslMode::Prefer),
            "require" => Some(SslMode::Require),
            "verify-ca" => Some(SslMode::VerifyCa),
            "verify-full" => Some(SslMode::VerifyFull),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

/// Connection settings for one database role.
///
/// `password` is optional: without it the service asks the ambient
/// identity provider for a token.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub role: Role,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
    /// Client id of a user-assigned managed identity.
    pub identity_client_id: Option<String>,
}

impl DatabaseSettings {
    /// Read `<PREFIX>_POSTGRES_*` keys through `lookup`.
    pub fn from_lookup<F>(role: Role, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = role.env_prefix();
        let key = |name: &str| format!("{prefix}_POSTGRES_{name}");
        let non_empty = |name: &str| {
            lookup(&key(name))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| {
            non_empty(name)
                .ok_or_else(|| Error::Config(format!("{} is not set", key(name))))
        };

        let host = required("HOST")?;
        let port_text = required("PORT")?;
        let port = port_text.parse::<u16>().map_err(|_| {
            Error::Config(format!("{} must be a port number, got {port_text:?}", key("PORT")))
        })?;

        let ssl_mode = match non_empty("SSLMODE") {
            Some(value) => SslMode::parse(&value).ok_or_else(|| {
                Error::Config(format!("{} has unknown mode {value:?}", key("SSLMODE")))
            })?,
            None => SslMode::default(),
        };

        Ok(Self {
            role,
            host,
            port,
            database: required("DATABASE")?,
            username: required("USERNAME")?,
            password: non_empty("PASSWORD"),
            ssl_mode,
            identity_client_id: lookup("AZURE_CLIENT_ID").filter(|value| !value.is_empty()),
        })
    }

    /// Read settings from the process environment.
    pub fn from_env(role: Role) -> Result<Self> {
        Self::from_lookup(role, |key| std::env::var(key).ok())
    }
}

// Passwords never reach logs: both Display and Debug redact them.
impl fmt::Display for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgres://{}{}@{}:{}/{}?sslmode={}",
            self.username,
            if self.password.is_some() { ":***" } else { "" },
            self.host,
            self.port,
            self.database,
            self.ssl_mode.as_str()
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("role", &self.role)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssl_mode", &self.ssl_mode)
            .field("identity_client_id", &self.identity_client_id)
            .finish()
    }
}
