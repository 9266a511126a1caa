use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tokio::sync::Mutex;

use pgclone_core::{Error, Result, Row};

use crate::config::{DatabaseSettings, SslMode};
use crate::credentials::{ManagedIdentityTokenProvider, TokenProvider, resolve_password};
use crate::database::Database;
use crate::decode::{fetch_rows, run_statement};

/// Pool bounds used for every role.
pub const MIN_CONNECTIONS: u32 = 2;
pub const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Lazily pooled connection to one database.
///
/// One instance per role. The pool is created on first use and lives until
/// [`ConnectionService::disconnect`]; a later call creates a fresh one.
pub struct ConnectionService {
    settings: DatabaseSettings,
    tokens: Arc<dyn TokenProvider>,
    // Held across pool creation so concurrent first uses share one pool.
    pool: Mutex<Option<PgPool>>,
}

impl ConnectionService {
    /// Service that falls back to the host's managed identity when no
    /// password is configured.
    pub fn new(settings: DatabaseSettings) -> Result<Self> {
        let tokens = Arc::new(ManagedIdentityTokenProvider::new(
            settings.identity_client_id.clone(),
        )?);
        Ok(Self::with_token_provider(settings, tokens))
    }

    pub fn with_token_provider(settings: DatabaseSettings, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            settings,
            tokens,
            pool: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    /// Create the pool if it does not exist yet.
    pub async fn connect(&self) -> Result<()> {
        self.pool().await.map(|_| ())
    }

    /// Close and drop the pool. No-op when not connected.
    pub async fn disconnect(&self) {
        let pool = self.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!(event = "pool_closed", role = %self.settings.role);
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.pool.lock().await.is_some()
    }

    async fn pool(&self) -> Result<PgPool> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let password = resolve_password(&self.settings, self.tokens.as_ref()).await?;
        let options = connect_options(&self.settings, &password);

        let pool = PgPoolOptions::new()
            .min_connections(MIN_CONNECTIONS)
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|err| {
                Error::Connection(format!(
                    "failed to open {} pool for {}: {err}",
                    self.settings.role, self.settings
                ))
            })?;

        tracing::info!(
            event = "pool_created",
            role = %self.settings.role,
            database = %self.settings,
            min = MIN_CONNECTIONS,
            max = MAX_CONNECTIONS
        );
        *guard = Some(pool.clone());
        Ok(pool)
    }
}

fn connect_options(settings: &DatabaseSettings, password: &str) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .database(&settings.database)
        .username(&settings.username)
        .password(password)
        .ssl_mode(pg_ssl_mode(settings.ssl_mode))
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

#[async_trait]
impl Database for ConnectionService {
    fn role(&self) -> &str {
        self.settings.role.as_str()
    }

    async fn query(&self, sql: &str) -> Result<Option<Vec<Row>>> {
        let pool = self.pool().await?;
        match fetch_rows(&pool, sql).await {
            Ok(rows) => Ok(Some(rows)),
            Err(err) => {
                tracing::warn!(event = "query_failed", role = self.role(), error = %err, sql);
                Ok(None)
            }
        }
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        let pool = self.pool().await?;
        if let Err(err) = run_statement(&pool, sql).await {
            tracing::warn!(event = "execute_failed", role = self.role(), error = %err, sql);
        }
        Ok(())
    }
}
