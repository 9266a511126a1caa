use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use pgclone_core::{Error, Result};

use crate::config::DatabaseSettings;

/// Token scope for Azure Database for PostgreSQL.
pub const POSTGRES_TOKEN_SCOPE: &str = "https://ossrdbms-aad.database.windows.net/.default";

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Source of short-lived access tokens used in place of a password.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, scope: &str) -> Result<String>;
}

/// Fetches tokens from the managed identity endpoint of the host.
///
/// App Service style hosts expose `IDENTITY_ENDPOINT` / `IDENTITY_HEADER`;
/// everything else falls back to the instance metadata service.
#[derive(Debug, Clone)]
pub struct ManagedIdentityTokenProvider {
    client: reqwest::Client,
    client_id: Option<String>,
    endpoint: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ManagedIdentityTokenProvider {
    /// Provider for the current host, picking the App Service endpoint when
    /// `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` are set.
    pub fn new(client_id: Option<String>) -> Result<Self> {
        let endpoint = match (
            std::env::var("IDENTITY_ENDPOINT"),
            std::env::var("IDENTITY_HEADER"),
        ) {
            (Ok(url), Ok(header)) if !url.is_empty() => Some((url, header)),
            _ => None,
        };
        Self::with_endpoint(client_id, endpoint)
    }

    /// Provider bound to an explicit `(url, header)` identity endpoint, or to
    /// the instance metadata service when `endpoint` is `None`.
    pub fn with_endpoint(
        client_id: Option<String>,
        endpoint: Option<(String, String)>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| {
                Error::Connection(format!("failed to build managed identity client: {err}"))
            })?;
        Ok(Self {
            client,
            client_id,
            endpoint,
        })
    }
}

#[async_trait]
impl TokenProvider for ManagedIdentityTokenProvider {
    async fn token(&self, scope: &str) -> Result<String> {
        let resource = scope_to_resource(scope);
        let mut params = vec![("resource", resource.to_string())];
        if let Some(client_id) = &self.client_id {
            params.push(("client_id", client_id.clone()));
        }

        let request = match &self.endpoint {
            Some((url, header)) => {
                params.push(("api-version", APP_SERVICE_API_VERSION.to_string()));
                self.client
                    .get(url)
                    .header("X-IDENTITY-HEADER", header)
                    .query(&params)
            }
            None => {
                params.push(("api-version", IMDS_API_VERSION.to_string()));
                self.client
                    .get(IMDS_ENDPOINT)
                    .header("Metadata", "true")
                    .query(&params)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|err| Error::Connection(format!("managed identity request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connection(format!(
                "managed identity endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| Error::Connection(format!("invalid managed identity response: {err}")))?;
        Ok(body.access_token)
    }
}

/// `https://host/.default` -> `https://host`
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

/// Pick the configured password, or fall back to an identity token.
pub async fn resolve_password(
    settings: &DatabaseSettings,
    tokens: &dyn TokenProvider,
) -> Result<String> {
    if let Some(password) = settings.password.as_deref().filter(|p| !p.is_empty()) {
        return Ok(password.to_string());
    }

    tracing::debug!(
        event = "token_requested",
        role = %settings.role,
        scope = POSTGRES_TOKEN_SCOPE
    );
    let token = tokens.token(POSTGRES_TOKEN_SCOPE).await?;
    if token.is_empty() {
        return Err(Error::Connection(format!(
            "identity provider returned an empty token for the {} database",
            settings.role
        )));
    }
    Ok(token)
}
