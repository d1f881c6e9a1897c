//! Connection secret resolution.
//!
//! The database connection string lives in a secret store and is fetched by
//! identifier the first time a connection is needed. A successful fetch is
//! memoized for the life of the process; failures are not, so the next
//! request tries again.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::{
    config::{SecretProvider, SecretsConfig},
    error::{AppError, AppResult},
};

/// Header carrying the session token expected by the secrets endpoint
const SECRETS_TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch the current value of `secret_id`
    async fn fetch(&self, secret_id: &str) -> AppResult<String>;
}

/// Serves a fixed connection string (local development, tests)
pub struct StaticSecretSource {
    value: Option<String>,
}

impl StaticSecretSource {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }
}

#[async_trait]
impl SecretSource for StaticSecretSource {
    async fn fetch(&self, _secret_id: &str) -> AppResult<String> {
        self.value.clone().ok_or_else(|| {
            AppError::SecretUnavailable("No static database URL configured".to_string())
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecretValueResponse {
    secret_string: Option<String>,
}

/// Fetches secrets from the local secrets HTTP endpoint
pub struct HttpSecretSource {
    client: reqwest::Client,
    endpoint: String,
    version_stage: String,
    token: Option<String>,
}

impl HttpSecretSource {
    pub fn new(config: &SecretsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            version_stage: config.version_stage.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl SecretSource for HttpSecretSource {
    async fn fetch(&self, secret_id: &str) -> AppResult<String> {
        if secret_id.is_empty() {
            return Err(AppError::SecretUnavailable(
                "No secret identifier configured".to_string(),
            ));
        }

        let mut request = self
            .client
            .get(format!("{}/secretsmanager/get", self.endpoint))
            .query(&[("secretId", secret_id), ("versionStage", self.version_stage.as_str())]);
        if let Some(ref token) = self.token {
            request = request.header(SECRETS_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::SecretUnavailable(format!("Secret store unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SecretUnavailable(format!(
                "Secret store returned {} for {}",
                response.status(),
                secret_id
            )));
        }

        let body: SecretValueResponse = response
            .json()
            .await
            .map_err(|e| AppError::SecretUnavailable(format!("Malformed secret response: {}", e)))?;

        body.secret_string
            .ok_or_else(|| AppError::SecretUnavailable(format!("Secret {} has no string value", secret_id)))
    }
}

/// Build the secret source selected by configuration
pub fn source_from_config(config: &SecretsConfig) -> Arc<dyn SecretSource> {
    match config.provider {
        SecretProvider::Static => Arc::new(StaticSecretSource::new(config.database_url.clone())),
        SecretProvider::Http => Arc::new(HttpSecretSource::new(config)),
    }
}

/// Memoizing front for a [`SecretSource`]
pub struct SecretResolver {
    source: Arc<dyn SecretSource>,
    secret_id: String,
    cached: OnceCell<String>,
}

impl SecretResolver {
    pub fn new(source: Arc<dyn SecretSource>, secret_id: impl Into<String>) -> Self {
        Self {
            source,
            secret_id: secret_id.into(),
            cached: OnceCell::new(),
        }
    }

    /// The database connection string, fetched once per process
    pub async fn connection_string(&self) -> AppResult<&str> {
        let value = self
            .cached
            .get_or_try_init(|| async {
                tracing::debug!("Resolving connection secret {:?}", self.secret_id);
                let value = self.source.fetch(&self.secret_id).await.map_err(|e| {
                    tracing::error!("Error retrieving secret: {}", e);
                    e
                })?;
                if value.trim().is_empty() {
                    return Err(AppError::SecretUnavailable(format!(
                        "Secret {:?} is empty",
                        self.secret_id
                    )));
                }
                Ok(value)
            })
            .await?;
        Ok(value.as_str())
    }
}
