//! Minimal GitHub REST client used by the event handlers.
//!
//! Only the label operations the issue handler needs are implemented. Calls are
//! made once; failures surface to the handler, which fails the delivery.

pub mod auth;

pub use auth::Credentials;

use async_trait::async_trait;
use auth::{mint_app_jwt, InstallationToken, TokenCache};
use chrono::Utc;
use reqwest::{header::ACCEPT, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;
use webhook_receiver_core::SecretString;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

// ============================================================================
// Errors
// ============================================================================

/// Errors from GitHub API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Authorization failed - insufficient permissions")]
    AuthorizationFailed,

    #[error("Resource not found")]
    NotFound,

    #[error("Invalid API URL '{url}': {message}")]
    InvalidApiUrl { url: String, message: String },

    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    #[error("JWT generation failed: {message}")]
    TokenGenerationFailed { message: String },

    #[error("No installation id known for '{owner}'")]
    MissingInstallation { owner: String },

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

// ============================================================================
// Configuration
// ============================================================================

/// GitHub client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST API base URL (GitHub Enterprise uses `https://<host>/api/v3`)
    pub api_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-call timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: format!("webhook-receiver/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_seconds: 10,
        }
    }
}

impl ClientConfig {
    /// Parse and return the API base URL.
    pub fn parsed_api_url(&self) -> Result<Url, ApiError> {
        let url = Url::parse(&self.api_url).map_err(|e| ApiError::InvalidApiUrl {
            url: self.api_url.clone(),
            message: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidApiUrl {
                url: self.api_url.clone(),
                message: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(url)
    }
}

// ============================================================================
// Label Operations
// ============================================================================

/// Label operations on issues.
///
/// `installation_id` selects the App installation to act as. It is ignored
/// with personal token credentials.
#[async_trait]
pub trait LabelApi: Send + Sync {
    /// Add labels to an issue. Labels already present are left alone by GitHub.
    async fn add_labels(
        &self,
        installation_id: Option<u64>,
        owner: &str,
        repo: &str,
        issue_number: u64,
        labels: &[String],
    ) -> Result<(), ApiError>;

    /// Remove one label from an issue. A label that is already absent is not
    /// an error.
    async fn remove_label(
        &self,
        installation_id: Option<u64>,
        owner: &str,
        repo: &str,
        issue_number: u64,
        name: &str,
    ) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct AddLabelsRequest<'a> {
    labels: &'a [String],
}

// ============================================================================
// Client
// ============================================================================

/// GitHub REST client.
#[derive(Debug)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    credentials: Credentials,
    tokens: TokenCache,
}

impl GitHubClient {
    pub fn new(config: &ClientConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let api_url = config.parsed_api_url()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_url,
            credentials,
            tokens: TokenCache::new(),
        })
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidApiUrl {
                url: self.api_url.to_string(),
                message: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Bearer token for a call made on behalf of `owner`.
    async fn bearer_token(
        &self,
        installation_id: Option<u64>,
        owner: &str,
    ) -> Result<SecretString, ApiError> {
        match &self.credentials {
            Credentials::PersonalToken(token) => Ok(token.clone()),
            Credentials::App {
                app_id,
                private_key,
            } => {
                let installation_id =
                    installation_id.ok_or_else(|| ApiError::MissingInstallation {
                        owner: owner.to_string(),
                    })?;
                self.installation_token(*app_id, private_key, installation_id)
                    .await
            }
        }
    }

    #[instrument(skip(self, private_key))]
    async fn installation_token(
        &self,
        app_id: u64,
        private_key: &SecretString,
        installation_id: u64,
    ) -> Result<SecretString, ApiError> {
        let now = Utc::now();
        if let Some(token) = self.tokens.get(installation_id, now).await {
            debug!("Using cached installation token");
            return Ok(token);
        }

        let jwt = mint_app_jwt(app_id, private_key, now)?;
        let url = self.endpoint(&[
            "app",
            "installations",
            &installation_id.to_string(),
            "access_tokens",
        ])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(jwt)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await?;
        let token: InstallationToken = check_status(response).await?.json().await?;

        info!(expires_at = %token.expires_at, "Obtained installation access token");

        let secret = token.token.clone();
        self.tokens.store(installation_id, token).await;
        Ok(secret)
    }
}

#[async_trait]
impl LabelApi for GitHubClient {
    #[instrument(skip(self, labels), fields(count = labels.len()))]
    async fn add_labels(
        &self,
        installation_id: Option<u64>,
        owner: &str,
        repo: &str,
        issue_number: u64,
        labels: &[String],
    ) -> Result<(), ApiError> {
        let token = self.bearer_token(installation_id, owner).await?;
        let url = self.endpoint(&[
            "repos",
            owner,
            repo,
            "issues",
            &issue_number.to_string(),
            "labels",
        ])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .json(&AddLabelsRequest { labels })
            .send()
            .await?;
        check_status(response).await?;

        info!(labels = ?labels, "Added labels");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_label(
        &self,
        installation_id: Option<u64>,
        owner: &str,
        repo: &str,
        issue_number: u64,
        name: &str,
    ) -> Result<(), ApiError> {
        let token = self.bearer_token(installation_id, owner).await?;
        let url = self.endpoint(&[
            "repos",
            owner,
            repo,
            "issues",
            &issue_number.to_string(),
            "labels",
            name,
        ])?;

        let response = self
            .http
            .delete(url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await?;

        match check_status(response).await {
            Ok(_) => {
                info!("Removed label");
                Ok(())
            }
            Err(ApiError::NotFound) => {
                debug!("Label already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Map a non-success status to an [`ApiError`].
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::AuthenticationFailed,
        StatusCode::FORBIDDEN => ApiError::AuthorizationFailed,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Validation failed".to_string());
            ApiError::InvalidRequest { message }
        }
        _ => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            ApiError::HttpError {
                status: status.as_u16(),
                message,
            }
        }
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
