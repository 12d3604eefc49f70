//! Credentials for GitHub API calls.
//!
//! Two credential kinds are supported:
//!
//! - a personal access token, sent as a bearer token on every call
//! - a GitHub App (id + RSA private key), from which a short-lived RS256 JWT is
//!   minted and exchanged for a per-installation access token
//!
//! Installation tokens are cached until shortly before they expire.

use super::ApiError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use webhook_receiver_core::SecretString;

/// Seconds the JWT `iat` claim is backdated to absorb clock drift.
const JWT_BACKDATE_SECONDS: i64 = 60;

/// JWT lifetime in seconds. GitHub rejects anything over ten minutes.
const JWT_LIFETIME_SECONDS: i64 = 9 * 60;

/// Installation tokens are refreshed this many seconds before `expires_at`.
const TOKEN_REFRESH_MARGIN_SECONDS: i64 = 60;

/// Credentials used to authenticate GitHub API calls.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Personal access token
    PersonalToken(SecretString),

    /// GitHub App identity
    App {
        app_id: u64,
        /// PEM-encoded RSA private key
        private_key: SecretString,
    },
}

impl Credentials {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PersonalToken(_) => "personal_token",
            Self::App { .. } => "github_app",
        }
    }
}

// ============================================================================
// App JWT
// ============================================================================

/// Claims of a GitHub App JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// App id
    pub iss: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(app_id: u64, now: DateTime<Utc>) -> Self {
        Self {
            iss: app_id.to_string(),
            iat: (now - Duration::seconds(JWT_BACKDATE_SECONDS)).timestamp(),
            exp: (now + Duration::seconds(JWT_LIFETIME_SECONDS)).timestamp(),
        }
    }
}

/// Parse a PEM private key into a signing key.
pub fn encoding_key(private_key: &SecretString) -> Result<EncodingKey, ApiError> {
    EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes()).map_err(|e| {
        ApiError::InvalidPrivateKey {
            message: e.to_string(),
        }
    })
}

/// Mint an RS256 JWT identifying the App.
pub fn mint_app_jwt(
    app_id: u64,
    private_key: &SecretString,
    now: DateTime<Utc>,
) -> Result<String, ApiError> {
    let key = encoding_key(private_key)?;
    let claims = JwtClaims::new(app_id, now);

    encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| {
        ApiError::TokenGenerationFailed {
            message: e.to_string(),
        }
    })
}

// ============================================================================
// Installation Tokens
// ============================================================================

/// Installation access token as returned by
/// `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    /// Whether the token can still be handed out at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECONDS) > now
    }
}

/// In-memory cache of installation tokens keyed by installation id.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<u64, InstallationToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token for an installation, if still usable at `now`.
    pub async fn get(&self, installation_id: u64, now: DateTime<Utc>) -> Option<SecretString> {
        let tokens = self.tokens.read().await;
        tokens
            .get(&installation_id)
            .filter(|t| t.is_usable_at(now))
            .map(|t| t.token.clone())
    }

    pub async fn store(&self, installation_id: u64, token: InstallationToken) {
        self.tokens.write().await.insert(installation_id, token);
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
