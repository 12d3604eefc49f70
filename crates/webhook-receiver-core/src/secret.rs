//! Secure containers for the secrets the receiver is configured with.
//!
//! Secret values are never included in `Debug` output and their memory is
//! zeroed when the container is dropped.

use serde::Deserialize;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The shared secret registered with GitHub for a webhook.
///
/// Used only as an HMAC key. Immutable once constructed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct WebhookSecret {
    bytes: Vec<u8>,
}

impl WebhookSecret {
    /// Create a secret from any byte sequence.
    pub fn new(value: impl AsRef<[u8]>) -> Self {
        Self {
            bytes: value.as_ref().to_vec(),
        }
    }

    /// Get the raw key bytes (only for immediate use).
    pub fn expose_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecret")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A secret text value such as an access token or a PEM private key.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(from = "String")]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Wrap a secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Get secret as string (only for immediate use)
    ///
    /// # Security Warning
    /// The returned string contains the actual secret value.
    /// Use immediately and avoid storing in variables.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
