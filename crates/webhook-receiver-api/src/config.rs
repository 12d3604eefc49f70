//! Configuration types for the HTTP service
//!
//! Every field carries a serde default so partial configuration files and an
//! empty environment both produce a usable configuration. Secrets are not part
//! of these types; they are passed to [`crate::AppState`] separately.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhook: WebhookConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check the configuration for values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.webhook.validate()?;
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            timeout_seconds: 30,
            shutdown_timeout_seconds: 30,
            max_body_size: 25 * 1024 * 1024, // GitHub caps payloads at 25MB
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "server.host must not be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be greater than zero".to_string(),
            });
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "server.timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Path GitHub delivers events to
    pub endpoint_path: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/event_handler".to_string(),
        }
    }
}

impl WebhookConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.endpoint_path must start with '/', got '{}'",
                    self.endpoint_path
                ),
            });
        }

        if self.endpoint_path == "/" {
            return Err(ConfigError::Invalid {
                message: "webhook.endpoint_path must not be '/' (reserved for usage text)"
                    .to_string(),
            });
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
