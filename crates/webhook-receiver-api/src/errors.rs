//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use webhook_receiver_core::{DispatchError, ParseError};
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// Every failure of the webhook endpoint resolves into one of these variants
/// and from there into a status code:
///
/// - `400 Bad Request`: malformed payload or missing event header
/// - `401 Unauthorized`: missing or invalid signature
/// - `413 Payload Too Large`: body over the configured limit
/// - `500 Internal Server Error`: body read or handler failure
///
/// # Security Considerations
///
/// Handler failures are logged server-side with full detail but answered
/// with a generic message so that internal errors are not disclosed to the
/// webhook sender.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// The request body could not be read
    ///
    /// Maps to: `500 Internal Server Error`
    #[error("Failed to read request body: {message}")]
    BodyRead { message: String },

    /// The body exceeded the configured size limit
    ///
    /// Maps to: `413 Payload Too Large`
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Signature header missing or not matching the body
    ///
    /// Maps to: `401 Unauthorized` (never retried by the receiver)
    #[error("Invalid or missing webhook signature")]
    InvalidSignature,

    /// The verified request carried no `X-GitHub-Event` header
    ///
    /// Maps to: `400 Bad Request`
    #[error("Missing required header: {header}")]
    MissingHeader { header: &'static str },

    /// Known event kind with a body that does not decode
    ///
    /// Maps to: `400 Bad Request`
    #[error("Invalid webhook payload: {0}")]
    MalformedPayload(#[from] ParseError),

    /// The registered handler returned an error
    ///
    /// Maps to: `500 Internal Server Error` with a generic message
    #[error("Event handler failed: {0}")]
    HandlerFailed(#[from] DispatchError),
}

impl WebhookHandlerError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BodyRead { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MissingHeader { .. } => StatusCode::BAD_REQUEST,
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::HandlerFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::BodyRead { message } => {
                error!(error = %message, "Failed to read webhook body");
                "Internal server error occurred. Please try again later.".to_string()
            }
            Self::HandlerFailed(e) => {
                // Log detailed error server-side but return generic message to client
                error!(error = %e, "Webhook handler failed");
                "Internal server error occurred. Please try again later.".to_string()
            }
            Self::InvalidSignature => {
                warn!("Rejected webhook with invalid signature");
                self.to_string()
            }
            Self::MissingHeader { .. }
            | Self::MalformedPayload(_)
            | Self::PayloadTooLarge { .. } => {
                warn!(error = %self, "Rejected malformed webhook");
                self.to_string()
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
