//! Response types for the webhook endpoint.

use serde::{Deserialize, Serialize};
use webhook_receiver_core::DispatchOutcome;

// ============================================================================
// Response Types
// ============================================================================

/// Body of a `200 OK` webhook response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// `processed` when a handler ran, `ignored` otherwise
    pub status: String,
    pub event_type: String,
    pub delivery_id: Option<String>,
    pub message: String,
}

impl WebhookResponse {
    pub const PROCESSED: &'static str = "processed";
    pub const IGNORED: &'static str = "ignored";

    /// Build the response for a completed dispatch.
    pub fn from_outcome(
        outcome: DispatchOutcome,
        event_type: impl Into<String>,
        delivery_id: Option<String>,
    ) -> Self {
        let event_type = event_type.into();
        let (status, message) = match outcome {
            DispatchOutcome::Handled(kind) => {
                (Self::PROCESSED, format!("{} event handled", kind))
            }
            DispatchOutcome::Ignored => (
                Self::IGNORED,
                format!("No handler for '{}' events", event_type),
            ),
        };

        Self {
            status: status.to_string(),
            event_type,
            delivery_id,
            message,
        }
    }
}
