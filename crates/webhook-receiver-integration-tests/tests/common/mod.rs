//! Common test utilities for webhook-receiver-api integration tests
//!
//! This module provides:
//! - Recording handler implementations
//! - Signed request builders
//! - Response helpers

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webhook_receiver_api::{AppState, ServiceConfig};
use webhook_receiver_core::{
    compute_signature, format_signature_header, DispatchTable, EventHandler, HandlerError,
    InstallationEvent, IssueAction, IssuesEvent, WebhookSecret,
};

/// Secret shared between the test "sender" and the receiver.
pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Recording Handlers
// ============================================================================

/// One observed `issues` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCall {
    pub action: IssueAction,
    pub number: u64,
    pub label: Option<String>,
}

/// Issues handler that records every invocation.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingIssuesHandler {
    calls: Arc<Mutex<Vec<IssueCall>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl RecordingIssuesHandler {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that records the call and then fails with `message`.
    #[allow(dead_code)]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Handler that sleeps before returning.
    #[allow(dead_code)]
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<IssueCall> {
        self.calls.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EventHandler<IssuesEvent> for RecordingIssuesHandler {
    async fn handle(&self, event: &IssuesEvent) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push(IssueCall {
            action: event.action.clone(),
            number: event.issue.number,
            label: event.label.as_ref().map(|l| l.name.clone()),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

/// Installation handler that counts invocations.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct CountingInstallationHandler {
    ids: Arc<Mutex<Vec<u64>>>,
}

impl CountingInstallationHandler {
    #[allow(dead_code)]
    pub fn ids(&self) -> Vec<u64> {
        self.ids.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EventHandler<InstallationEvent> for CountingInstallationHandler {
    async fn handle(&self, event: &InstallationEvent) -> Result<(), HandlerError> {
        self.ids.lock().unwrap().push(event.installation.id);
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Application state with the test secret and the given handlers.
#[allow(dead_code)]
pub fn create_test_app_state(dispatch: DispatchTable) -> AppState {
    create_test_app_state_with_config(ServiceConfig::default(), dispatch)
}

#[allow(dead_code)]
pub fn create_test_app_state_with_config(
    config: ServiceConfig,
    dispatch: DispatchTable,
) -> AppState {
    AppState::new(config, WebhookSecret::new(TEST_SECRET), dispatch)
}

/// `sha256=<hex>` header value for `body` under `secret`.
#[allow(dead_code)]
pub fn sign(secret: &str, body: &[u8]) -> String {
    format_signature_header(&compute_signature(&WebhookSecret::new(secret), body))
}

/// Webhook delivery request builder.
#[allow(dead_code)]
pub struct Delivery {
    path: String,
    event: Option<String>,
    signature: Option<String>,
    body: Vec<u8>,
}

#[allow(dead_code)]
impl Delivery {
    /// Delivery of `body` as `event`, signed with [`TEST_SECRET`].
    pub fn new(event: &str, body: &str) -> Self {
        Self {
            path: "/event_handler".to_string(),
            event: Some(event.to_string()),
            signature: Some(sign(TEST_SECRET, body.as_bytes())),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn without_event(mut self) -> Self {
        self.event = None;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signature = None;
        self
    }

    pub fn signature(mut self, value: &str) -> Self {
        self.signature = Some(value.to_string());
        self
    }

    /// Replace the body after signing.
    pub fn tampered_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(self.path)
            .header("content-type", "application/json")
            .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");
        if let Some(event) = self.event {
            builder = builder.header("x-github-event", event);
        }
        if let Some(signature) = self.signature {
            builder = builder.header("x-hub-signature-256", signature);
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

#[allow(dead_code)]
pub async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body should be UTF-8")
}

#[allow(dead_code)]
pub async fn response_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&response_text(response).await).expect("Response should be JSON")
}
