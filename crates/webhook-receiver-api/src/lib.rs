//! # Webhook Receiver HTTP Service
//!
//! HTTP adapter that receives GitHub webhook deliveries and runs them through
//! the core pipeline: signature verification, event parsing, dispatch.
//!
//! This crate provides:
//! - the webhook endpoint (`POST /event_handler` by default)
//! - a plain-text usage page on `/` and every unmatched path
//! - server startup with graceful shutdown

pub mod config;
pub mod errors;
pub mod responses;
mod usage;

pub use config::{LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use responses::WebhookResponse;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{any, post},
    Router,
};
use std::{future::IntoFuture, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument, warn, Span};
use webhook_receiver_core::{parse_event, verify_signature, DispatchTable, WebhookSecret};

/// Header carrying the event kind name
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Header carrying the `sha256=<hex>` body signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
///
/// Everything in here is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub secret: Arc<WebhookSecret>,
    pub dispatch: Arc<DispatchTable>,
}

impl AppState {
    pub fn new(config: ServiceConfig, secret: WebhookSecret, dispatch: DispatchTable) -> Self {
        Self {
            config: Arc::new(config),
            secret: Arc::new(secret),
            dispatch: Arc::new(dispatch),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("secret", &self.secret)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);
    let body_limit = state.config.server.max_body_size;

    Router::new()
        .route(
            &state.config.webhook.endpoint_path,
            post(handle_event_webhook),
        )
        .route("/", any(usage::handle_usage))
        .fallback(usage::handle_usage)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                ))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests get
/// `server.shutdown_timeout_seconds` to finish once the signal arrives.
pub async fn start_server(
    config: ServiceConfig,
    secret: WebhookSecret,
    dispatch: DispatchTable,
) -> Result<(), ServiceError> {
    config.validate()?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(
        address = %address,
        endpoint = %config.webhook.endpoint_path,
        handlers = ?dispatch.registered_kinds(),
        "Starting HTTP server"
    );

    let app = create_router(AppState::new(config, secret, dispatch));

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        shutdown_signal().await;
        info!(
            "Initiating graceful shutdown with {}s timeout",
            shutdown_timeout.as_secs()
        );
        let _ = signalled_tx.send(());
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();

    let deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(shutdown_timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = deadline => {
            warn!("Graceful shutdown timed out, dropping in-flight requests");
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve on SIGINT (Ctrl+C) or SIGTERM.
///
/// A signal source that cannot be installed is logged and never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Webhook Handler
// ============================================================================

/// Handle a GitHub webhook delivery
///
/// Steps run in order, each failing fast:
/// 1. read the raw body (bounded by `server.max_body_size`)
/// 2. verify `X-Hub-Signature-256` against the raw body
/// 3. read `X-GitHub-Event` and decode the payload
/// 4. dispatch to the registered handler and await it
///
/// Nothing from an unverified body is parsed or logged.
#[instrument(
    skip(state, headers, body),
    fields(event_type = tracing::field::Empty, delivery_id = tracing::field::Empty)
)]
pub async fn handle_event_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    let delivery_id = header_str(&headers, DELIVERY_HEADER).map(str::to_string);
    if let Some(id) = &delivery_id {
        Span::current().record("delivery_id", id.as_str());
    }

    let limit = state.config.server.max_body_size;
    let payload = axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeds_length_limit(&e) {
            WebhookHandlerError::PayloadTooLarge { limit }
        } else {
            WebhookHandlerError::BodyRead {
                message: e.to_string(),
            }
        }
    })?;

    let signature = header_str(&headers, SIGNATURE_HEADER);
    if !verify_signature(&state.secret, &payload, signature) {
        return Err(WebhookHandlerError::InvalidSignature);
    }

    let event_type = header_str(&headers, EVENT_HEADER).ok_or(
        WebhookHandlerError::MissingHeader {
            header: "X-GitHub-Event",
        },
    )?;
    Span::current().record("event_type", event_type);

    let envelope = parse_event(event_type, &payload)?;
    debug!(bytes = payload.len(), "Verified and decoded webhook");

    let outcome = state.dispatch.dispatch(&envelope).await?;

    info!(handled = outcome.is_handled(), "Webhook processed");

    Ok(Json(WebhookResponse::from_outcome(
        outcome,
        event_type,
        delivery_id,
    )))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
