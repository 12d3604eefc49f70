//! # Webhook Receiver Service
//!
//! Binary entry point for the GitHub webhook receiver.
//!
//! This executable:
//! - Loads settings from configuration files, environment and flags
//! - Initializes logging
//! - Builds the GitHub client and the event handlers
//! - Starts the HTTP server from webhook-receiver-api
//!
//! Exit codes: 1 bind failure, 2 server failure, 3 configuration error.

mod github;
mod handlers;
mod settings;

use clap::Parser;
use github::GitHubClient;
use handlers::{InstallationTracker, IssueLabeler};
use settings::{Args, Settings};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use webhook_receiver_api::{start_server, LoggingConfig, ServiceError};
use webhook_receiver_core::DispatchTable;

const EXIT_BIND_FAILED: i32 = 1;
const EXIT_SERVER_FAILED: i32 = 2;
const EXIT_CONFIGURATION: i32 = 3;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging settings live in the configuration, so load it before the
    // subscriber exists and report failures once it does.
    let loaded = Settings::from_process_env(&args);
    let logging = loaded
        .as_ref()
        .map(|s| s.service.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Configuration is invalid; aborting");
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    info!(
        credentials = settings.credentials.kind(),
        api_url = %settings.github.api_url,
        "Starting webhook receiver"
    );

    let dispatch = match build_dispatch_table(&settings) {
        Ok(dispatch) => dispatch,
        Err(e) => {
            error!(error = %e, "Failed to build event handlers; aborting");
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    if let Err(e) = start_server(settings.service, settings.secret, dispatch).await {
        error!(error = %e, "Server terminated with an error");

        let exit_code = match e {
            ServiceError::BindFailed { .. } => EXIT_BIND_FAILED,
            ServiceError::ServerFailed { .. } => EXIT_SERVER_FAILED,
            ServiceError::Configuration(_) => EXIT_CONFIGURATION,
        };

        std::process::exit(exit_code);
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Filter used when `RUST_LOG` is unset. The binary's own events carry the
/// `webhook_receiver` target.
fn default_filter(level: &str) -> String {
    format!(
        "webhook_receiver={level},webhook_receiver_api={level},webhook_receiver_core={level},tower_http={level}"
    )
}

/// Wire the handlers. Project event kinds stay unregistered.
fn build_dispatch_table(settings: &Settings) -> Result<DispatchTable, Box<dyn std::error::Error>> {
    let client = Arc::new(GitHubClient::new(
        &settings.github,
        settings.credentials.clone(),
    )?);
    let installations = Arc::new(InstallationTracker::new());

    if settings.labels.is_empty() {
        warn!("No label policy configured; issues events will be acknowledged without changes");
    }
    let labeler = IssueLabeler::new(settings.labels.clone(), client, installations.clone())?;

    Ok(DispatchTable::new()
        .with_issues_handler(Arc::new(labeler))
        .with_installation_handler(installations.clone())
        .with_installation_repositories_handler(installations))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
