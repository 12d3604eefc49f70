//! Startup settings for the receiver binary.
//!
//! Sources, applied in order (later sources override earlier ones):
//!
//! 1. `/etc/webhook-receiver/receiver.yaml`
//! 2. `./config/receiver.yaml`
//! 3. the file given by `--config` / `RECEIVER_CONFIG_FILE`
//! 4. environment variables prefixed `RECEIVER__`, e.g.
//!    `RECEIVER__SERVER__PORT=9090` sets `server.port`
//! 5. `--addr`, which overrides `server.host` and `server.port`
//!
//! Secrets never come from files. They are read from `GITHUB_WEBHOOK_SECRET`,
//! `GITHUB_AUTH_TOKEN`, `GITHUB_PRIVATE_KEY` (a path) and `GITHUB_APP_ID`.

use crate::github::{auth, ApiError, ClientConfig, Credentials};
use crate::handlers::LabelPolicy;
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use webhook_receiver_api::{LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig};
use webhook_receiver_core::{SecretString, WebhookSecret};

pub const WEBHOOK_SECRET_VAR: &str = "GITHUB_WEBHOOK_SECRET";
pub const AUTH_TOKEN_VAR: &str = "GITHUB_AUTH_TOKEN";
pub const PRIVATE_KEY_VAR: &str = "GITHUB_PRIVATE_KEY";
pub const APP_ID_VAR: &str = "GITHUB_APP_ID";

const ENV_PREFIX: &str = "RECEIVER";

/// Command line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "webhook-receiver",
    version,
    about = "Receive GitHub webhooks and run the configured event handlers"
)]
pub struct Args {
    /// Address to listen on, e.g. `0.0.0.0:3000` or `:3000` [default: 0.0.0.0:3000]
    #[arg(long)]
    pub addr: Option<String>,

    /// Additional configuration file (YAML, TOML or JSON)
    #[arg(long, env = "RECEIVER_CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Errors that stop the receiver from starting.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required environment variable {name}")]
    MissingVariable { name: &'static str },

    #[error("No GitHub credentials: set GITHUB_AUTH_TOKEN, or GITHUB_PRIVATE_KEY and GITHUB_APP_ID")]
    MissingCredentials,

    #[error("GITHUB_APP_ID must be a number, got '{value}'")]
    InvalidAppId { value: String },

    #[error("Failed to read private key '{}': {source}", .path.display())]
    PrivateKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid listen address '{value}': {message}")]
    InvalidAddress { value: String, message: String },

    #[error(transparent)]
    Service(#[from] webhook_receiver_api::ConfigError),

    #[error("Invalid label rule pattern: {0}")]
    LabelRule(#[from] regex::Error),

    #[error("Invalid GitHub settings: {0}")]
    GitHub(#[from] ApiError),
}

/// Non-secret settings as they appear in configuration sources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    server: ServerConfig,
    webhook: WebhookConfig,
    logging: LoggingConfig,
    github: ClientConfig,
    labels: LabelPolicy,
}

/// Fully loaded and validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: ServiceConfig,
    pub github: ClientConfig,
    pub labels: LabelPolicy,
    pub secret: WebhookSecret,
    pub credentials: Credentials,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_process_env(args: &Args) -> Result<Self, SettingsError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load(args, &env)
    }

    /// Load settings with an explicit environment.
    pub fn load(args: &Args, env: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/webhook-receiver/receiver")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/receiver")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = &args.config {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(config::File::from(path.clone()).required(true));
        }

        let prefixed: config::Map<String, String> = env
            .iter()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let file: FileSettings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(Some(prefixed)),
            )
            .build()?
            .try_deserialize()?;

        let mut service = ServiceConfig {
            server: file.server,
            webhook: file.webhook,
            logging: file.logging,
        };

        if let Some(addr) = &args.addr {
            let (host, port) = parse_addr(addr)?;
            service.server.host = host;
            service.server.port = port;
        }

        service.validate()?;
        file.labels.compile()?;
        file.github.parsed_api_url()?;

        let secret = non_empty(env, WEBHOOK_SECRET_VAR)
            .map(WebhookSecret::new)
            .ok_or(SettingsError::MissingVariable {
                name: WEBHOOK_SECRET_VAR,
            })?;

        Ok(Self {
            service,
            github: file.github,
            labels: file.labels,
            secret,
            credentials: credentials_from_env(env)?,
        })
    }
}

/// Select credentials. A personal token wins over App credentials.
fn credentials_from_env(env: &HashMap<String, String>) -> Result<Credentials, SettingsError> {
    if let Some(token) = non_empty(env, AUTH_TOKEN_VAR) {
        return Ok(Credentials::PersonalToken(SecretString::new(token)));
    }

    let key_path = non_empty(env, PRIVATE_KEY_VAR).ok_or(SettingsError::MissingCredentials)?;
    let app_id = non_empty(env, APP_ID_VAR).ok_or(SettingsError::MissingVariable {
        name: APP_ID_VAR,
    })?;
    let app_id = app_id
        .trim()
        .parse::<u64>()
        .map_err(|_| SettingsError::InvalidAppId {
            value: app_id.to_string(),
        })?;

    let path = PathBuf::from(key_path);
    let pem = std::fs::read_to_string(&path)
        .map_err(|source| SettingsError::PrivateKey { path, source })?;
    let private_key = SecretString::new(pem);
    auth::encoding_key(&private_key)?;

    Ok(Credentials::App {
        app_id,
        private_key,
    })
}

fn non_empty<'a>(env: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    env.get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Parse `host:port`; an empty host means all interfaces.
fn parse_addr(value: &str) -> Result<(String, u16), SettingsError> {
    let invalid = |message: &str| SettingsError::InvalidAddress {
        value: value.to_string(),
        message: message.to_string(),
    };

    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| invalid("port must be a number between 1 and 65535"))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() { "0.0.0.0" } else { host };

    Ok((host.to_string(), port))
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
