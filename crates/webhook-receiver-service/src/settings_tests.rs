//! Tests for settings loading and validation.

use super::*;
use serial_test::serial;
use std::io::Write;

const FIXTURE_KEY: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/app-private-key.pem"
);

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn token_env() -> HashMap<String, String> {
    env(&[
        (WEBHOOK_SECRET_VAR, "s3cret"),
        (AUTH_TOKEN_VAR, "ghp_test"),
    ])
}

fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

// ============================================================================
// Defaults and overrides
// ============================================================================

#[test]
fn test_minimal_environment_uses_defaults() {
    let settings = Settings::load(&Args::default(), &token_env()).expect("settings");

    assert_eq!(settings.service.server.host, "0.0.0.0");
    assert_eq!(settings.service.server.port, 3000);
    assert_eq!(settings.service.webhook.endpoint_path, "/event_handler");
    assert_eq!(settings.github.api_url, "https://api.github.com");
    assert!(settings.labels.is_empty());
    assert_eq!(settings.secret.expose_bytes(), b"s3cret");
    assert!(matches!(settings.credentials, Credentials::PersonalToken(_)));
}

#[test]
fn test_addr_flag_overrides_bind_address() {
    let args = Args {
        addr: Some("127.0.0.1:9000".to_string()),
        config: None,
    };

    let settings = Settings::load(&args, &token_env()).unwrap();

    assert_eq!(settings.service.server.host, "127.0.0.1");
    assert_eq!(settings.service.server.port, 9000);
}

#[test]
fn test_addr_without_host_binds_all_interfaces() {
    assert_eq!(parse_addr(":3000").unwrap(), ("0.0.0.0".to_string(), 3000));
    assert_eq!(parse_addr("[::1]:8080").unwrap(), ("::1".to_string(), 8080));
}

#[test]
fn test_invalid_addr_is_rejected() {
    assert!(matches!(
        parse_addr("localhost"),
        Err(SettingsError::InvalidAddress { .. })
    ));
    assert!(matches!(
        parse_addr("localhost:http"),
        Err(SettingsError::InvalidAddress { .. })
    ));
}

#[test]
fn test_prefixed_environment_overrides_defaults() {
    let mut vars = token_env();
    vars.insert("RECEIVER__SERVER__PORT".to_string(), "9100".to_string());
    vars.insert(
        "RECEIVER__WEBHOOK__ENDPOINT_PATH".to_string(),
        "/hooks/github".to_string(),
    );

    let settings = Settings::load(&Args::default(), &vars).unwrap();

    assert_eq!(settings.service.server.port, 9100);
    assert_eq!(settings.service.webhook.endpoint_path, "/hooks/github");
}

#[test]
fn test_config_file_supplies_label_policy() {
    // Arrange
    let file = yaml_file(
        r#"
server:
  port: 8088
github:
  api_url: "https://ghe.example.com/api/v3"
labels:
  on_opened: ["triage"]
  on_closed_remove: ["triage"]
  rules:
    - pattern: "^priority/"
      add: ["needs-owner"]
"#,
    );
    let args = Args {
        addr: None,
        config: Some(file.path().to_path_buf()),
    };

    // Act
    let settings = Settings::load(&args, &token_env()).expect("settings");

    // Assert
    assert_eq!(settings.service.server.port, 8088);
    assert_eq!(settings.github.api_url, "https://ghe.example.com/api/v3");
    assert_eq!(settings.labels.on_opened, vec!["triage".to_string()]);
    assert_eq!(settings.labels.rules.len(), 1);
    assert_eq!(settings.labels.rules[0].pattern, "^priority/");
}

#[test]
fn test_environment_overrides_config_file() {
    let file = yaml_file("server:\n  port: 8088\n");
    let mut vars = token_env();
    vars.insert("RECEIVER__SERVER__PORT".to_string(), "8099".to_string());
    let args = Args {
        addr: None,
        config: Some(file.path().to_path_buf()),
    };

    let settings = Settings::load(&args, &vars).unwrap();

    assert_eq!(settings.service.server.port, 8099);
}

#[test]
fn test_missing_explicit_config_file_is_an_error() {
    let args = Args {
        addr: None,
        config: Some(PathBuf::from("/nonexistent/receiver.yaml")),
    };

    let err = Settings::load(&args, &token_env()).expect_err("file is required");

    assert!(matches!(err, SettingsError::Load(_)));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_missing_webhook_secret_is_rejected() {
    let vars = env(&[(AUTH_TOKEN_VAR, "ghp_test")]);

    let err = Settings::load(&Args::default(), &vars).expect_err("secret is required");

    assert!(matches!(
        err,
        SettingsError::MissingVariable {
            name: WEBHOOK_SECRET_VAR
        }
    ));
}

#[test]
fn test_empty_webhook_secret_is_rejected() {
    let vars = env(&[(WEBHOOK_SECRET_VAR, ""), (AUTH_TOKEN_VAR, "ghp_test")]);

    assert!(Settings::load(&Args::default(), &vars).is_err());
}

#[test]
fn test_missing_credentials_are_rejected() {
    let vars = env(&[(WEBHOOK_SECRET_VAR, "s3cret")]);

    let err = Settings::load(&Args::default(), &vars).expect_err("credentials required");

    assert!(matches!(err, SettingsError::MissingCredentials));
}

#[test]
fn test_invalid_label_pattern_is_rejected() {
    let file = yaml_file("labels:\n  rules:\n    - pattern: \"([\"\n      add: [\"x\"]\n");
    let args = Args {
        addr: None,
        config: Some(file.path().to_path_buf()),
    };

    let err = Settings::load(&args, &token_env()).expect_err("bad regex");

    assert!(matches!(err, SettingsError::LabelRule(_)));
}

#[test]
fn test_invalid_endpoint_path_is_rejected() {
    let mut vars = token_env();
    vars.insert(
        "RECEIVER__WEBHOOK__ENDPOINT_PATH".to_string(),
        "hooks".to_string(),
    );

    let err = Settings::load(&Args::default(), &vars).expect_err("relative path");

    assert!(matches!(err, SettingsError::Service(_)));
}

// ============================================================================
// App credentials
// ============================================================================

#[test]
fn test_app_credentials_are_loaded_from_key_file() {
    let vars = env(&[
        (WEBHOOK_SECRET_VAR, "s3cret"),
        (PRIVATE_KEY_VAR, FIXTURE_KEY),
        (APP_ID_VAR, "12345"),
    ]);

    let settings = Settings::load(&Args::default(), &vars).expect("settings");

    match settings.credentials {
        Credentials::App { app_id, .. } => assert_eq!(app_id, 12345),
        other => panic!("expected App credentials, got {:?}", other),
    }
}

#[test]
fn test_personal_token_wins_over_app_credentials() {
    let vars = env(&[
        (WEBHOOK_SECRET_VAR, "s3cret"),
        (AUTH_TOKEN_VAR, "ghp_test"),
        (PRIVATE_KEY_VAR, FIXTURE_KEY),
        (APP_ID_VAR, "12345"),
    ]);

    let settings = Settings::load(&Args::default(), &vars).unwrap();

    assert_eq!(settings.credentials.kind(), "personal_token");
}

#[test]
fn test_private_key_without_app_id_is_rejected() {
    let vars = env(&[(WEBHOOK_SECRET_VAR, "s3cret"), (PRIVATE_KEY_VAR, FIXTURE_KEY)]);

    let err = Settings::load(&Args::default(), &vars).expect_err("app id required");

    assert!(matches!(
        err,
        SettingsError::MissingVariable { name: APP_ID_VAR }
    ));
}

#[test]
fn test_non_numeric_app_id_is_rejected() {
    let vars = env(&[
        (WEBHOOK_SECRET_VAR, "s3cret"),
        (PRIVATE_KEY_VAR, FIXTURE_KEY),
        (APP_ID_VAR, "my-app"),
    ]);

    let err = Settings::load(&Args::default(), &vars).expect_err("numeric app id");

    assert!(matches!(err, SettingsError::InvalidAppId { .. }));
}

#[test]
fn test_unreadable_private_key_is_rejected() {
    let vars = env(&[
        (WEBHOOK_SECRET_VAR, "s3cret"),
        (PRIVATE_KEY_VAR, "/nonexistent/key.pem"),
        (APP_ID_VAR, "1"),
    ]);

    let err = Settings::load(&Args::default(), &vars).expect_err("missing key file");

    assert!(matches!(err, SettingsError::PrivateKey { .. }));
    assert!(err.to_string().contains("/nonexistent/key.pem"));
}

#[test]
fn test_malformed_private_key_is_rejected() {
    let file = yaml_file("not a pem file");
    let path = file.path().to_string_lossy().to_string();
    let vars = env(&[
        (WEBHOOK_SECRET_VAR, "s3cret"),
        (PRIVATE_KEY_VAR, path.as_str()),
        (APP_ID_VAR, "1"),
    ]);

    let err = Settings::load(&Args::default(), &vars).expect_err("bad key");

    assert!(matches!(
        err,
        SettingsError::GitHub(ApiError::InvalidPrivateKey { .. })
    ));
}

#[test]
fn test_settings_debug_hides_secrets() {
    let settings = Settings::load(&Args::default(), &token_env()).unwrap();

    let debug = format!("{:?}", settings);

    assert!(!debug.contains("s3cret"));
    assert!(!debug.contains("ghp_test"));
}

// ============================================================================
// Process environment
// ============================================================================

#[test]
#[serial]
fn test_from_process_env_reads_github_variables() {
    std::env::set_var(WEBHOOK_SECRET_VAR, "process-secret");
    std::env::set_var(AUTH_TOKEN_VAR, "ghp_process");

    let result = Settings::from_process_env(&Args::default());

    std::env::remove_var(WEBHOOK_SECRET_VAR);
    std::env::remove_var(AUTH_TOKEN_VAR);

    let settings = result.expect("settings from process env");
    assert_eq!(settings.secret.expose_bytes(), b"process-secret");
}
