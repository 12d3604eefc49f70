//! Help page served on `/` and unmatched paths.

use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Placeholder replaced with the configured webhook path.
const ENDPOINT_PLACEHOLDER: &str = "{endpoint}";

const USAGE: &str = "\
GitHub webhook receiver

Receives GitHub webhook deliveries, verifies their HMAC-SHA256 signature and
hands them to the registered event handlers.

Environment:
  GITHUB_WEBHOOK_SECRET   shared secret configured on the webhook (required)
  GITHUB_AUTH_TOKEN       personal access token used for API calls
  GITHUB_PRIVATE_KEY      path to a GitHub App private key (PEM)
  GITHUB_APP_ID           GitHub App id, required with GITHUB_PRIVATE_KEY

  Either GITHUB_AUTH_TOKEN or GITHUB_PRIVATE_KEY + GITHUB_APP_ID must be set.

Personal access tokens:
  Create one at https://github.com/settings/tokens

Registering the webhook:
  1. Open https://github.com/<owner>/<repo>/settings/hooks and click
     \"Add webhook\".
  2. Set the payload URL to http(s)://<host>:<port>{endpoint}
  3. Set the content type to application/json.
  4. Enter the same secret as GITHUB_WEBHOOK_SECRET.
  5. Choose \"Let me select individual events\" and check the events to
     deliver: issues, installation, installation_repositories, project,
     project_card, project_column.
  6. A green checkmark next to the hook means the first delivery succeeded.

Flags:
  --addr <host:port>      address to listen on (default 0.0.0.0:3000,
                          \":3000\" listens on all interfaces)
  --config <path>         additional configuration file, also read from
                          RECEIVER_CONFIG_FILE

Endpoints:
  POST {endpoint}   webhook deliveries
  GET  /            this page
";

/// Usage text for a receiver listening on `endpoint_path`.
pub(crate) fn render_usage(endpoint_path: &str) -> String {
    USAGE.replace(ENDPOINT_PLACEHOLDER, endpoint_path)
}

/// Serve the usage text.
pub(crate) async fn handle_usage(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_usage(&state.config.webhook.endpoint_path),
    )
}
