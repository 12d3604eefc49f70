//! # Webhook Receiver Core
//!
//! Verification and dispatch core for GitHub webhook deliveries.
//!
//! This crate provides:
//! - HMAC-SHA256 signature verification of raw request bodies
//! - Typed decoding of the event kinds the receiver understands
//! - A dispatch table with one optional handler slot per event kind
//!
//! The HTTP surface lives in `webhook-receiver-api`; business logic lives
//! behind the [`EventHandler`] trait.
//!
//! # Examples
//!
//! ```rust
//! use webhook_receiver_core::{
//!     compute_signature, format_signature_header, parse_event, verify_signature,
//!     DispatchTable, EventEnvelope, WebhookSecret,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let secret = WebhookSecret::new("It's a Secret to Everybody");
//! let body = br#"{"action":"opened","issue":{"number":1}}"#;
//! let header = format_signature_header(&compute_signature(&secret, body));
//!
//! assert!(verify_signature(&secret, body, Some(&header)));
//!
//! let envelope = parse_event("issues", body)?;
//! assert!(matches!(envelope, EventEnvelope::Issues(_)));
//!
//! // An empty table ignores every event
//! let table = DispatchTable::new();
//! let outcome = table.dispatch(&envelope).await?;
//! assert!(!outcome.is_handled());
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod events;
pub mod parser;
pub mod secret;
pub mod signature;

pub use dispatch::{DispatchError, DispatchOutcome, DispatchTable, EventHandler, HandlerError};
pub use events::{
    Account, EventEnvelope, EventKind, Installation, InstallationAction, InstallationEvent,
    InstallationRef, InstallationRepositoriesAction, InstallationRepositoriesEvent, Issue,
    IssueAction, IssuesEvent, Label, Project, ProjectCard, ProjectCardEvent, ProjectColumn,
    ProjectColumnEvent, ProjectEvent, Repository, RepositoryRef, Sender,
};
pub use parser::{parse_event, ParseError};
pub use secret::{SecretString, WebhookSecret};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
    SIGNATURE_PREFIX,
};
