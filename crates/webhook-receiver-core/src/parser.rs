//! Webhook payload parser.
//!
//! The parser maps the `X-GitHub-Event` header to an [`EventKind`] and decodes
//! the body into the matching typed payload.
//!
//! # Parsing Strategy
//!
//! 1. Unknown event types return [`EventEnvelope::Unrecognized`]; the body is
//!    not decoded at all.
//! 2. Known event types are decoded strictly against their declared fields.
//! 3. Fields not declared by the payload type are ignored.
//!
//! Callers must verify the signature before calling [`parse_event`].

use crate::events::{
    EventEnvelope, EventKind, InstallationEvent, InstallationRepositoriesEvent, IssuesEvent,
    ProjectCardEvent, ProjectColumnEvent, ProjectEvent,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Error type for payload decoding failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON or lacks a required field.
    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// The event kind whose payload failed to decode.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MalformedPayload { kind, .. } => *kind,
        }
    }
}

/// Parse a webhook delivery into a typed envelope.
///
/// # Arguments
///
/// * `event_type` - The value of the `X-GitHub-Event` header
/// * `payload` - The raw, already verified, JSON body
///
/// # Returns
///
/// * `Ok(EventEnvelope::Unrecognized(_))` - Event type the receiver ignores
/// * `Ok(envelope)` - Successfully decoded known event
/// * `Err(ParseError::MalformedPayload)` - Known event with an undecodable body
///
/// # Examples
///
/// ```
/// use webhook_receiver_core::{parse_event, EventEnvelope};
///
/// let payload = br#"{"action":"labeled","issue":{"number":42},"label":{"name":"bug"}}"#;
///
/// match parse_event("issues", payload).unwrap() {
///     EventEnvelope::Issues(event) => assert_eq!(event.issue.number, 42),
///     other => panic!("unexpected envelope: {:?}", other),
/// }
///
/// let ignored = parse_event("push", b"not even json").unwrap();
/// assert!(matches!(ignored, EventEnvelope::Unrecognized(_)));
/// ```
pub fn parse_event(event_type: &str, payload: &[u8]) -> Result<EventEnvelope, ParseError> {
    let kind = match EventKind::from_header(event_type) {
        Some(kind) => kind,
        None => return Ok(EventEnvelope::Unrecognized(event_type.to_string())),
    };

    let envelope = match kind {
        EventKind::Issues => EventEnvelope::Issues(decode::<IssuesEvent>(kind, payload)?),
        EventKind::Installation => {
            EventEnvelope::Installation(decode::<InstallationEvent>(kind, payload)?)
        }
        EventKind::InstallationRepositories => EventEnvelope::InstallationRepositories(
            decode::<InstallationRepositoriesEvent>(kind, payload)?,
        ),
        EventKind::ProjectCard => {
            EventEnvelope::ProjectCard(decode::<ProjectCardEvent>(kind, payload)?)
        }
        EventKind::ProjectColumn => {
            EventEnvelope::ProjectColumn(decode::<ProjectColumnEvent>(kind, payload)?)
        }
        EventKind::Project => EventEnvelope::Project(decode::<ProjectEvent>(kind, payload)?),
    };

    Ok(envelope)
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: &[u8]) -> Result<T, ParseError> {
    serde_json::from_slice(payload).map_err(|source| ParseError::MalformedPayload { kind, source })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
