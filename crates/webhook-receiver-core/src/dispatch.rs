//! Event dispatch table.
//!
//! The [`DispatchTable`] holds one optional handler per known event kind.
//! An empty slot means the kind is ignored on purpose, so dispatching an event
//! with no handler is a successful no-op rather than an error.
//!
//! # Examples
//!
//! ```rust
//! use webhook_receiver_core::{DispatchTable, EventHandler, HandlerError, IssuesEvent};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct LogIssues;
//!
//! #[async_trait]
//! impl EventHandler<IssuesEvent> for LogIssues {
//!     async fn handle(&self, event: &IssuesEvent) -> Result<(), HandlerError> {
//!         println!("issue #{} {}", event.issue.number, event.action);
//!         Ok(())
//!     }
//! }
//!
//! let table = DispatchTable::new().with_issues_handler(Arc::new(LogIssues));
//! assert!(table.has_handler(webhook_receiver_core::EventKind::Issues));
//! ```

use crate::events::{
    EventEnvelope, EventKind, InstallationEvent, InstallationRepositoriesEvent, IssuesEvent,
    ProjectCardEvent, ProjectColumnEvent, ProjectEvent,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Error type returned by event handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Application-provided processing for one payload type.
///
/// Handlers run inside the request that delivered the event. When the
/// webhook sender disconnects the request future is dropped, which cancels
/// any remote call the handler is awaiting.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    /// Handle a decoded event.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Event processed successfully
    /// * `Err(e)` - Processing failed; the delivery is answered with an error
    async fn handle(&self, event: &E) -> Result<(), HandlerError>;
}

/// Result of dispatching an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler registered for this kind ran successfully.
    Handled(EventKind),

    /// No handler was registered, or the kind is not recognized.
    Ignored,
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The registered handler returned an error.
    #[error("{kind} handler failed: {source}")]
    HandlerFailed {
        kind: EventKind,
        #[source]
        source: HandlerError,
    },
}

type Slot<E> = Option<Arc<dyn EventHandler<E>>>;

/// Mapping from event kind to an optional handler.
///
/// Built once at startup and shared read-only afterwards; cloning is cheap.
#[derive(Clone, Default)]
pub struct DispatchTable {
    issues: Slot<IssuesEvent>,
    installation: Slot<InstallationEvent>,
    installation_repositories: Slot<InstallationRepositoriesEvent>,
    project_card: Slot<ProjectCardEvent>,
    project_column: Slot<ProjectColumnEvent>,
    project: Slot<ProjectEvent>,
}

impl DispatchTable {
    /// Create a table with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `issues` events.
    pub fn with_issues_handler(mut self, handler: Arc<dyn EventHandler<IssuesEvent>>) -> Self {
        self.issues = Some(handler);
        self
    }

    /// Register the handler for `installation` events.
    pub fn with_installation_handler(
        mut self,
        handler: Arc<dyn EventHandler<InstallationEvent>>,
    ) -> Self {
        self.installation = Some(handler);
        self
    }

    /// Register the handler for `installation_repositories` events.
    pub fn with_installation_repositories_handler(
        mut self,
        handler: Arc<dyn EventHandler<InstallationRepositoriesEvent>>,
    ) -> Self {
        self.installation_repositories = Some(handler);
        self
    }

    /// Register the handler for `project_card` events.
    pub fn with_project_card_handler(
        mut self,
        handler: Arc<dyn EventHandler<ProjectCardEvent>>,
    ) -> Self {
        self.project_card = Some(handler);
        self
    }

    /// Register the handler for `project_column` events.
    pub fn with_project_column_handler(
        mut self,
        handler: Arc<dyn EventHandler<ProjectColumnEvent>>,
    ) -> Self {
        self.project_column = Some(handler);
        self
    }

    /// Register the handler for `project` events.
    pub fn with_project_handler(mut self, handler: Arc<dyn EventHandler<ProjectEvent>>) -> Self {
        self.project = Some(handler);
        self
    }

    /// Check whether a handler is registered for `kind`.
    pub fn has_handler(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Issues => self.issues.is_some(),
            EventKind::Installation => self.installation.is_some(),
            EventKind::InstallationRepositories => self.installation_repositories.is_some(),
            EventKind::ProjectCard => self.project_card.is_some(),
            EventKind::ProjectColumn => self.project_column.is_some(),
            EventKind::Project => self.project.is_some(),
        }
    }

    /// Kinds that currently have a handler registered.
    pub fn registered_kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.has_handler(*kind))
            .collect()
    }

    /// Invoke the handler registered for the envelope's kind.
    ///
    /// At most one handler runs. Unrecognized envelopes and kinds without a
    /// handler return [`DispatchOutcome::Ignored`] without side effects.
    pub async fn dispatch(
        &self,
        envelope: &EventEnvelope,
    ) -> Result<DispatchOutcome, DispatchError> {
        match envelope {
            EventEnvelope::Issues(event) => invoke(EventKind::Issues, &self.issues, event).await,
            EventEnvelope::Installation(event) => {
                invoke(EventKind::Installation, &self.installation, event).await
            }
            EventEnvelope::InstallationRepositories(event) => {
                invoke(
                    EventKind::InstallationRepositories,
                    &self.installation_repositories,
                    event,
                )
                .await
            }
            EventEnvelope::ProjectCard(event) => {
                invoke(EventKind::ProjectCard, &self.project_card, event).await
            }
            EventEnvelope::ProjectColumn(event) => {
                invoke(EventKind::ProjectColumn, &self.project_column, event).await
            }
            EventEnvelope::Project(event) => {
                invoke(EventKind::Project, &self.project, event).await
            }
            EventEnvelope::Unrecognized(name) => {
                debug!(event_type = %name, "Ignoring unrecognized event type");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }
}

async fn invoke<E>(
    kind: EventKind,
    slot: &Slot<E>,
    event: &E,
) -> Result<DispatchOutcome, DispatchError> {
    let handler = match slot {
        Some(handler) => handler,
        None => {
            debug!(event_type = %kind, "No handler registered; ignoring event");
            return Ok(DispatchOutcome::Ignored);
        }
    };

    handler
        .handle(event)
        .await
        .map(|()| DispatchOutcome::Handled(kind))
        .map_err(|source| DispatchError::HandlerFailed { kind, source })
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("registered", &self.registered_kinds())
            .finish()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
