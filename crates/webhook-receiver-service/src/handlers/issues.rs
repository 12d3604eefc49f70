//! Label maintenance for `issues` events.
//!
//! The [`IssueLabeler`] applies a [`LabelPolicy`] from configuration:
//!
//! ```yaml
//! labels:
//!   on_opened: ["triage"]
//!   on_closed_remove: ["triage", "in progress"]
//!   rules:
//!     - pattern: "^priority/"
//!       add: ["needs-owner"]
//! ```

use crate::github::LabelApi;
use crate::handlers::InstallationTracker;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use webhook_receiver_core::{EventHandler, HandlerError, IssueAction, IssuesEvent};

// ============================================================================
// Policy
// ============================================================================

/// Label policy as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPolicy {
    /// Labels added when an issue is opened
    pub on_opened: Vec<String>,

    /// Labels removed when an issue is closed
    pub on_closed_remove: Vec<String>,

    /// Labels added in response to another label being added
    pub rules: Vec<LabelRule>,
}

/// When a label matching `pattern` is added, add the `add` labels too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRule {
    pub pattern: String,
    #[serde(default)]
    pub add: Vec<String>,
}

impl LabelPolicy {
    /// Compile every rule pattern.
    pub fn compile(&self) -> Result<Vec<CompiledRule>, regex::Error> {
        self.rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    pattern: Regex::new(&rule.pattern)?,
                    add: rule.add.clone(),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.on_opened.is_empty() && self.on_closed_remove.is_empty() && self.rules.is_empty()
    }
}

/// A [`LabelRule`] with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pattern: Regex,
    add: Vec<String>,
}

/// Label changes derived from one event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LabelChanges {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LabelChanges {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Issues handler applying the configured label policy.
pub struct IssueLabeler {
    policy: LabelPolicy,
    rules: Vec<CompiledRule>,
    labels: Arc<dyn LabelApi>,
    installations: Arc<InstallationTracker>,
}

impl IssueLabeler {
    pub fn new(
        policy: LabelPolicy,
        labels: Arc<dyn LabelApi>,
        installations: Arc<InstallationTracker>,
    ) -> Result<Self, regex::Error> {
        let rules = policy.compile()?;
        Ok(Self {
            policy,
            rules,
            labels,
            installations,
        })
    }

    /// Work out which labels to add and remove for an event.
    ///
    /// Labels the issue already carries are never added again, and only
    /// labels it carries are removed.
    pub fn plan(&self, event: &IssuesEvent) -> LabelChanges {
        let issue = &event.issue;
        let mut changes = LabelChanges::default();

        match event.action {
            IssueAction::Opened => {
                for label in &self.policy.on_opened {
                    push_unique(&mut changes.add, label, |l| !issue.has_label(l));
                }
            }
            IssueAction::Closed => {
                for label in &self.policy.on_closed_remove {
                    push_unique(&mut changes.remove, label, |l| issue.has_label(l));
                }
            }
            IssueAction::Labeled => {
                if let Some(added) = &event.label {
                    for rule in self.rules.iter().filter(|r| r.pattern.is_match(&added.name)) {
                        for label in &rule.add {
                            push_unique(&mut changes.add, label, |l| {
                                l != added.name && !issue.has_label(l)
                            });
                        }
                    }
                }
            }
            _ => {}
        }

        changes
    }
}

fn push_unique(list: &mut Vec<String>, label: &str, keep: impl Fn(&str) -> bool) {
    if keep(label) && !list.iter().any(|l| l == label) {
        list.push(label.to_string());
    }
}

impl std::fmt::Debug for IssueLabeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueLabeler")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventHandler<IssuesEvent> for IssueLabeler {
    async fn handle(&self, event: &IssuesEvent) -> Result<(), HandlerError> {
        let changes = self.plan(event);
        if changes.is_empty() {
            debug!(
                action = %event.action,
                issue = event.issue.number,
                "No label changes for issue event"
            );
            return Ok(());
        }

        let repository = event.repository.as_ref().ok_or_else(|| {
            format!(
                "issues event for #{} has no repository; cannot apply label changes",
                event.issue.number
            )
        })?;
        let owner = repository.owner.login.as_str();
        let installation_id = match event.installation {
            Some(installation) => Some(installation.id),
            None => self.installations.installation_for(owner).await,
        };

        if !changes.add.is_empty() {
            self.labels
                .add_labels(
                    installation_id,
                    owner,
                    &repository.name,
                    event.issue.number,
                    &changes.add,
                )
                .await?;
        }

        for label in &changes.remove {
            self.labels
                .remove_label(
                    installation_id,
                    owner,
                    &repository.name,
                    event.issue.number,
                    label,
                )
                .await?;
        }

        info!(
            repository = %repository.full_name,
            issue = event.issue.number,
            action = %event.action,
            added = ?changes.add,
            removed = ?changes.remove,
            "Applied label policy"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "issues_tests.rs"]
mod tests;
