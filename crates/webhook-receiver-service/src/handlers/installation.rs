//! Installation bookkeeping.
//!
//! Keeps an in-memory view of the App installations this receiver has been
//! told about, keyed by account login. The issue handler falls back to it for
//! the installation id when a payload does not carry one.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};
use webhook_receiver_core::{
    EventHandler, HandlerError, InstallationAction, InstallationEvent,
    InstallationRepositoriesAction, InstallationRepositoriesEvent,
};

/// What is known about one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRecord {
    pub installation_id: u64,
    /// Full names (`owner/name`) of repositories the installation can access
    pub repositories: BTreeSet<String>,
}

/// Registry of installations fed by `installation` and
/// `installation_repositories` events.
#[derive(Debug, Default)]
pub struct InstallationTracker {
    installations: RwLock<HashMap<String, InstallationRecord>>,
}

impl InstallationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installation id for an account login.
    pub async fn installation_for(&self, account: &str) -> Option<u64> {
        self.installations
            .read()
            .await
            .get(account)
            .map(|r| r.installation_id)
    }
}

#[async_trait]
impl EventHandler<InstallationEvent> for InstallationTracker {
    async fn handle(&self, event: &InstallationEvent) -> Result<(), HandlerError> {
        let account = event.installation.account.login.clone();
        let installation_id = event.installation.id;

        match event.action {
            InstallationAction::Created
            | InstallationAction::Unsuspend
            | InstallationAction::NewPermissionsAccepted => {
                let mut installations = self.installations.write().await;
                let record = installations
                    .entry(account.clone())
                    .or_insert_with(|| InstallationRecord {
                        installation_id,
                        repositories: BTreeSet::new(),
                    });
                record.installation_id = installation_id;
                if let Some(repositories) = &event.repositories {
                    record
                        .repositories
                        .extend(repositories.iter().map(|r| r.full_name.clone()));
                }

                info!(
                    account = %account,
                    installation_id,
                    action = %event.action,
                    repositories = record.repositories.len(),
                    "Installation recorded"
                );
            }
            InstallationAction::Deleted | InstallationAction::Suspend => {
                let mut installations = self.installations.write().await;
                let removed = installations.remove(&account);
                info!(
                    account = %account,
                    installation_id,
                    action = %event.action,
                    known = removed.is_some(),
                    remaining = installations.len(),
                    "Installation forgotten"
                );
            }
            InstallationAction::Other => {
                debug!(account = %account, "Ignoring installation action");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler<InstallationRepositoriesEvent> for InstallationTracker {
    async fn handle(&self, event: &InstallationRepositoriesEvent) -> Result<(), HandlerError> {
        let account = event.installation.account.login.clone();
        let installation_id = event.installation.id;

        if event.action == InstallationRepositoriesAction::Other {
            debug!(account = %account, "Ignoring installation_repositories action");
            return Ok(());
        }

        let mut installations = self.installations.write().await;
        let record = installations
            .entry(account.clone())
            .or_insert_with(|| InstallationRecord {
                installation_id,
                repositories: BTreeSet::new(),
            });
        record.installation_id = installation_id;

        match event.action {
            InstallationRepositoriesAction::Added => {
                for repository in &event.repositories_added {
                    record.repositories.insert(repository.full_name.clone());
                }
            }
            InstallationRepositoriesAction::Removed => {
                for repository in &event.repositories_removed {
                    record.repositories.remove(&repository.full_name);
                }
            }
            InstallationRepositoriesAction::Other => {}
        }

        info!(
            account = %account,
            installation_id,
            action = %event.action,
            added = event.repositories_added.len(),
            removed = event.repositories_removed.len(),
            repositories = record.repositories.len(),
            "Installation repositories updated"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;
