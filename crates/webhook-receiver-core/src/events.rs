//! Typed GitHub webhook events.
//!
//! Only the fields the receiver acts on are declared. Unknown JSON fields are
//! ignored so that additions to GitHub's payloads never break decoding, and
//! unknown action verbs decode to an `Other` variant.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Event Kinds
// ============================================================================

/// The event kinds the receiver knows how to decode.
///
/// The value of the `X-GitHub-Event` header selects the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Issues,
    Installation,
    InstallationRepositories,
    ProjectCard,
    ProjectColumn,
    Project,
}

impl EventKind {
    /// Every known kind, in header-name order.
    pub const ALL: [EventKind; 6] = [
        Self::Installation,
        Self::InstallationRepositories,
        Self::Issues,
        Self::Project,
        Self::ProjectCard,
        Self::ProjectColumn,
    ];

    /// Map an `X-GitHub-Event` header value to a known kind.
    ///
    /// Matching is exact; GitHub always sends lower-case snake_case names.
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "issues" => Some(Self::Issues),
            "installation" => Some(Self::Installation),
            "installation_repositories" => Some(Self::InstallationRepositories),
            "project_card" => Some(Self::ProjectCard),
            "project_column" => Some(Self::ProjectColumn),
            "project" => Some(Self::Project),
            _ => None,
        }
    }

    /// The header value GitHub uses for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Installation => "installation",
            Self::InstallationRepositories => "installation_repositories",
            Self::ProjectCard => "project_card",
            Self::ProjectColumn => "project_column",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A decoded webhook delivery.
///
/// `Unrecognized` carries the raw header value of kinds the receiver does not
/// decode; dispatching it is always a no-op.
#[derive(Debug, Clone)]
pub enum EventEnvelope {
    Issues(IssuesEvent),
    Installation(InstallationEvent),
    InstallationRepositories(InstallationRepositoriesEvent),
    ProjectCard(ProjectCardEvent),
    ProjectColumn(ProjectColumnEvent),
    Project(ProjectEvent),
    Unrecognized(String),
}

impl EventEnvelope {
    /// The known kind of this envelope, if any.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::Issues(_) => Some(EventKind::Issues),
            Self::Installation(_) => Some(EventKind::Installation),
            Self::InstallationRepositories(_) => Some(EventKind::InstallationRepositories),
            Self::ProjectCard(_) => Some(EventKind::ProjectCard),
            Self::ProjectColumn(_) => Some(EventKind::ProjectColumn),
            Self::Project(_) => Some(EventKind::Project),
            Self::Unrecognized(_) => None,
        }
    }

    /// The event type name, as sent in the `X-GitHub-Event` header.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Unrecognized(name) => name,
            known => known.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Shared Entities
// ============================================================================

/// A label as it appears in issue payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,

    #[serde(default)]
    pub color: Option<String>,
}

/// Repository the event occurred in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Account,
}

/// Abbreviated repository as listed in installation payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub id: u64,
    pub name: String,
    pub full_name: String,
}

/// A user or organization account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,

    #[serde(default)]
    pub id: Option<u64>,

    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

/// The user who triggered the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub login: String,

    #[serde(default)]
    pub id: Option<u64>,
}

/// The app installation that a delivery belongs to.
///
/// Events delivered to a GitHub App carry only the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationRef {
    pub id: u64,
}

// ============================================================================
// Issues
// ============================================================================

/// `issues` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuesEvent {
    pub action: IssueAction,
    pub issue: Issue,

    /// The label added or removed; present on `labeled`/`unlabeled`.
    #[serde(default)]
    pub label: Option<Label>,

    #[serde(default)]
    pub repository: Option<Repository>,

    #[serde(default)]
    pub installation: Option<InstallationRef>,

    #[serde(default)]
    pub sender: Option<Sender>,
}

/// Issue details carried by an `issues` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Issue {
    /// Check whether the issue currently carries a label.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

/// Actions that can occur on issues.
///
/// Verbs without a variant decode to [`IssueAction::Other`], which keeps the
/// verb as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueAction {
    Opened,
    Edited,
    Deleted,
    Closed,
    Reopened,
    Assigned,
    Unassigned,
    Labeled,
    Unlabeled,
    Transferred,
    Pinned,
    Unpinned,
    Milestoned,
    Demilestoned,
    Other(String),
}

impl IssueAction {
    /// The wire name of the action.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Edited => "edited",
            Self::Deleted => "deleted",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::Labeled => "labeled",
            Self::Unlabeled => "unlabeled",
            Self::Transferred => "transferred",
            Self::Pinned => "pinned",
            Self::Unpinned => "unpinned",
            Self::Milestoned => "milestoned",
            Self::Demilestoned => "demilestoned",
            Self::Other(verb) => verb,
        }
    }

    fn known(verb: &str) -> Option<Self> {
        let action = match verb {
            "opened" => Self::Opened,
            "edited" => Self::Edited,
            "deleted" => Self::Deleted,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            "assigned" => Self::Assigned,
            "unassigned" => Self::Unassigned,
            "labeled" => Self::Labeled,
            "unlabeled" => Self::Unlabeled,
            "transferred" => Self::Transferred,
            "pinned" => Self::Pinned,
            "unpinned" => Self::Unpinned,
            "milestoned" => Self::Milestoned,
            "demilestoned" => Self::Demilestoned,
            _ => return None,
        };
        Some(action)
    }
}

impl From<String> for IssueAction {
    fn from(verb: String) -> Self {
        Self::known(&verb).unwrap_or_else(|| Self::Other(verb))
    }
}

impl From<IssueAction> for String {
    fn from(action: IssueAction) -> Self {
        match action {
            IssueAction::Other(verb) => verb,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Installations
// ============================================================================

/// `installation` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationEvent {
    pub action: InstallationAction,
    pub installation: Installation,

    /// Repositories accessible to the installation; present on `created`.
    #[serde(default)]
    pub repositories: Option<Vec<RepositoryRef>>,

    #[serde(default)]
    pub sender: Option<Sender>,
}

/// Full installation details from installation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: u64,
    pub account: Account,

    #[serde(default)]
    pub repository_selection: Option<String>,

    #[serde(default)]
    pub app_id: Option<u64>,
}

/// Actions that can occur on an app installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationAction {
    Created,
    Deleted,
    Suspend,
    Unsuspend,
    NewPermissionsAccepted,
    #[serde(other)]
    Other,
}

impl fmt::Display for InstallationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Suspend => "suspend",
            Self::Unsuspend => "unsuspend",
            Self::NewPermissionsAccepted => "new_permissions_accepted",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// `installation_repositories` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationRepositoriesEvent {
    pub action: InstallationRepositoriesAction,
    pub installation: Installation,

    #[serde(default)]
    pub repository_selection: Option<String>,

    #[serde(default)]
    pub repositories_added: Vec<RepositoryRef>,

    #[serde(default)]
    pub repositories_removed: Vec<RepositoryRef>,

    #[serde(default)]
    pub sender: Option<Sender>,
}

/// Actions that change the set of repositories an installation can access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationRepositoriesAction {
    Added,
    Removed,
    #[serde(other)]
    Other,
}

impl fmt::Display for InstallationRepositoriesAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Projects (classic)
// ============================================================================

/// `project_card` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCardEvent {
    pub action: String,
    pub project_card: ProjectCard,

    #[serde(default)]
    pub repository: Option<Repository>,

    #[serde(default)]
    pub installation: Option<InstallationRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCard {
    pub id: u64,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub column_id: Option<u64>,

    /// API URL of the issue or pull request the card refers to.
    #[serde(default)]
    pub content_url: Option<String>,
}

/// `project_column` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectColumnEvent {
    pub action: String,
    pub project_column: ProjectColumn,

    #[serde(default)]
    pub repository: Option<Repository>,

    #[serde(default)]
    pub installation: Option<InstallationRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectColumn {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,
}

/// `project` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEvent {
    pub action: String,
    pub project: Project,

    #[serde(default)]
    pub repository: Option<Repository>,

    #[serde(default)]
    pub installation: Option<InstallationRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub number: Option<u64>,

    #[serde(default)]
    pub state: Option<String>,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
