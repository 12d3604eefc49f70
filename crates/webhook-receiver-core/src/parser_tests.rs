//! Tests for webhook payload parsing.

use super::*;
use crate::events::{InstallationAction, InstallationRepositoriesAction, IssueAction};

// ============================================================================
// Issues
// ============================================================================

#[test]
fn test_parse_minimal_labeled_issue() {
    let payload = br#"{"action":"labeled","issue":{"number":42},"label":{"name":"bug"}}"#;

    let envelope = parse_event("issues", payload).expect("payload should parse");

    let event = match envelope {
        EventEnvelope::Issues(event) => event,
        other => panic!("expected issues envelope, got {:?}", other),
    };
    assert_eq!(event.action, IssueAction::Labeled);
    assert_eq!(event.issue.number, 42);
    assert_eq!(event.label.map(|l| l.name), Some("bug".to_string()));
    assert!(event.repository.is_none());
}

#[test]
fn test_parse_full_issue_payload_ignores_unknown_fields() {
    let payload = br#"{
        "action": "opened",
        "issue": {
            "number": 7,
            "title": "Crash on start",
            "state": "open",
            "labels": [{"name": "bug", "color": "d73a4a", "default": true}],
            "reactions": {"total_count": 0}
        },
        "repository": {
            "id": 1296269,
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "owner": {"login": "octocat", "id": 1, "type": "User"},
            "private": false
        },
        "installation": {"id": 2311213, "node_id": "MDIzOkludGVncmF0aW9u"},
        "sender": {"login": "octocat", "id": 1},
        "some_future_field": {"nested": [1, 2, 3]}
    }"#;

    let envelope = parse_event("issues", payload).expect("payload should parse");

    let event = match envelope {
        EventEnvelope::Issues(event) => event,
        other => panic!("expected issues envelope, got {:?}", other),
    };
    assert_eq!(event.action, IssueAction::Opened);
    assert_eq!(event.issue.title.as_deref(), Some("Crash on start"));
    assert!(event.issue.has_label("bug"));
    let repository = event.repository.expect("repository should be present");
    assert_eq!(repository.full_name, "octocat/Hello-World");
    assert_eq!(repository.owner.login, "octocat");
    assert_eq!(event.installation.map(|i| i.id), Some(2311213));
}

#[test]
fn test_parse_issue_with_unknown_action() {
    let payload = br#"{"action":"locked","issue":{"number":3}}"#;

    let envelope = parse_event("issues", payload).expect("unknown verbs are not errors");

    match envelope {
        EventEnvelope::Issues(event) => {
            assert_eq!(event.action, IssueAction::Other("locked".to_string()))
        }
        other => panic!("unexpected envelope: {:?}", other),
    }
}

#[test]
fn test_parse_issue_missing_number_is_malformed() {
    let payload = br#"{"action":"opened","issue":{"title":"no number"}}"#;

    let err = parse_event("issues", payload).expect_err("missing issue.number");

    assert_eq!(err.kind(), EventKind::Issues);
}

#[test]
fn test_parse_invalid_json_is_malformed() {
    let err = parse_event("issues", b"{not json").expect_err("invalid json");

    assert!(matches!(err, ParseError::MalformedPayload { .. }));
    assert!(err.to_string().starts_with("malformed issues payload"));
}

#[test]
fn test_parse_empty_body_for_known_kind_is_malformed() {
    assert!(parse_event("installation", b"").is_err());
}

// ============================================================================
// Installations
// ============================================================================

#[test]
fn test_parse_installation_created() {
    let payload = br#"{
        "action": "created",
        "installation": {
            "id": 1,
            "account": {"login": "octo-org", "id": 9, "type": "Organization"},
            "repository_selection": "selected",
            "app_id": 42
        },
        "repositories": [{"id": 5, "name": "widgets", "full_name": "octo-org/widgets"}]
    }"#;

    let envelope = parse_event("installation", payload).expect("payload should parse");

    let event = match envelope {
        EventEnvelope::Installation(event) => event,
        other => panic!("expected installation envelope, got {:?}", other),
    };
    assert_eq!(event.action, InstallationAction::Created);
    assert_eq!(event.installation.id, 1);
    assert_eq!(event.installation.account.login, "octo-org");
    assert_eq!(
        event.installation.account.account_type.as_deref(),
        Some("Organization")
    );
    assert_eq!(event.repositories.map(|r| r.len()), Some(1));
}

#[test]
fn test_parse_installation_repositories_defaults_to_empty_lists() {
    let payload = br#"{
        "action": "removed",
        "installation": {"id": 1, "account": {"login": "octocat"}},
        "repositories_removed": [{"id": 5, "name": "old", "full_name": "octocat/old"}]
    }"#;

    let envelope = parse_event("installation_repositories", payload).expect("should parse");

    let event = match envelope {
        EventEnvelope::InstallationRepositories(event) => event,
        other => panic!("expected installation_repositories envelope, got {:?}", other),
    };
    assert_eq!(event.action, InstallationRepositoriesAction::Removed);
    assert!(event.repositories_added.is_empty());
    assert_eq!(event.repositories_removed[0].full_name, "octocat/old");
}

#[test]
fn test_parse_installation_without_account_is_malformed() {
    let payload = br#"{"action":"created","installation":{"id":1}}"#;

    let err = parse_event("installation", payload).expect_err("account is required");

    assert_eq!(err.kind(), EventKind::Installation);
}

// ============================================================================
// Projects
// ============================================================================

#[test]
fn test_parse_project_card() {
    let payload = br#"{"action":"moved","project_card":{"id":10,"column_id":3,"note":null}}"#;

    let envelope = parse_event("project_card", payload).expect("should parse");

    match envelope {
        EventEnvelope::ProjectCard(event) => {
            assert_eq!(event.action, "moved");
            assert_eq!(event.project_card.column_id, Some(3));
            assert!(event.project_card.note.is_none());
        }
        other => panic!("expected project_card envelope, got {:?}", other),
    }
}

#[test]
fn test_parse_project_column_and_project() {
    let column = parse_event(
        "project_column",
        br#"{"action":"created","project_column":{"id":2,"name":"To do"}}"#,
    )
    .expect("column should parse");
    let project = parse_event(
        "project",
        br#"{"action":"closed","project":{"id":3,"name":"Roadmap","number":1}}"#,
    )
    .expect("project should parse");

    assert_eq!(column.kind(), Some(EventKind::ProjectColumn));
    assert_eq!(project.kind(), Some(EventKind::Project));
}

// ============================================================================
// Unrecognized kinds
// ============================================================================

#[test]
fn test_parse_unknown_kind_is_not_an_error() {
    let envelope = parse_event("push", br#"{"ref":"refs/heads/main"}"#).expect("no error");

    assert!(matches!(envelope, EventEnvelope::Unrecognized(ref name) if name == "push"));
}

#[test]
fn test_parse_unknown_kind_never_decodes_body() {
    let envelope = parse_event("ping", b"\xff\xfe garbage").expect("no error");

    assert_eq!(envelope.kind(), None);
    assert_eq!(envelope.event_type(), "ping");
}
