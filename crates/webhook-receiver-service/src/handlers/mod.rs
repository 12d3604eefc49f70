//! Event handlers registered with the dispatch table.

pub mod installation;
pub mod issues;

pub use installation::InstallationTracker;
pub use issues::{IssueLabeler, LabelPolicy};
