use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural identity of an issue: `(id, scope_path)`.
///
/// Two cards that resolve to the same key refer to the same issue, no matter
/// which rendered node they were read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueKey {
    /// Opaque issue id (numeric ids are kept in their decimal form)
    pub id: String,
    /// Owning project / namespace path, e.g. `group/app`
    pub scope_path: String,
}

impl IssueKey {
    pub fn new(id: impl Into<String>, scope_path: impl Into<String>) -> Self {
        IssueKey {
            id: id.into(),
            scope_path: scope_path.into(),
        }
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scope_path, self.id)
    }
}

/// A person assigned to an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub display_name: String,
}

impl Assignee {
    pub fn new(display_name: impl Into<String>) -> Self {
        Assignee {
            display_name: display_name.into(),
        }
    }
}

/// Resolved, structured data for the issue behind a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRef {
    pub id: String,
    pub scope_path: String,
    pub title: String,
    /// Estimate in seconds; `None` when the issue has no estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate_seconds: Option<f64>,
    /// Assignees in display order
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_title: Option<String>,
}

impl IssueRef {
    pub fn new(id: impl Into<String>, scope_path: impl Into<String>, title: impl Into<String>) -> Self {
        IssueRef {
            id: id.into(),
            scope_path: scope_path.into(),
            title: title.into(),
            time_estimate_seconds: None,
            assignees: Vec::new(),
            milestone_title: None,
        }
    }

    pub fn with_estimate(mut self, seconds: f64) -> Self {
        self.time_estimate_seconds = Some(seconds);
        self
    }

    pub fn with_assignees<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = names.into_iter().map(Assignee::new).collect();
        self
    }

    pub fn with_milestone(mut self, title: impl Into<String>) -> Self {
        self.milestone_title = Some(title.into());
        self
    }

    /// The identity pair used for selection dedup and removal
    pub fn key(&self) -> IssueKey {
        IssueKey::new(self.id.clone(), self.scope_path.clone())
    }

    /// Whether this issue has the same identity as `other`
    pub fn same_issue(&self, other: &IssueRef) -> bool {
        self.id == other.id && self.scope_path == other.scope_path
    }

    pub fn matches_key(&self, key: &IssueKey) -> bool {
        self.id == key.id && self.scope_path == key.scope_path
    }
}
