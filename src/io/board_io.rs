use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ratatui::layout::Rect;
use serde_json::Value;

use crate::model::{Assignee, BoardSnapshot, CardHandle, IssueRef};
use crate::ops::tree::{CardGeometry, IssueResolver, ResolveError, TreeQuery};

/// Error type for board snapshot I/O
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("could not read board {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Screen rectangles of the cards drawn in the last frame
pub type CardLayout = HashMap<CardHandle, Rect>;

/// Load a board snapshot from a JSON file
pub fn load_board(path: &Path) -> Result<BoardSnapshot, BoardError> {
    let text = fs::read_to_string(path).map_err(|e| BoardError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| BoardError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read-only view of a snapshot for the engines, optionally with the card
/// layout of the frame currently on screen.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHost<'a> {
    board: &'a BoardSnapshot,
    layout: Option<&'a CardLayout>,
}

impl<'a> SnapshotHost<'a> {
    pub fn new(board: &'a BoardSnapshot) -> Self {
        SnapshotHost {
            board,
            layout: None,
        }
    }

    pub fn with_layout(board: &'a BoardSnapshot, layout: &'a CardLayout) -> Self {
        SnapshotHost {
            board,
            layout: Some(layout),
        }
    }

    pub fn board(&self) -> &'a BoardSnapshot {
        self.board
    }
}

impl TreeQuery for SnapshotHost<'_> {
    type Column = usize;
    type Card = CardHandle;

    fn columns(&self) -> Vec<usize> {
        (0..self.board.columns.len()).collect()
    }

    fn cards(&self, column: &usize) -> Vec<CardHandle> {
        match self.board.columns.get(*column) {
            Some(col) => (0..col.cards.len())
                .map(|i| CardHandle::new(*column, i))
                .collect(),
            None => Vec::new(),
        }
    }

    fn title(&self, column: &usize) -> Option<String> {
        self.board
            .columns
            .get(*column)?
            .resolved_title()
            .map(str::to_string)
    }
}

impl IssueResolver<CardHandle> for SnapshotHost<'_> {
    fn resolve(&self, card: &CardHandle) -> Result<IssueRef, ResolveError> {
        let card = self.board.card(*card).ok_or(ResolveError::Unresolvable)?;
        resolve_props(&card.props)
    }
}

impl CardGeometry<CardHandle> for SnapshotHost<'_> {
    fn bounds(&self, card: &CardHandle) -> Option<Rect> {
        self.layout?.get(card).copied()
    }
}

/// Extract the issue a card's props describe.
///
/// Reads `props.issue`: `id`, `path` (or the part of `referencePath` before
/// `#`), `title`, `timeEstimate` (seconds), `assignees[].name`, and
/// `milestone.title`.
pub fn resolve_props(props: &Value) -> Result<IssueRef, ResolveError> {
    let issue = match props.get("issue") {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => return Err(ResolveError::Unresolvable),
        Some(_) => return Err(ResolveError::Malformed("issue is not an object".into())),
    };

    let id = match issue.get("id") {
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(_) => return Err(ResolveError::Malformed("invalid id".into())),
        None => return Err(ResolveError::Malformed("missing id".into())),
    };

    let scope_path = issue
        .get("path")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().to_string())
        .or_else(|| {
            let reference = issue.get("referencePath")?.as_str()?;
            let scope = reference.split('#').next()?.trim();
            (!scope.is_empty()).then(|| scope.to_string())
        })
        .ok_or_else(|| ResolveError::Malformed("missing project path".into()))?;

    let title = issue
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let time_estimate_seconds = match issue.get("timeEstimate") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(secs) if secs.is_finite() && secs >= 0.0 => Some(secs),
            _ => return Err(ResolveError::Malformed(format!("invalid estimate {}", n))),
        },
        Some(other) => {
            return Err(ResolveError::Malformed(format!(
                "estimate is not a number: {}",
                other
            )));
        }
    };

    let assignees = match issue.get("assignees") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut assignees = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let name = item
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ResolveError::Malformed(format!("assignee {} has no name", i)))?;
                assignees.push(Assignee::new(name));
            }
            assignees
        }
        Some(_) => return Err(ResolveError::Malformed("assignees is not an array".into())),
    };

    let milestone_title = issue
        .get("milestone")
        .and_then(|m| m.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(IssueRef {
        id,
        scope_path,
        title,
        time_estimate_seconds,
        assignees,
        milestone_title,
    })
}
