use serde::{Deserialize, Serialize};

/// A captured board: the rendered column/card tree as the host sees it.
///
/// Cards carry opaque `props`; turning them into an `IssueRef` is the
/// resolver's job, so a snapshot can hold cards that fail to resolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Board display name (used for history keys)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,
}

/// One rendered column (board list)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    /// Header text; absent or blank means the title is unresolvable
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cards: Vec<CardSnapshot>,
}

/// One rendered card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSnapshot {
    /// Component props as exposed by the rendering framework
    #[serde(default)]
    pub props: serde_json::Value,
}

/// Positional handle to a rendered card.
///
/// Handles are only valid for the snapshot they were taken from; every
/// reload produces new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardHandle {
    pub column: usize,
    pub index: usize,
}

impl CardHandle {
    pub fn new(column: usize, index: usize) -> Self {
        CardHandle { column, index }
    }
}

impl BoardSnapshot {
    pub fn card(&self, handle: CardHandle) -> Option<&CardSnapshot> {
        self.columns.get(handle.column)?.cards.get(handle.index)
    }

    /// Total number of rendered cards across all columns
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Display name, falling back to `"board"` for unnamed snapshots
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "board" } else { name }
    }
}

impl ColumnSnapshot {
    /// The trimmed title, or `None` if it is missing or blank
    pub fn resolved_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_titles_are_unresolvable() {
        let col = ColumnSnapshot {
            title: Some("   ".into()),
            cards: vec![],
        };
        assert_eq!(col.resolved_title(), None);
        let col = ColumnSnapshot {
            title: Some(" Doing ".into()),
            cards: vec![],
        };
        assert_eq!(col.resolved_title(), Some("Doing"));
    }

    #[test]
    fn parses_minimal_snapshot() {
        let board: BoardSnapshot =
            serde_json::from_str(r#"{"columns":[{"cards":[{}]},{"title":"Done"}]}"#).unwrap();
        assert_eq!(board.columns.len(), 2);
        assert_eq!(board.card_count(), 1);
        assert!(board.columns[0].cards[0].props.is_null());
        assert_eq!(board.display_name(), "board");
        assert!(board.card(CardHandle::new(0, 0)).is_some());
        assert!(board.card(CardHandle::new(1, 0)).is_none());
    }
}
