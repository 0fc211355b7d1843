//! Read-only access to the host's rendered board.
//!
//! The engines in `ops` never look at how a board is drawn. They walk it
//! through `TreeQuery`, turn cards into issues through `IssueResolver`, and
//! ask `CardGeometry` where a card currently sits on screen.

use ratatui::layout::Rect;

use crate::model::IssueRef;

/// Why a card could not be turned into an `IssueRef`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The card carries no issue at all
    #[error("card does not reference an issue")]
    Unresolvable,
    /// The card references an issue, but its data is not usable
    #[error("malformed issue data: {0}")]
    Malformed(String),
}

/// Structural access to columns and cards
pub trait TreeQuery {
    type Column;
    type Card;

    /// Columns in display order
    fn columns(&self) -> Vec<Self::Column>;
    /// Cards of one column in display order
    fn cards(&self, column: &Self::Column) -> Vec<Self::Card>;
    /// The column's title, or `None` when it cannot be determined
    fn title(&self, column: &Self::Column) -> Option<String>;
}

/// Resolves a rendered card to its issue. Must not mutate host state.
pub trait IssueResolver<C> {
    fn resolve(&self, card: &C) -> Result<IssueRef, ResolveError>;
}

/// Current on-screen placement of a card
pub trait CardGeometry<C> {
    /// `None` when the card is not visible right now
    fn bounds(&self, card: &C) -> Option<Rect>;
}

/// All rendered cards in display order, column by column
pub fn all_cards<T: TreeQuery>(tree: &T) -> Vec<T::Card> {
    tree.columns()
        .iter()
        .flat_map(|column| tree.cards(column))
        .collect()
}
