//! In-memory board used by the engine tests.

use std::collections::HashSet;

use ratatui::layout::Rect;

use crate::model::{CardHandle, IssueRef};
use crate::ops::tree::{CardGeometry, IssueResolver, ResolveError, TreeQuery};

pub const COLUMN_WIDTH: u16 = 20;
pub const CARD_HEIGHT: u16 = 3;

type FakeCard = Result<IssueRef, ResolveError>;

/// Columns of pre-resolved cards laid out on a fixed grid
#[derive(Debug, Clone, Default)]
pub struct FakeBoard {
    pub columns: Vec<(Option<String>, Vec<FakeCard>)>,
    /// Vertical scroll applied to every card rectangle
    pub scroll: u16,
    /// Cards reported as off-screen
    pub hidden: HashSet<CardHandle>,
}

impl FakeBoard {
    pub fn new() -> Self {
        FakeBoard::default()
    }

    pub fn column(mut self, title: &str, cards: Vec<FakeCard>) -> Self {
        self.columns.push((Some(title.to_string()), cards));
        self
    }

    pub fn untitled_column(mut self, cards: Vec<FakeCard>) -> Self {
        self.columns.push((None, cards));
        self
    }

    pub fn handle_of(&self, id: &str) -> Option<CardHandle> {
        for (c, (_, cards)) in self.columns.iter().enumerate() {
            for (i, card) in cards.iter().enumerate() {
                if matches!(card, Ok(issue) if issue.id == id) {
                    return Some(CardHandle::new(c, i));
                }
            }
        }
        None
    }
}

impl TreeQuery for FakeBoard {
    type Column = usize;
    type Card = CardHandle;

    fn columns(&self) -> Vec<usize> {
        (0..self.columns.len()).collect()
    }

    fn cards(&self, column: &usize) -> Vec<CardHandle> {
        self.columns
            .get(*column)
            .map(|(_, cards)| (0..cards.len()).map(|i| CardHandle::new(*column, i)).collect())
            .unwrap_or_default()
    }

    fn title(&self, column: &usize) -> Option<String> {
        self.columns.get(*column).and_then(|(t, _)| t.clone())
    }
}

impl IssueResolver<CardHandle> for FakeBoard {
    fn resolve(&self, card: &CardHandle) -> Result<IssueRef, ResolveError> {
        self.columns
            .get(card.column)
            .and_then(|(_, cards)| cards.get(card.index))
            .cloned()
            .unwrap_or(Err(ResolveError::Unresolvable))
    }
}

impl CardGeometry<CardHandle> for FakeBoard {
    fn bounds(&self, card: &CardHandle) -> Option<Rect> {
        if self.hidden.contains(card) {
            return None;
        }
        let y = (card.index as u16 * CARD_HEIGHT).checked_sub(self.scroll)?;
        Some(Rect::new(
            card.column as u16 * COLUMN_WIDTH,
            y,
            COLUMN_WIDTH - 2,
            CARD_HEIGHT,
        ))
    }
}
