//! Multi-card selection that survives board re-renders.
//!
//! The selected set is a list of `IssueRef`s keyed by `(id, scope_path)`.
//! Overlay bindings tie the set to whichever cards are rendered right now and
//! are thrown away and rebuilt whenever the board changes.

use ratatui::layout::Rect;
use serde::Serialize;

use crate::model::{IssueKey, IssueRef};
use crate::ops::tree::{CardGeometry, IssueResolver, ResolveError, TreeQuery};

/// Selection session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Selecting,
}

/// An overlay drawn over one rendered card during a session
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBinding<C> {
    pub card: C,
    /// Identity of the card's issue, `None` if the card did not resolve
    pub issue: Option<IssueKey>,
    /// Where to draw, `None` while the card is off-screen
    pub rect: Option<Rect>,
    /// 1-based position in the selection, if the issue is selected
    pub ordinal: Option<usize>,
}

/// Result of toggling a card
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// Appended to the selection at this 1-based position
    Selected { ordinal: usize },
    /// Removed; remaining ordinals were renumbered
    Deselected,
    /// The card did not resolve. Nothing changed; callers should flash it.
    Failed(ResolveError),
    /// Not in a selection session
    Ignored,
}

/// Ordered selection handed to bulk actions when a session ends
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    pub issues: Vec<IssueRef>,
}

impl SelectionSnapshot {
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController<C> {
    state: SelectionState,
    selected: Vec<IssueRef>,
    overlays: Vec<OverlayBinding<C>>,
}

impl<C> Default for SelectionController<C> {
    fn default() -> Self {
        SelectionController {
            state: SelectionState::Idle,
            selected: Vec::new(),
            overlays: Vec::new(),
        }
    }
}

impl<C: Clone + PartialEq> SelectionController<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_selecting(&self) -> bool {
        self.state == SelectionState::Selecting
    }

    /// Selected issues in insertion order
    pub fn selected(&self) -> &[IssueRef] {
        &self.selected
    }

    /// Live overlay bindings (empty outside a session)
    pub fn overlays(&self) -> &[OverlayBinding<C>] {
        &self.overlays
    }

    /// 1-based position of an issue in the selection
    pub fn ordinal_of(&self, key: &IssueKey) -> Option<usize> {
        self.selected
            .iter()
            .position(|i| i.matches_key(key))
            .map(|p| p + 1)
    }

    /// The overlay bound to a card, if any
    pub fn overlay_for(&self, card: &C) -> Option<&OverlayBinding<C>> {
        self.overlays.iter().find(|o| &o.card == card)
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            issues: self.selected.clone(),
        }
    }

    /// Enter a session. Any selection left over from an earlier session is
    /// kept and shows up pre-selected on the new overlays.
    pub fn start_selection<H>(&mut self, host: &H)
    where
        H: TreeQuery<Card = C> + IssueResolver<C> + CardGeometry<C>,
    {
        self.state = SelectionState::Selecting;
        self.build_overlays(host);
        tracing::debug!(
            overlays = self.overlays.len(),
            carried = self.selected.len(),
            "selection started"
        );
    }

    /// Rebuild overlays after the board re-rendered. No-op when idle.
    pub fn rebind<H>(&mut self, host: &H)
    where
        H: TreeQuery<Card = C> + IssueResolver<C> + CardGeometry<C>,
    {
        if self.state == SelectionState::Idle {
            return;
        }
        self.build_overlays(host);
    }

    fn build_overlays<H>(&mut self, host: &H)
    where
        H: TreeQuery<Card = C> + IssueResolver<C> + CardGeometry<C>,
    {
        self.overlays.clear();
        for column in host.columns() {
            for card in host.cards(&column) {
                let issue = host.resolve(&card).ok().map(|i| i.key());
                let rect = host.bounds(&card);
                self.overlays.push(OverlayBinding {
                    card,
                    issue,
                    rect,
                    ordinal: None,
                });
            }
        }
        self.renumber();
    }

    /// Add the card's issue to the selection, or remove it if present.
    pub fn toggle<H>(&mut self, host: &H, card: &C) -> ToggleOutcome
    where
        H: IssueResolver<C> + CardGeometry<C>,
    {
        if self.state == SelectionState::Idle {
            return ToggleOutcome::Ignored;
        }

        let issue = match host.resolve(card) {
            Ok(issue) => issue,
            Err(e) => {
                tracing::debug!(error = %e, "cannot select card");
                return ToggleOutcome::Failed(e);
            }
        };
        let key = issue.key();

        // Bind an overlay for cards rendered after the session started
        match self.overlays.iter_mut().find(|o| &o.card == card) {
            Some(overlay) => overlay.issue = Some(key.clone()),
            None => self.overlays.push(OverlayBinding {
                card: card.clone(),
                issue: Some(key.clone()),
                rect: host.bounds(card),
                ordinal: None,
            }),
        }

        let outcome = match self.selected.iter().position(|i| i.matches_key(&key)) {
            Some(pos) => {
                self.selected.remove(pos);
                ToggleOutcome::Deselected
            }
            None => {
                self.selected.push(issue);
                ToggleOutcome::Selected {
                    ordinal: self.selected.len(),
                }
            }
        };
        self.renumber();
        outcome
    }

    /// Leave the session. Overlays are dropped; the selection is kept until
    /// `clear` is called. Returns the selection for bulk actions.
    pub fn exit_selection(&mut self) -> SelectionSnapshot {
        self.state = SelectionState::Idle;
        self.overlays.clear();
        tracing::debug!(selected = self.selected.len(), "selection finished");
        self.snapshot()
    }

    /// Recompute overlay rectangles from the cards' current positions.
    /// Touches nothing but rectangles, so it can run on every scroll/resize.
    pub fn reposition<H: CardGeometry<C>>(&mut self, host: &H) {
        if self.state == SelectionState::Idle {
            return;
        }
        for overlay in &mut self.overlays {
            overlay.rect = host.bounds(&overlay.card);
        }
    }

    /// Drop every selected issue
    pub fn clear(&mut self) {
        self.selected.clear();
        self.renumber();
    }

    /// Keep overlay ordinals contiguous and in insertion order
    fn renumber(&mut self) {
        let selected = &self.selected;
        for overlay in &mut self.overlays {
            overlay.ordinal = overlay.issue.as_ref().and_then(|key| {
                selected
                    .iter()
                    .position(|i| i.matches_key(key))
                    .map(|p| p + 1)
            });
        }
    }
}
