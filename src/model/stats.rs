use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved bucket name for cards with no assignees
pub const UNASSIGNED: &str = "Unassigned";

/// Per-column totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAggregate {
    pub title: String,
    pub ticket_count: usize,
    pub time_estimate_seconds: f64,
}

impl ColumnAggregate {
    pub fn new(title: impl Into<String>) -> Self {
        ColumnAggregate {
            title: title.into(),
            ticket_count: 0,
            time_estimate_seconds: 0.0,
        }
    }
}

/// Per-assignee totals. Ticket counts are whole cards, time is the
/// assignee's (possibly fractional) share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeAggregate {
    pub name: String,
    pub ticket_count: usize,
    pub time_estimate_seconds: f64,
}

impl AssigneeAggregate {
    pub fn new(name: impl Into<String>) -> Self {
        AssigneeAggregate {
            name: name.into(),
            ticket_count: 0,
            time_estimate_seconds: 0.0,
        }
    }

    /// Credit one card and `seconds` of time to this assignee
    pub fn credit(&mut self, seconds: f64) {
        self.ticket_count += 1;
        self.time_estimate_seconds += seconds;
    }
}

/// Output of one aggregation pass. Maps keep first-seen order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Global per-assignee totals
    pub assignee_time_map: IndexMap<String, AssigneeAggregate>,
    /// Per-column totals keyed by column title
    pub board_data: IndexMap<String, ColumnAggregate>,
    /// Per-column, per-assignee totals keyed by column title then name
    pub board_assignee_data: IndexMap<String, IndexMap<String, AssigneeAggregate>>,
    pub total_estimate_seconds: f64,
    pub cards_processed: usize,
    pub cards_with_time: usize,
    /// First milestone title seen anywhere on the board
    pub current_milestone: Option<String>,
    pub closed_column_card_count: usize,
}

impl AggregationResult {
    /// Cards outside closed columns
    pub fn open_card_count(&self) -> usize {
        self.cards_processed
            .saturating_sub(self.closed_column_card_count)
    }

    /// Share of processed cards that carry an estimate, 0-100
    pub fn percent_with_time(&self) -> f64 {
        if self.cards_processed == 0 {
            return 0.0;
        }
        self.cards_with_time as f64 * 100.0 / self.cards_processed as f64
    }

    /// Assignee totals within one column, if the column was aggregated
    pub fn column_assignees(&self, title: &str) -> Option<&IndexMap<String, AssigneeAggregate>> {
        self.board_assignee_data.get(title)
    }
}
