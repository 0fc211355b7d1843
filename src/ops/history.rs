use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::io::store::{KeyValueStore, StoreError};
use crate::model::{AggregationResult, AssigneeAggregate, ColumnAggregate};

const FLOAT_TOLERANCE: f64 = 1e-6;

/// Error type for history operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored history for '{board}' is unreadable: {source}")]
    Decode {
        board: String,
        source: serde_json::Error,
    },
    #[error("could not encode history for '{board}': {source}")]
    Encode {
        board: String,
        source: serde_json::Error,
    },
}

/// One recorded aggregation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub board: String,
    pub total_estimate_seconds: f64,
    pub cards_processed: usize,
    pub cards_with_time: usize,
    pub closed_column_card_count: usize,
    #[serde(default)]
    pub current_milestone: Option<String>,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnAggregate>,
    #[serde(default)]
    pub assignees: IndexMap<String, AssigneeAggregate>,
}

impl HistoryEntry {
    pub fn from_result(board: &str, result: &AggregationResult, now: DateTime<Utc>) -> Self {
        HistoryEntry {
            recorded_at: now,
            board: board.to_string(),
            total_estimate_seconds: result.total_estimate_seconds,
            cards_processed: result.cards_processed,
            cards_with_time: result.cards_with_time,
            closed_column_card_count: result.closed_column_card_count,
            current_milestone: result.current_milestone.clone(),
            columns: result.board_data.clone(),
            assignees: result.assignee_time_map.clone(),
        }
    }

    /// Equal in everything but the timestamp
    pub fn same_data(&self, other: &HistoryEntry) -> bool {
        self.board == other.board
            && close(self.total_estimate_seconds, other.total_estimate_seconds)
            && self.cards_processed == other.cards_processed
            && self.cards_with_time == other.cards_with_time
            && self.closed_column_card_count == other.closed_column_card_count
            && self.current_milestone == other.current_milestone
            && same_map(&self.columns, &other.columns, |a, b| {
                a.ticket_count == b.ticket_count
                    && close(a.time_estimate_seconds, b.time_estimate_seconds)
            })
            && same_map(&self.assignees, &other.assignees, |a, b| {
                a.ticket_count == b.ticket_count
                    && close(a.time_estimate_seconds, b.time_estimate_seconds)
            })
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_TOLERANCE
}

fn same_map<V>(a: &IndexMap<String, V>, b: &IndexMap<String, V>, eq: impl Fn(&V, &V) -> bool) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, va)| b.get(k).is_some_and(|vb| eq(va, vb)))
}

/// Store key holding a board's history
pub fn history_key(board: &str) -> String {
    format!("history:{}", board)
}

/// All stored entries for a board, oldest first
pub fn load_history<S: KeyValueStore + ?Sized>(
    store: &S,
    board: &str,
) -> Result<Vec<HistoryEntry>, HistoryError> {
    decode(board, store.get(&history_key(board))?)
}

fn decode(board: &str, stored: Option<String>) -> Result<Vec<HistoryEntry>, HistoryError> {
    match stored {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| HistoryError::Decode {
            board: board.to_string(),
            source: e,
        }),
    }
}

/// Append `result` unless it matches the newest stored entry.
/// Keeps at most `limit` entries. Returns whether anything was written.
///
/// The load, append and write happen in one `KeyValueStore::update`, so
/// concurrent commits to a shared store do not drop each other's entries.
pub fn commit<S: KeyValueStore + ?Sized>(
    store: &mut S,
    board: &str,
    result: &AggregationResult,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<bool, HistoryError> {
    let entry = HistoryEntry::from_result(board, result, now);
    let mut failure = None;
    let written = store.update(&history_key(board), &mut |stored: Option<String>| {
        match append(board, stored, &entry, limit) {
            Ok(text) => text,
            Err(e) => {
                failure = Some(e);
                None
            }
        }
    })?;
    match failure {
        Some(e) => Err(e),
        None => Ok(written),
    }
}

/// New stored text with `entry` appended, or `None` if nothing changed
fn append(
    board: &str,
    stored: Option<String>,
    entry: &HistoryEntry,
    limit: usize,
) -> Result<Option<String>, HistoryError> {
    let mut entries = decode(board, stored)?;
    if entries.last().is_some_and(|last| last.same_data(entry)) {
        return Ok(None);
    }

    entries.push(entry.clone());
    let limit = limit.max(1);
    if entries.len() > limit {
        let excess = entries.len() - limit;
        entries.drain(..excess);
    }

    serde_json::to_string(&entries)
        .map(Some)
        .map_err(|e| HistoryError::Encode {
            board: board.to_string(),
            source: e,
        })
}

/// `commit` for timer callbacks: failures are logged, never propagated
pub fn commit_best_effort<S: KeyValueStore + ?Sized>(
    store: &mut S,
    board: &str,
    result: &AggregationResult,
    limit: usize,
) -> bool {
    match commit(store, board, result, limit, Utc::now()) {
        Ok(changed) => {
            tracing::debug!(board, changed, "history commit");
            changed
        }
        Err(e) => {
            tracing::warn!(board, error = %e, "could not save board history");
            false
        }
    }
}
