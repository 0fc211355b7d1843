use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{AggregationResult, AssigneeAggregate};
use crate::ops::command::CommandRegistry;
use crate::ops::history::HistoryEntry;
use crate::ops::selection::SelectionSnapshot;
use crate::util::format::{format_hours, format_percent};
use crate::util::unicode::{display_width, fit_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatsJson<'a> {
    pub board: &'a str,
    #[serde(flatten)]
    pub result: &'a AggregationResult,
}

#[derive(Serialize)]
pub struct CommandInfoJson {
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitJson<'a> {
    pub board: &'a str,
    pub changed: bool,
    pub total_estimate_seconds: f64,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Registered commands with their user-facing patterns
pub fn commands_to_json(registry: &CommandRegistry) -> Vec<CommandInfoJson> {
    registry
        .definitions()
        .map(|def| CommandInfoJson {
            kind: def.kind().to_string(),
            pattern: display_pattern(def.pattern().as_str()).to_string(),
        })
        .collect()
}

/// Strip the multi-line flag every pattern is compiled with
fn display_pattern(pattern: &str) -> &str {
    pattern.strip_prefix("(?m)").unwrap_or(pattern)
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Board statistics as aligned text tables.
/// With `column`, the assignee table is limited to that column.
pub fn format_stats(board: &str, result: &AggregationResult, column: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(board);
    out.push('\n');
    if let Some(milestone) = &result.current_milestone {
        out.push_str(&format!("milestone: {}\n", milestone));
    }
    out.push_str(&format!(
        "total: {} | cards: {} | with time: {} ({}) | closed: {}\n",
        format_hours(result.total_estimate_seconds),
        result.cards_processed,
        result.cards_with_time,
        format_percent(result.percent_with_time()),
        result.closed_column_card_count,
    ));

    out.push_str("\ncolumns:\n");
    let rows: Vec<(&str, usize, f64)> = result
        .board_data
        .values()
        .map(|c| (c.title.as_str(), c.ticket_count, c.time_estimate_seconds))
        .collect();
    push_rows(&mut out, &rows);

    let assignees: Option<&IndexMap<String, AssigneeAggregate>> = match column {
        Some(title) => result.column_assignees(title),
        None => Some(&result.assignee_time_map),
    };
    match (column, assignees) {
        (Some(title), Some(_)) => out.push_str(&format!("\nassignees in {}:\n", title)),
        (Some(title), None) => {
            out.push_str(&format!("\nno column named '{}'\n", title));
            return out;
        }
        (None, _) => out.push_str("\nassignees:\n"),
    }
    let rows: Vec<(&str, usize, f64)> = assignees
        .map(|map| {
            map.values()
                .map(|a| (a.name.as_str(), a.ticket_count, a.time_estimate_seconds))
                .collect()
        })
        .unwrap_or_default();
    push_rows(&mut out, &rows);
    out
}

fn push_rows(out: &mut String, rows: &[(&str, usize, f64)]) {
    if rows.is_empty() {
        out.push_str("  (none)\n");
        return;
    }
    let name_width = rows
        .iter()
        .map(|(name, _, _)| display_width(name))
        .max()
        .unwrap_or(0);
    for (name, count, seconds) in rows {
        out.push_str(&format!(
            "  {}  {:>3} {}  {}\n",
            fit_to_width(name, name_width),
            count,
            if *count == 1 { "card " } else { "cards" },
            format_hours(*seconds),
        ));
    }
}

pub fn format_commands(registry: &CommandRegistry) -> String {
    let width = registry.kinds().map(display_width).max().unwrap_or(0);
    let mut out = String::new();
    for def in registry.definitions() {
        out.push_str(&format!(
            "{}  {}\n",
            fit_to_width(def.kind(), width),
            display_pattern(def.pattern().as_str())
        ));
    }
    out
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "no history recorded\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}  {:>8}  {} cards ({} with time)\n",
            entry.recorded_at.format("%Y-%m-%d %H:%M"),
            format_hours(entry.total_estimate_seconds),
            entry.cards_processed,
            entry.cards_with_time,
        ));
    }
    out
}

pub fn format_selection(snapshot: &SelectionSnapshot) -> String {
    if snapshot.is_empty() {
        return "nothing selected\n".to_string();
    }
    let mut out = String::new();
    for (i, issue) in snapshot.issues.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}  {}\n", i + 1, issue.key(), issue.title));
    }
    out
}
