use crate::model::{AggregationResult, AssigneeAggregate, ColumnAggregate, IssueRef, UNASSIGNED};
use crate::ops::tree::{IssueResolver, ResolveError, TreeQuery};

/// Lowercase substrings that mark a column as closed.
/// Matching is by substring, so "Undone" is closed too.
pub const CLOSED_KEYWORDS: [&str; 4] = ["done", "closed", "complete", "finished"];

/// Whether a column title marks a closed column
pub fn is_closed_column(title: &str) -> bool {
    let lower = title.to_lowercase();
    CLOSED_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Walk every column and card once and total up time estimates.
///
/// The pass is best-effort: a card that fails to resolve is still counted as
/// processed and the walk carries on. Columns without a usable title are
/// skipped together with their cards.
pub fn aggregate<T>(tree: &T) -> AggregationResult
where
    T: TreeQuery + IssueResolver<T::Card>,
{
    let mut result = AggregationResult::default();
    let mut skipped_columns = 0usize;

    for column in tree.columns() {
        let title = match tree
            .title(&column)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
        {
            Some(t) => t,
            None => {
                skipped_columns += 1;
                tracing::debug!("skipping column with no resolvable title");
                continue;
            }
        };
        let closed = is_closed_column(&title);

        result
            .board_data
            .entry(title.clone())
            .or_insert_with(|| ColumnAggregate::new(title.clone()));
        result
            .board_assignee_data
            .entry(title.clone())
            .or_default();

        for card in tree.cards(&column) {
            result.cards_processed += 1;
            if let Some(col) = result.board_data.get_mut(&title) {
                col.ticket_count += 1;
            }
            if closed {
                result.closed_column_card_count += 1;
            }

            match tree.resolve(&card) {
                Ok(issue) => credit_issue(&mut result, &title, &issue),
                Err(ResolveError::Unresolvable) => {
                    tracing::debug!(column = %title, "card does not resolve to an issue");
                }
                Err(e) => {
                    tracing::warn!(column = %title, error = %e, "skipping card");
                }
            }
        }
    }

    tracing::debug!(
        cards = result.cards_processed,
        with_time = result.cards_with_time,
        total_seconds = result.total_estimate_seconds,
        skipped_columns,
        "aggregation pass finished"
    );
    result
}

/// Apply one resolved issue to the running totals
fn credit_issue(result: &mut AggregationResult, column: &str, issue: &IssueRef) {
    if result.current_milestone.is_none()
        && let Some(milestone) = &issue.milestone_title
    {
        result.current_milestone = Some(milestone.clone());
    }

    let estimate = match issue.time_estimate_seconds {
        Some(e) if e.is_finite() => e,
        Some(e) => {
            tracing::warn!(issue = %issue.key(), estimate = e, "ignoring non-finite estimate");
            return;
        }
        None => return,
    };

    result.cards_with_time += 1;
    result.total_estimate_seconds += estimate;
    if let Some(col) = result.board_data.get_mut(column) {
        col.time_estimate_seconds += estimate;
    }

    if issue.assignees.is_empty() {
        credit_assignee(result, column, UNASSIGNED, estimate);
        return;
    }

    let share = estimate / issue.assignees.len() as f64;
    for assignee in &issue.assignees {
        credit_assignee(result, column, &assignee.display_name, share);
    }
}

fn credit_assignee(result: &mut AggregationResult, column: &str, name: &str, seconds: f64) {
    result
        .assignee_time_map
        .entry(name.to_string())
        .or_insert_with(|| AssigneeAggregate::new(name))
        .credit(seconds);
    result
        .board_assignee_data
        .entry(column.to_string())
        .or_default()
        .entry(name.to_string())
        .or_insert_with(|| AssigneeAggregate::new(name))
        .credit(seconds);
}
