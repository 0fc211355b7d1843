use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::io::board_io::resolve_props;
use crate::model::{CardHandle, IssueRef};
use crate::ops::aggregate::is_closed_column;
use crate::tui::app::App;
use crate::util::format::{format_estimate, format_hours};
use crate::util::unicode::truncate_to_width;

/// Columns are laid out on a fixed grid; one cell of each is a gap
pub const COLUMN_WIDTH: u16 = 26;
/// Bordered card: three content lines
pub const CARD_HEIGHT: u16 = 5;
const HEADER_HEIGHT: u16 = 2;

/// Render the visible columns and record where every drawn card landed
pub fn render_board_view(frame: &mut Frame, app: &mut App, area: Rect) {
    app.layout.clear();
    let bg = app.theme.background;

    let column_count = app.board.columns.len();
    if column_count == 0 {
        let msg = Paragraph::new(Line::from(Span::styled(
            " No columns on this board",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
        frame.render_widget(msg, area);
        return;
    }
    if app.card_scroll.len() != column_count {
        app.card_scroll.resize(column_count, 0);
    }

    let visible_columns = ((area.width / COLUMN_WIDTH).max(1)) as usize;
    keep_in_view(&mut app.column_scroll, app.cursor.column, visible_columns);

    let rows = ((area.height.saturating_sub(HEADER_HEIGHT) / CARD_HEIGHT).max(1)) as usize;
    if let Some(scroll) = app.card_scroll.get_mut(app.cursor.column) {
        keep_in_view(scroll, app.cursor.index, rows);
    }

    let last = column_count.min(app.column_scroll + visible_columns);
    for (slot, column) in (app.column_scroll..last).enumerate() {
        let x = area.x + slot as u16 * COLUMN_WIDTH;
        let width = COLUMN_WIDTH.min(area.right().saturating_sub(x));
        if width < 4 {
            break;
        }
        render_column(frame, app, column, Rect::new(x, area.y, width, area.height), rows);
    }
}

fn card_count(n: usize) -> String {
    if n == 1 {
        "1 card".to_string()
    } else {
        format!("{} cards", n)
    }
}

/// Adjust `scroll` so `cursor` is inside a window of `size` items
fn keep_in_view(scroll: &mut usize, cursor: usize, size: usize) {
    if cursor < *scroll {
        *scroll = cursor;
    } else if cursor >= *scroll + size {
        *scroll = cursor + 1 - size;
    }
}

fn render_column(frame: &mut Frame, app: &mut App, column: usize, area: Rect, rows: usize) {
    let bg = app.theme.background;
    let inner_width = area.width.saturating_sub(1) as usize;
    let title = app.board.columns[column].resolved_title().map(str::to_string);
    let closed = title.as_deref().is_some_and(is_closed_column);

    // Header: title, then "n cards · hours" from the last aggregation
    let title_style = match (&title, closed) {
        (None, _) | (_, true) => Style::default().fg(app.theme.dim).bg(bg),
        _ => Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    };
    let title_text = title.clone().unwrap_or_else(|| "(untitled)".to_string());
    let summary = match title.as_deref().and_then(|t| app.result.board_data.get(t)) {
        Some(agg) => format!(
            "{} · {}",
            card_count(agg.ticket_count),
            format_hours(agg.time_estimate_seconds)
        ),
        None => format!("{} · not counted", card_count(app.column_len(column))),
    };
    let header = vec![
        Line::from(Span::styled(truncate_to_width(&title_text, inner_width), title_style)),
        Line::from(Span::styled(
            truncate_to_width(&summary, inner_width),
            Style::default().fg(app.theme.dim).bg(bg),
        )),
    ];
    frame.render_widget(
        Paragraph::new(header),
        Rect::new(area.x, area.y, area.width, HEADER_HEIGHT.min(area.height)),
    );

    let scroll = app.card_scroll.get(column).copied().unwrap_or(0);
    let len = app.column_len(column);
    for (slot, index) in (scroll..len).take(rows).enumerate() {
        let y = area.y + HEADER_HEIGHT + slot as u16 * CARD_HEIGHT;
        if y + CARD_HEIGHT > area.bottom() {
            break;
        }
        let handle = CardHandle::new(column, index);
        let rect = Rect::new(area.x, y, area.width.saturating_sub(1), CARD_HEIGHT);
        app.layout.insert(handle, rect);
        render_card(frame, app, handle, rect, closed);
    }
}

fn render_card(frame: &mut Frame, app: &App, handle: CardHandle, rect: Rect, closed: bool) {
    let bg = app.theme.background;
    let text_width = rect.width.saturating_sub(2) as usize;
    let issue = app
        .board
        .card(handle)
        .map(|card| resolve_props(&card.props));

    let selected = match &issue {
        Some(Ok(issue)) => app.selection.ordinal_of(&issue.key()).is_some(),
        _ => false,
    };
    let flashing = app.flash.is_some_and(|(card, _)| card == handle);
    let border_color = if flashing {
        app.theme.red
    } else if app.cursor == handle {
        app.theme.highlight
    } else if selected {
        app.theme.selection_border
    } else if closed {
        app.theme.dim
    } else {
        app.theme.text
    };

    let lines = match issue {
        Some(Ok(issue)) => card_lines(app, &issue, text_width, closed),
        _ => vec![Line::from(Span::styled(
            truncate_to_width("(no issue data)", text_width),
            Style::default().fg(app.theme.dim).bg(bg),
        ))],
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).bg(bg));
    if selected {
        block = block.style(Style::default().bg(app.theme.selection_bg));
    }
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// Title, `#id` with estimate, assignees
fn card_lines<'a>(app: &App, issue: &IssueRef, width: usize, closed: bool) -> Vec<Line<'a>> {
    let bg = app.theme.background;
    let text_color = if closed { app.theme.dim } else { app.theme.text_bright };
    let id = format!("#{}", issue.id);
    let estimate = match issue.time_estimate_seconds {
        Some(seconds) => Span::styled(
            format_estimate(seconds),
            Style::default().fg(app.theme.cyan).bg(bg),
        ),
        None => Span::styled("no estimate", Style::default().fg(app.theme.dim).bg(bg)),
    };
    let assignees = if issue.assignees.is_empty() {
        Span::styled("unassigned", Style::default().fg(app.theme.dim).bg(bg))
    } else {
        let names: Vec<&str> = issue
            .assignees
            .iter()
            .map(|a| a.display_name.as_str())
            .collect();
        Span::styled(
            truncate_to_width(&names.join(", "), width),
            Style::default().fg(app.theme.purple).bg(bg),
        )
    };

    vec![
        Line::from(Span::styled(
            truncate_to_width(&issue.title, width),
            Style::default().fg(text_color).bg(bg),
        )),
        Line::from(vec![
            Span::styled(id, Style::default().fg(app.theme.selection_id).bg(bg)),
            Span::styled(" ", Style::default().bg(bg)),
            estimate,
        ]),
        Line::from(assignees),
    ]
}
