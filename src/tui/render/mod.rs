pub mod board_view;
pub mod composer;
pub mod overlay;
pub mod stats_panel;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::util::format::{format_hours, format_percent};
use crate::util::unicode::display_width;

use super::app::{App, Mode};

/// Width of the stats panel on the right
pub const STATS_WIDTH: u16 = 32;

/// Main render function: header, board, overlays, status row
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: header (1 row) | content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // board name + totals
            Constraint::Min(1),    // board and stats
            Constraint::Length(1), // status row
        ])
        .split(area);

    render_header(frame, app, chunks[0]);

    let (board_area, stats_area) = split_content(chunks[1], app.show_stats);
    board_view::render_board_view(frame, app, board_area);
    // Overlays follow the cards drawn in this frame
    app.reposition_overlays();
    overlay::render_overlays(frame, app, board_area);
    if let Some(stats_area) = stats_area {
        stats_panel::render_stats_panel(frame, app, stats_area);
    }

    if app.mode == Mode::Compose {
        composer::render_composer(frame, app, chunks[1]);
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// Board area, plus the stats panel area when it is shown and fits
fn split_content(area: Rect, show_stats: bool) -> (Rect, Option<Rect>) {
    if !show_stats || area.width < STATS_WIDTH * 2 {
        return (area, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(STATS_WIDTH)])
        .split(area);
    (chunks[0], Some(chunks[1]))
}

/// Board name on the left, headline totals on the right
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let name = format!(" {}", app.board_name());
    let totals = format!(
        "{} · {} cards · {} estimated ",
        format_hours(app.result.total_estimate_seconds),
        app.result.cards_processed,
        format_percent(app.result.percent_with_time()),
    );

    let mut spans = vec![Span::styled(
        name.clone(),
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )];
    let used = display_width(&name) + display_width(&totals);
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
        spans.push(Span::styled(totals, Style::default().fg(app.theme.text).bg(bg)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        area,
    );
}
