use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::command::EditOutcome;
use crate::tui::app::App;
use crate::util::unicode::truncate_to_width;

const POPUP_WIDTH: u16 = 60;
const POPUP_HEIGHT: u16 = 14;

/// Popup for assembling a comment for the selected issues
pub fn render_composer(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let popup = centered(area, POPUP_WIDTH, POPUP_HEIGHT);
    let inner_width = popup.width.saturating_sub(2) as usize;
    let inner_height = popup.height.saturating_sub(2) as usize;

    let targets = app.selection.selected().len();
    let title = match targets {
        0 => " Comment (no issues selected) ".to_string(),
        1 => " Comment for 1 issue ".to_string(),
        n => format!(" Comment for {} issues ", n),
    };

    // Command types, current one highlighted
    let current = app.composer_kind();
    let mut kinds = Vec::new();
    for kind in app.registry.kinds() {
        let style = if Some(kind) == current {
            Style::default()
                .fg(bg)
                .bg(app.theme.highlight)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        kinds.push(Span::styled(format!(" {} ", kind), style));
    }

    let mut lines = vec![
        Line::from(kinds),
        Line::from(vec![
            Span::styled("value: ", Style::default().fg(app.theme.dim).bg(bg)),
            Span::styled(
                app.composer.value.clone(),
                Style::default().fg(app.theme.text_bright).bg(bg),
            ),
            Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
        ]),
    ];

    lines.push(match (&app.composer.error, app.composer.last_outcome) {
        (Some(err), _) => Line::from(Span::styled(
            truncate_to_width(err, inner_width),
            Style::default().fg(app.theme.red).bg(bg),
        )),
        (None, Some(outcome)) => Line::from(Span::styled(
            match outcome {
                EditOutcome::Inserted => "inserted",
                EditOutcome::Replaced => "replaced existing command",
            },
            Style::default().fg(app.theme.green).bg(bg),
        )),
        (None, None) => Line::from(""),
    });
    lines.push(Line::from(Span::styled(
        "\u{2500}".repeat(inner_width),
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    // Newest buffer lines that fit above the hint line
    let room = inner_height.saturating_sub(lines.len() + 1);
    let buffer_lines: Vec<&str> = app.composer.buffer.lines().collect();
    let skip = buffer_lines.len().saturating_sub(room);
    for text in &buffer_lines[skip..] {
        lines.push(Line::from(Span::styled(
            truncate_to_width(text, inner_width),
            Style::default().fg(app.theme.text).bg(bg),
        )));
    }
    while lines.len() < inner_height.saturating_sub(1) {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Tab type  Enter apply  Esc close",
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// A `width` x `height` rect centered in `area`, shrunk to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}
