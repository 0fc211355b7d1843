use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode::display_width;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let selected = app.selection.selected().len();

    let mut spans = match app.mode {
        Mode::Navigate => vec![],
        Mode::Select => vec![Span::styled(
            " -- SELECT -- ",
            Style::default()
                .fg(app.theme.background)
                .bg(app.theme.highlight)
                .add_modifier(Modifier::BOLD),
        )],
        Mode::Compose => vec![Span::styled(
            " -- COMPOSE -- ",
            Style::default()
                .fg(app.theme.background)
                .bg(app.theme.cyan)
                .add_modifier(Modifier::BOLD),
        )],
    };

    match &app.status {
        Some(msg) => {
            let color = if msg.is_error {
                app.theme.red
            } else {
                app.theme.text_bright
            };
            spans.push(Span::styled(
                format!(" {}", msg.text),
                Style::default().fg(color).bg(bg),
            ));
        }
        None if selected > 0 => spans.push(Span::styled(
            format!(" {} selected", selected),
            Style::default().fg(app.theme.dim).bg(bg),
        )),
        None => {}
    }

    if app.show_key_hints {
        let hint = key_hint(app.mode);
        let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        let hint_width = display_width(hint);
        if content_width + hint_width < width {
            let padding = width - content_width - hint_width;
            spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
            spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn key_hint(mode: Mode) -> &'static str {
    match mode {
        Mode::Navigate => "v select  c compose  r recalc  s stats  q quit",
        Mode::Select => "Space toggle  x clear  Esc done",
        Mode::Compose => "Tab type  Enter apply  Esc close",
    }
}
