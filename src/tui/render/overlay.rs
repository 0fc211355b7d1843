use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode::display_width;

/// Draw ordinal badges over the cards bound to selection overlays.
/// Cards that are off-screen (no rectangle) get no badge.
pub fn render_overlays(frame: &mut Frame, app: &App, area: Rect) {
    if !app.selection.is_selecting() {
        return;
    }
    for overlay in app.selection.overlays() {
        let Some(rect) = overlay.rect else {
            continue;
        };
        let (text, style) = match overlay.ordinal {
            Some(n) => (
                format!("[{}]", n),
                Style::default()
                    .fg(app.theme.background)
                    .bg(app.theme.highlight)
                    .add_modifier(Modifier::BOLD),
            ),
            None if overlay.issue.is_some() => (
                "[ ]".to_string(),
                Style::default().fg(app.theme.dim).bg(app.theme.background),
            ),
            None => continue,
        };
        if let Some(badge) = badge_rect(rect, display_width(&text) as u16, area) {
            frame.render_widget(Paragraph::new(Span::styled(text, style)), badge);
        }
    }
}

/// Top-right corner of `card`, inset by one cell, clipped to `area`
fn badge_rect(card: Rect, width: u16, area: Rect) -> Option<Rect> {
    if card.width < width + 2 {
        return None;
    }
    let rect = Rect::new(card.right() - width - 1, card.y, width, 1);
    let clipped = rect.intersection(area);
    (clipped.width == width && clipped.height == 1).then_some(clipped)
}
