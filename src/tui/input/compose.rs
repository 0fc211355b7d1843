use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;
use crate::util::unicode::prev_grapheme_boundary;

/// Bulk-comment composer: typed text is the command value
pub(super) fn handle_compose(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_composer(),
        KeyCode::Tab => app.cycle_composer_kind(true),
        KeyCode::BackTab => app.cycle_composer_kind(false),
        KeyCode::Enter => app.apply_composer(),
        KeyCode::Backspace => {
            let value = &mut app.composer.value;
            if let Some(at) = prev_grapheme_boundary(value, value.len()) {
                value.truncate(at);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.composer.value.clear();
        }
        KeyCode::Char(c) => {
            app.composer.value.push(c);
            app.composer.error = None;
        }
        _ => {}
    }
}
