use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::handle_board_key;

/// Selection session: board keys plus toggling. Esc ends the session.
pub(super) fn handle_select(app: &mut App, key: KeyEvent) {
    if handle_board_key(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char(' ') => app.toggle_current(),
        KeyCode::Esc => app.exit_selection(),
        _ => {}
    }
}
