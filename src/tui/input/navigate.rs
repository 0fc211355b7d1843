use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

use super::handle_board_key;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    if handle_board_key(app, key) {
        return;
    }
    if key.code == KeyCode::Char('v') {
        app.start_selection();
    }
}
