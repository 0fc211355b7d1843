mod compose;
mod navigate;
mod select;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

use compose::handle_compose;
use navigate::handle_navigate;
use select::handle_select;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }
    if app.mode != Mode::Compose {
        app.status = None;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Select => handle_select(app, key),
        Mode::Compose => handle_compose(app, key),
    }
}

/// Keys shared by Navigate and Select. Returns true if the key was handled.
fn handle_board_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => app.move_horizontal(-1),
        KeyCode::Char('l') | KeyCode::Right => app.move_horizontal(1),
        KeyCode::Char('j') | KeyCode::Down => app.move_vertical(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_vertical(-1),
        KeyCode::Char('r') => {
            app.scheduler.request_now(std::time::Instant::now());
            app.set_message("recalculating…");
        }
        KeyCode::Char('s') => app.show_stats = !app.show_stats,
        KeyCode::Char('x') => app.clear_selection(),
        KeyCode::Char('c') => app.open_composer(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => return false,
    }
    true
}
