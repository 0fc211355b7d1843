use std::path::PathBuf;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use serde_json::json;

use crate::io::store::MemoryStore;
use crate::model::{BoardSnapshot, CardSnapshot, ColumnSnapshot, TallyConfig};
use crate::ops::command::CommandRegistry;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

fn card(props: serde_json::Value) -> CardSnapshot {
    CardSnapshot { props }
}

fn column(title: &str, cards: Vec<CardSnapshot>) -> ColumnSnapshot {
    ColumnSnapshot {
        title: Some(title.to_string()),
        cards,
    }
}

/// Three columns: two estimated cards, a closed one, and one without
/// issue data.
pub fn sample_board() -> BoardSnapshot {
    BoardSnapshot {
        name: "Sprint 12".into(),
        columns: vec![
            column(
                "To do",
                vec![
                    card(json!({"issue": {
                        "id": 1,
                        "path": "group/app",
                        "title": "Fix login",
                        "timeEstimate": 7200,
                        "assignees": [{"name": "Ada"}],
                    }})),
                    card(json!({"issue": {
                        "id": 2,
                        "path": "group/app",
                        "title": "Write docs",
                        "timeEstimate": 3600,
                        "assignees": [{"name": "Ada"}, {"name": "Grace"}],
                    }})),
                ],
            ),
            column(
                "Done",
                vec![card(json!({"issue": {
                    "id": 3,
                    "path": "group/app",
                    "title": "Ship it",
                    "milestone": {"title": "v1.2"},
                }}))],
            ),
            column("Triage", vec![card(json!({}))]),
        ],
    }
}

/// App over `sample_board` with an in-memory history store.
pub fn sample_app() -> App {
    let mut app = App::new(
        &TallyConfig::default(),
        PathBuf::from("/nonexistent/board.json"),
        CommandRegistry::builtin(),
        Box::new(MemoryStore::new()),
    );
    app.set_board(sample_board());
    app
}
