use std::path::Path;
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the board watcher to the TUI event loop.
#[derive(Debug, PartialEq, Eq)]
pub enum BoardEvent {
    /// The board snapshot was written, replaced or removed.
    Changed,
}

/// Watches a board snapshot file for changes.
///
/// The parent directory is watched rather than the file itself, so editors
/// and exporters that replace the file via rename are still picked up.
pub struct BoardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<BoardEvent>,
}

impl BoardWatcher {
    /// Start watching `board_path`.
    /// Returns a `BoardWatcher` whose `poll()` method should be called each tick.
    pub fn start(board_path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target = board_path.to_path_buf();
        let dir = board_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::debug!(error = %e, "board watcher error");
                        return;
                    }
                };
                if is_board_change(&event, &target) {
                    let _ = tx.send(BoardEvent::Changed);
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(BoardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<BoardEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

/// Creates, modifications and removes that touch the board file.
/// Only the board's own directory is watched, so the file name decides.
fn is_board_change(event: &Event, target: &Path) -> bool {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return false,
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name() == target.file_name())
}
