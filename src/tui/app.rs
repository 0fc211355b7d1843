use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use crate::io::board_io::{self, CardLayout, SnapshotHost};
use crate::io::config_io;
use crate::io::store::{JsonFileStore, KeyValueStore};
use crate::io::watcher::{BoardEvent, BoardWatcher};
use crate::model::{AggregationResult, BoardSnapshot, CardHandle, TallyConfig};
use crate::ops::aggregate::aggregate;
use crate::ops::command::{CommandRegistry, EditOutcome};
use crate::ops::history;
use crate::ops::schedule::{RecalcScheduler, ScheduledAction};
use crate::ops::selection::{SelectionController, ToggleOutcome};

use super::input;
use super::render;
use super::theme::Theme;

/// Longest the event loop waits for input before checking timers
const TICK: Duration = Duration::from_millis(250);
/// How long a card that failed to resolve stays highlighted
pub const FLASH_DURATION: Duration = Duration::from_millis(600);

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// A selection session is running
    Select,
    /// The bulk-comment composer is open
    Compose,
}

/// Bulk-comment composer state. The buffer survives closing the popup.
#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    /// Index into the registry's command types
    pub kind_index: usize,
    /// Value typed for the next command
    pub value: String,
    /// Comment being assembled
    pub buffer: String,
    /// Byte offset into `buffer`
    pub cursor: usize,
    pub last_outcome: Option<EditOutcome>,
    pub error: Option<String>,
    /// Mode to go back to on Esc
    pub return_mode: Option<Mode>,
}

/// Message shown in the status row until the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct App {
    pub board: BoardSnapshot,
    pub board_path: PathBuf,
    /// Name from tally.toml, overriding the snapshot's
    pub configured_name: Option<String>,
    pub result: AggregationResult,
    pub selection: SelectionController<CardHandle>,
    pub registry: CommandRegistry,
    pub scheduler: RecalcScheduler,
    /// Card rectangles from the last draw
    pub layout: CardLayout,
    /// Card under the cursor (may point past the end of an empty column)
    pub cursor: CardHandle,
    /// First visible column
    pub column_scroll: usize,
    /// First visible card per column
    pub card_scroll: Vec<usize>,
    pub mode: Mode,
    pub show_stats: bool,
    pub show_key_hints: bool,
    pub should_quit: bool,
    pub theme: Theme,
    pub composer: ComposerState,
    pub status: Option<StatusMessage>,
    /// Card that failed to resolve on toggle, and when
    pub flash: Option<(CardHandle, Instant)>,
    history_store: Box<dyn KeyValueStore>,
    history_limit: usize,
}

impl App {
    pub fn new(
        config: &TallyConfig,
        board_path: PathBuf,
        registry: CommandRegistry,
        history_store: Box<dyn KeyValueStore>,
    ) -> Self {
        App {
            board: BoardSnapshot::default(),
            board_path,
            configured_name: config.board.name.clone(),
            result: AggregationResult::default(),
            selection: SelectionController::new(),
            registry,
            scheduler: RecalcScheduler::from_config(&config.schedule),
            layout: CardLayout::new(),
            cursor: CardHandle::new(0, 0),
            column_scroll: 0,
            card_scroll: Vec::new(),
            mode: Mode::Navigate,
            show_stats: true,
            show_key_hints: config.ui.show_key_hints,
            should_quit: false,
            theme: Theme::from_config(&config.ui),
            composer: ComposerState::default(),
            status: None,
            flash: None,
            history_store,
            history_limit: config.history.limit,
        }
    }

    /// Name used for display and history
    pub fn board_name(&self) -> String {
        self.configured_name
            .clone()
            .unwrap_or_else(|| self.board.display_name().to_string())
    }

    /// Engine view of the board as currently drawn
    pub fn host(&self) -> SnapshotHost<'_> {
        SnapshotHost::with_layout(&self.board, &self.layout)
    }

    /// Swap in a new snapshot: re-aggregate, clamp the cursor and rebind
    /// selection overlays to the new cards.
    pub fn set_board(&mut self, board: BoardSnapshot) {
        self.board = board;
        self.layout.clear();
        self.card_scroll = vec![0; self.board.columns.len()];
        self.clamp_cursor();

        let host = SnapshotHost::with_layout(&self.board, &self.layout);
        self.result = aggregate(&host);
        self.selection.rebind(&host);
    }

    /// Reload the snapshot from disk. A failed load keeps the previous board.
    pub fn rescan(&mut self) {
        match board_io::load_board(&self.board_path) {
            Ok(board) => {
                self.set_board(board);
                tracing::info!(
                    board = %self.board_name(),
                    cards = self.result.cards_processed,
                    "board recalculated"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "board reload failed");
                self.set_error(e.to_string());
            }
        }
    }

    /// Persist the current result if it differs from the last history entry
    pub fn commit_history(&mut self) {
        let name = self.board_name();
        if history::commit_best_effort(
            self.history_store.as_mut(),
            &name,
            &self.result,
            self.history_limit,
        ) {
            self.set_message("history updated");
        }
    }

    /// Run whatever the scheduler has due
    pub fn tick(&mut self, now: Instant) {
        match self.scheduler.poll(now) {
            Some(ScheduledAction::Rescan) => self.rescan(),
            Some(ScheduledAction::CommitHistory) => self.commit_history(),
            None => {}
        }
        if let Some((_, at)) = self.flash
            && now.duration_since(at) >= FLASH_DURATION
        {
            self.flash = None;
        }
    }

    /// Flush a commit that was waiting for its delay
    pub fn finish(&mut self) {
        if self.scheduler.commit_pending() {
            self.scheduler.cancel();
            self.commit_history();
        }
    }

    // -- Cursor --------------------------------------------------------------

    pub fn column_len(&self, column: usize) -> usize {
        self.board.columns.get(column).map_or(0, |c| c.cards.len())
    }

    /// The card under the cursor, if the cursor is on one
    pub fn current_card(&self) -> Option<CardHandle> {
        self.board.card(self.cursor).map(|_| self.cursor)
    }

    pub fn move_horizontal(&mut self, delta: isize) {
        let columns = self.board.columns.len();
        if columns == 0 {
            return;
        }
        let target = self.cursor.column.saturating_add_signed(delta).min(columns - 1);
        self.cursor.column = target;
        self.clamp_cursor();
    }

    pub fn move_vertical(&mut self, delta: isize) {
        let len = self.column_len(self.cursor.column);
        if len == 0 {
            return;
        }
        self.cursor.index = self.cursor.index.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_cursor(&mut self) {
        let columns = self.board.columns.len();
        self.cursor.column = self.cursor.column.min(columns.saturating_sub(1));
        let len = self.column_len(self.cursor.column);
        self.cursor.index = self.cursor.index.min(len.saturating_sub(1));
    }

    // -- Selection -----------------------------------------------------------

    pub fn start_selection(&mut self) {
        let host = SnapshotHost::with_layout(&self.board, &self.layout);
        self.selection.start_selection(&host);
        self.mode = Mode::Select;
    }

    pub fn toggle_current(&mut self) {
        let Some(card) = self.current_card() else {
            return;
        };
        let host = SnapshotHost::with_layout(&self.board, &self.layout);
        match self.selection.toggle(&host, &card) {
            ToggleOutcome::Selected { ordinal } => {
                self.set_message(format!("selected as #{}", ordinal));
            }
            ToggleOutcome::Deselected => self.set_message("removed from selection"),
            ToggleOutcome::Failed(e) => {
                self.flash = Some((card, Instant::now()));
                self.set_error(format!("cannot select this card: {}", e));
            }
            ToggleOutcome::Ignored => {}
        }
    }

    pub fn exit_selection(&mut self) {
        let snapshot = self.selection.exit_selection();
        self.mode = Mode::Navigate;
        self.set_message(format!("{} issue(s) selected", snapshot.len()));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.set_message("selection cleared");
    }

    /// Refresh overlay rectangles after the layout changed
    pub fn reposition_overlays(&mut self) {
        let host = SnapshotHost::with_layout(&self.board, &self.layout);
        self.selection.reposition(&host);
    }

    // -- Composer ------------------------------------------------------------

    pub fn open_composer(&mut self) {
        self.composer.return_mode = Some(self.mode);
        self.composer.error = None;
        self.mode = Mode::Compose;
    }

    pub fn close_composer(&mut self) {
        self.mode = self.composer.return_mode.take().unwrap_or(Mode::Navigate);
    }

    /// Command type the composer will insert
    pub fn composer_kind(&self) -> Option<&str> {
        self.registry.kinds().nth(self.composer.kind_index)
    }

    pub fn cycle_composer_kind(&mut self, forward: bool) {
        let count = self.registry.len();
        if count == 0 {
            return;
        }
        let i = self.composer.kind_index % count;
        self.composer.kind_index = if forward {
            (i + 1) % count
        } else {
            (i + count - 1) % count
        };
    }

    /// Insert or replace the selected command type in the comment buffer
    pub fn apply_composer(&mut self) {
        let Some(kind) = self.composer_kind().map(str::to_string) else {
            return;
        };
        let value = self.composer.value.trim().to_string();
        if value.is_empty() {
            self.composer.error = Some("type a value first".into());
            return;
        }
        match self.registry.insert_or_replace(
            &self.composer.buffer,
            self.composer.cursor,
            &kind,
            &value,
        ) {
            Ok(edit) => {
                self.composer.buffer = edit.buffer;
                self.composer.cursor = edit.cursor;
                self.composer.last_outcome = Some(edit.outcome);
                self.composer.value.clear();
                self.composer.error = None;
            }
            Err(e) => self.composer.error = Some(e.to_string()),
        }
    }

    // -- Status --------------------------------------------------------------

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }
}

/// Send logs to `.tally/tally.log` so they never draw over the board
fn init_logging(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join("tally.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| format!("failed to open log file '{}': {}", log_path.display(), e))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();
    Ok(())
}

/// Run the TUI application
pub fn run(
    project_dir: Option<&str>,
    board_override: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = crate::cli::handlers::start_dir(project_dir)?;
    let workspace = config_io::load_workspace(&start)?;
    init_logging(&workspace.data_dir())?;

    let board_path = workspace.board_path(board_override);
    let registry = CommandRegistry::with_config(&workspace.config.commands)?;
    let store = JsonFileStore::new(workspace.history_path());
    let mut app = App::new(&workspace.config, board_path.clone(), registry, Box::new(store));
    app.rescan();

    let watcher = match BoardWatcher::start(&board_path) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "board watcher unavailable; use r to recalculate");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    app.finish();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&BoardWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        let now = Instant::now();
        let wait = app
            .scheduler
            .next_deadline()
            .map_or(TICK, |at| at.saturating_duration_since(now).min(TICK));

        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Event::Resize(_, _) => {
                    terminal.autoresize()?;
                    app.reposition_overlays();
                }
                _ => {}
            }
        }

        if let Some(watcher) = watcher {
            for evt in watcher.poll() {
                match evt {
                    BoardEvent::Changed => app.scheduler.tree_changed(Instant::now()),
                }
            }
        }
        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
