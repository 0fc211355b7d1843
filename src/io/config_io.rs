use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{CommandConfig, TallyConfig};

pub const CONFIG_FILE: &str = "tally.toml";

/// Error type for config I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse tally.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit tally.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Where tally runs: the directory holding tally.toml (or the start
/// directory when there is none) and the parsed config.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub config: TallyConfig,
}

impl Workspace {
    /// Board snapshot path; `board_override` wins over the config
    pub fn board_path(&self, board_override: Option<&Path>) -> PathBuf {
        match board_override {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => std::env::current_dir()
                .map(|cwd| cwd.join(p))
                .unwrap_or_else(|_| p.to_path_buf()),
            None => self.root.join(&self.config.board.file),
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(&self.config.history.file)
    }

    /// Directory for logs and other local state
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(".tally")
    }
}

/// Walk up from `start` looking for tally.toml
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load the workspace around `start`. A missing tally.toml is not an error:
/// every setting has a default.
pub fn load_workspace(start: &Path) -> Result<Workspace, ConfigError> {
    match discover_config(start) {
        Some(path) => {
            let (config, _doc) = read_config(&path)?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start.to_path_buf());
            Ok(Workspace {
                root,
                config_path: Some(path),
                config,
            })
        }
        None => Ok(Workspace {
            root: start.to_path_buf(),
            config_path: None,
            config: TallyConfig::default(),
        }),
    }
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(path: &Path) -> Result<(TallyConfig, toml_edit::DocumentMut), ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: TallyConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    fs::write(path, doc.to_string())?;
    Ok(())
}

/// A starter tally.toml
pub fn starter_config(name: Option<&str>, board_file: &str) -> toml_edit::DocumentMut {
    let mut doc = toml_edit::DocumentMut::new();

    let mut board = toml_edit::Table::new();
    if let Some(name) = name {
        board["name"] = toml_edit::value(name);
    }
    board["file"] = toml_edit::value(board_file);
    doc["board"] = toml_edit::Item::Table(board);

    let mut schedule = toml_edit::Table::new();
    schedule["debounce_ms"] = toml_edit::value(300);
    schedule["commit_delay_ms"] = toml_edit::value(3000);
    doc["schedule"] = toml_edit::Item::Table(schedule);

    let mut history = toml_edit::Table::new();
    history["file"] = toml_edit::value(".tally/history.json");
    history["limit"] = toml_edit::value(100);
    doc["history"] = toml_edit::Item::Table(history);

    doc
}

/// Append a `[[commands]]` entry to the config document
pub fn add_command_to_config(doc: &mut toml_edit::DocumentMut, command: &CommandConfig) {
    if !doc.contains_key("commands") {
        doc["commands"] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }

    if let Some(commands) = doc["commands"].as_array_of_tables_mut() {
        let mut table = toml_edit::Table::new();
        table["type"] = toml_edit::value(&command.kind);
        table["pattern"] = toml_edit::value(&command.pattern);
        table["template"] = toml_edit::value(&command.template);
        commands.push(table);
    }
}
