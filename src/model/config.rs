use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from tally.toml. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    /// Extra quick-command definitions beyond the built-in ones
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Overrides the name stored in the snapshot
    #[serde(default)]
    pub name: Option<String>,
    /// Snapshot path, relative to the directory holding tally.toml
    #[serde(default = "default_board_file")]
    pub file: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            name: None,
            file: default_board_file(),
        }
    }
}

fn default_board_file() -> String {
    "board.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Quiet period after the last board change before rescanning
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Delay after a rescan before the result is committed to history
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            debounce_ms: default_debounce_ms(),
            commit_delay_ms: default_commit_delay_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_commit_delay_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_file")]
    pub file: String,
    /// Maximum entries kept per board
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            file: default_history_file(),
            limit: default_history_limit(),
        }
    }
}

fn default_history_file() -> String {
    ".tally/history.json".to_string()
}

fn default_history_limit() -> usize {
    100
}

/// A user-defined quick command: `template` has `{value}` substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: String,
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub show_key_hints: bool,
    /// Theme overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: TallyConfig = toml::from_str("").unwrap();
        assert_eq!(config.board.file, "board.json");
        assert_eq!(config.schedule.debounce_ms, 300);
        assert_eq!(config.schedule.commit_delay_ms, 3000);
        assert_eq!(config.history.limit, 100);
        assert!(config.commands.is_empty());
    }

    #[test]
    fn parses_custom_commands() {
        let config: TallyConfig = toml::from_str(
            r#"
[board]
name = "Sprint"

[[commands]]
type = "spend"
pattern = '^/spend .*$'
template = "/spend {value}"
"#,
        )
        .unwrap();
        assert_eq!(config.board.name.as_deref(), Some("Sprint"));
        assert_eq!(config.commands.len(), 1);
        assert_eq!(config.commands[0].kind, "spend");
        assert_eq!(config.commands[0].template, "/spend {value}");
    }
}
