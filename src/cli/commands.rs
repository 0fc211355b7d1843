use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally", about = concat!("tally v", env!("CARGO_PKG_VERSION"), " - time estimates, bulk selection and quick commands for issue boards"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,

    /// Board snapshot to use instead of the configured one
    #[arg(long, global = true)]
    pub board: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter tally.toml in the current directory
    Init(InitArgs),
    /// Aggregate time estimates across the board
    Stats(StatsArgs),
    /// Insert or replace a quick command in a comment buffer
    Edit(EditArgs),
    /// List quick command types, or add a custom one
    Commands(CommandsCmd),
    /// Aggregate and record the result in history if it changed
    Commit,
    /// Show recorded history for the board
    History(HistoryArgs),
    /// Resolve issues by id into an ordered selection
    Select(SelectArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: taken from the snapshot)
    #[arg(long)]
    pub name: Option<String>,
    /// Board snapshot file
    #[arg(long = "file", default_value = "board.json")]
    pub board_file: String,
    /// Overwrite an existing tally.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Only show assignee totals for this column
    #[arg(long)]
    pub column: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Command type (estimate, label, milestone, assign, due, weight, ...)
    pub kind: String,
    /// Value to render into the command
    pub value: String,
    /// Read the buffer from this file instead of stdin
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Cursor byte offset (default: end of buffer)
    #[arg(long)]
    pub cursor: Option<usize>,
    /// Write the result back to --file
    #[arg(long, requires = "file")]
    pub in_place: bool,
}

#[derive(Args)]
pub struct CommandsCmd {
    #[command(subcommand)]
    pub action: Option<CommandsAction>,
}

#[derive(Subcommand)]
pub enum CommandsAction {
    /// Add a custom command type to tally.toml
    Add(AddCommandArgs),
}

#[derive(Args)]
pub struct AddCommandArgs {
    /// Command type name
    pub kind: String,
    /// Regex matching one whole command line, e.g. '^/spend .*$'
    pub pattern: String,
    /// Command text with a {value} placeholder, e.g. '/spend {value}'
    pub template: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of entries to show (newest last)
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct SelectArgs {
    /// Issue ids, in selection order. Toggling an id twice removes it.
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Restrict matches to this project path
    #[arg(long)]
    pub scope: Option<String>,
}
