mod init;
pub use init::cmd_init;

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{self, SnapshotHost};
use crate::io::config_io::{self, Workspace};
use crate::io::store::{JsonFileStore, atomic_write};
use crate::model::{AssigneeAggregate, BoardSnapshot, ColumnAggregate, CommandConfig};
use crate::ops::aggregate::aggregate;
use crate::ops::command::{CommandDefinition, CommandRegistry};
use crate::ops::history;
use crate::ops::selection::{SelectionController, ToggleOutcome};
use crate::ops::tree::{IssueResolver, all_cards};
use crate::util::format::format_hours;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let start = start_dir(cli.project_dir.as_deref())?;
    let board_override = cli.board.clone();

    match cli.command {
        None => {
            eprintln!("no subcommand given (try `tally --help`)");
            Ok(())
        }
        Some(cmd) => {
            let ctx = Context {
                workspace: config_io::load_workspace(&start)?,
                board_override,
                json,
            };
            match cmd {
                // Init is handled in main.rs before config discovery
                Commands::Init(args) => cmd_init(args, Some(&start)),

                // Read commands
                Commands::Stats(args) => cmd_stats(&ctx, args),
                Commands::History(args) => cmd_history(&ctx, args),
                Commands::Select(args) => cmd_select(&ctx, args),
                Commands::Commands(args) => cmd_commands(&ctx, args),

                // Write commands
                Commands::Edit(args) => cmd_edit(&ctx, args),
                Commands::Commit => cmd_commit(&ctx),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Context {
    workspace: Workspace,
    board_override: Option<PathBuf>,
    json: bool,
}

impl Context {
    fn board_path(&self) -> PathBuf {
        self.workspace.board_path(self.board_override.as_deref())
    }

    fn load_board(&self) -> Result<BoardSnapshot, board_io::BoardError> {
        board_io::load_board(&self.board_path())
    }

    /// Name used for display and as the history key: config wins over the snapshot
    fn board_name(&self, board: &BoardSnapshot) -> String {
        self.workspace
            .config
            .board
            .name
            .clone()
            .unwrap_or_else(|| board.display_name().to_string())
    }

    fn history_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.workspace.history_path())
    }

    fn registry(&self) -> Result<CommandRegistry, crate::ops::command::CommandError> {
        CommandRegistry::with_config(&self.workspace.config.commands)
    }
}

/// Directory config discovery starts from: `-C` if given, else the cwd
pub(crate) fn start_dir(project_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match project_dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_buffer(file: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {}", path.display(), e).into()),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnStatsJson<'a> {
    board: &'a str,
    column: &'a str,
    totals: Option<&'a ColumnAggregate>,
    assignees: Option<&'a IndexMap<String, AssigneeAggregate>>,
}

fn cmd_stats(ctx: &Context, args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = ctx.load_board()?;
    let name = ctx.board_name(&board);
    let result = aggregate(&SnapshotHost::new(&board));

    if ctx.json {
        match args.column.as_deref() {
            Some(column) => print_json(&ColumnStatsJson {
                board: &name,
                column,
                totals: result.board_data.get(column),
                assignees: result.column_assignees(column),
            }),
            None => print_json(&StatsJson {
                board: &name,
                result: &result,
            }),
        }
    } else {
        print!("{}", format_stats(&name, &result, args.column.as_deref()));
        Ok(())
    }
}

fn cmd_history(ctx: &Context, args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = ctx.load_board()?;
    let name = ctx.board_name(&board);
    let entries = history::load_history(&ctx.history_store(), &name)?;
    let skip = entries.len().saturating_sub(args.limit);
    let shown = &entries[skip..];

    if ctx.json {
        print_json(shown)
    } else {
        print!("{}", format_history(shown));
        Ok(())
    }
}

fn cmd_select(ctx: &Context, args: SelectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = ctx.load_board()?;
    let host = SnapshotHost::new(&board);
    let cards = all_cards(&host);

    let mut controller = SelectionController::new();
    controller.start_selection(&host);
    for id in &args.ids {
        let card = cards.iter().find(|card| {
            host.resolve(card).is_ok_and(|issue| {
                issue.id == *id
                    && args
                        .scope
                        .as_deref()
                        .is_none_or(|scope| issue.scope_path == scope)
            })
        });
        let Some(card) = card else {
            eprintln!("warning: no card on the board for issue {}", id);
            continue;
        };
        match controller.toggle(&host, card) {
            ToggleOutcome::Failed(e) => eprintln!("warning: could not select {}: {}", id, e),
            ToggleOutcome::Selected { .. } | ToggleOutcome::Deselected | ToggleOutcome::Ignored => {}
        }
    }
    let snapshot = controller.exit_selection();

    if ctx.json {
        print_json(&snapshot)
    } else {
        print!("{}", format_selection(&snapshot));
        Ok(())
    }
}

fn cmd_commands(ctx: &Context, args: CommandsCmd) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        None => {
            let registry = ctx.registry()?;
            if ctx.json {
                print_json(&commands_to_json(&registry))
            } else {
                print!("{}", format_commands(&registry));
                Ok(())
            }
        }
        Some(CommandsAction::Add(add)) => cmd_commands_add(ctx, add),
    }
}

fn cmd_commands_add(ctx: &Context, args: AddCommandArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = ctx
        .workspace
        .config_path
        .as_deref()
        .ok_or("no tally.toml found (run `tally init` first)")?;

    // Reject bad regexes, missing placeholders and duplicates before touching the file
    let mut registry = ctx.registry()?;
    registry.register(CommandDefinition::from_template(
        &args.kind,
        &args.pattern,
        &args.template,
    )?)?;

    let (_config, mut doc) = config_io::read_config(config_path)?;
    config_io::add_command_to_config(
        &mut doc,
        &CommandConfig {
            kind: args.kind.clone(),
            pattern: args.pattern,
            template: args.template,
        },
    );
    config_io::write_config(config_path, &doc)?;
    tracing::info!(kind = %args.kind, "command added to config");
    println!("added command '{}'", args.kind);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_edit(ctx: &Context, args: EditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ctx.registry()?;
    let buffer = read_buffer(args.file.as_deref())?;
    let cursor = args.cursor.unwrap_or(buffer.len());
    let result = registry.insert_or_replace(&buffer, cursor, &args.kind, &args.value)?;

    if args.in_place
        && let Some(path) = args.file.as_deref()
    {
        atomic_write(path, result.buffer.as_bytes())
            .map_err(|e| format!("could not write {}: {}", path.display(), e))?;
    }

    if ctx.json {
        print_json(&result)
    } else {
        if !args.in_place {
            print!("{}", result.buffer);
        }
        Ok(())
    }
}

fn cmd_commit(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let board = ctx.load_board()?;
    let name = ctx.board_name(&board);
    let result = aggregate(&SnapshotHost::new(&board));

    let mut store = ctx.history_store();
    let changed = history::commit(
        &mut store,
        &name,
        &result,
        ctx.workspace.config.history.limit,
        Utc::now(),
    )?;

    if ctx.json {
        print_json(&CommitJson {
            board: &name,
            changed,
            total_estimate_seconds: result.total_estimate_seconds,
        })
    } else {
        if changed {
            println!(
                "recorded {} for {}",
                format_hours(result.total_estimate_seconds),
                name
            );
        } else {
            println!("no change since the last entry for {}", name);
        }
        Ok(())
    }
}
