use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, CONFIG_FILE, ConfigError};

const OPTIONAL_SECTIONS: &str = r##"
# --- Custom commands ---
# Extra quick commands for `tally edit` and the composer. The pattern must
# match one whole command line; {value} is replaced with what you type.
#
# [[commands]]
# type = "spend"
# pattern = '^/spend .*$'
# template = "/spend {value}"

# --- UI Customization ---
# Uncomment and edit to override defaults.
#
# [ui]
# show_key_hints = true
#
# [ui.colors]
# background = "#0C001B"
# text = "#B0AAFF"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#7D78BF"
# red = "#FF4444"
# green = "#44FF88"
# cyan = "#44DDFF"
# purple = "#CC66FF"
# selection_bg = "#3D1438"
"##;

/// Starter tally.toml text: the live settings plus commented examples
fn render_config(name: Option<&str>, board_file: &str) -> String {
    let doc = config_io::starter_config(name, board_file);
    format!("{}{}", doc, OPTIONAL_SECTIONS)
}

pub fn cmd_init(args: InitArgs, dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let config_path = root.join(CONFIG_FILE);

    if config_path.exists() && !args.force {
        return Err(ConfigError::AlreadyExists(config_path).into());
    }

    // Warn when a parent directory already has a config
    if let Some(parent) = root.parent()
        && let Some(parent_config) = config_io::discover_config(parent)
    {
        eprintln!("Note: parent config found at {}", parent_config.display());
        eprintln!("Creating new {} in {}", CONFIG_FILE, root.display());
    }

    fs::create_dir_all(root.join(".tally"))?;
    fs::write(&config_path, render_config(args.name.as_deref(), &args.board_file))?;

    println!("Initialized {}", config_path.display());
    if !root.join(&args.board_file).exists() {
        println!("  board snapshot {} does not exist yet", args.board_file);
    }
    Ok(())
}
