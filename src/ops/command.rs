//! Quick-command text editing.
//!
//! Every quick command (estimate, label, milestone, ...) is a slash-prefixed
//! line in a comment buffer, and a buffer holds at most one line per command
//! type. `insert_or_replace` is the single entry point that keeps it that way:
//! it rewrites an existing command in place or inserts a new one on its own
//! line.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::model::CommandConfig;

/// Error type for command registry and editing operations
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command type: {0}")]
    UnknownCommand(String),
    #[error("command type already registered: {0}")]
    DuplicateCommand(String),
    #[error("invalid pattern for command '{kind}': {source}")]
    InvalidPattern {
        kind: String,
        source: regex::Error,
    },
    #[error("template for command '{0}' has no {{value}} placeholder")]
    MissingPlaceholder(String),
    #[error("value for command '{0}' must fit on one line")]
    InvalidValue(String),
}

type RenderFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How one command type is matched in a buffer and rendered from a value
#[derive(Clone)]
pub struct CommandDefinition {
    kind: String,
    pattern: Regex,
    render: RenderFn,
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl CommandDefinition {
    /// Build a definition from a pattern and a render function.
    /// Patterns are compiled in multi-line mode so `^`/`$` match whole lines.
    pub fn new<F>(kind: &str, pattern: &str, render: F) -> Result<Self, CommandError>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let pattern = Regex::new(&format!("(?m){}", pattern)).map_err(|source| {
            CommandError::InvalidPattern {
                kind: kind.to_string(),
                source,
            }
        })?;
        Ok(CommandDefinition {
            kind: kind.to_string(),
            pattern,
            render: Arc::new(render),
        })
    }

    /// Build a definition whose text is `template` with `{value}` replaced
    pub fn from_template(kind: &str, pattern: &str, template: &str) -> Result<Self, CommandError> {
        if !template.contains("{value}") {
            return Err(CommandError::MissingPlaceholder(kind.to_string()));
        }
        let template = template.to_string();
        Self::new(kind, pattern, move |value| template.replace("{value}", value.trim()))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn render(&self, value: &str) -> String {
        (self.render)(value)
    }

    /// Number of instances of this command in `buffer`
    pub fn count_in(&self, buffer: &str) -> usize {
        self.pattern.find_iter(buffer).count()
    }
}

/// Which path `insert_or_replace` took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOutcome {
    Inserted,
    Replaced,
}

/// New buffer contents and cursor (byte offset) after an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditResult {
    pub buffer: String,
    pub cursor: usize,
    pub outcome: EditOutcome,
}

/// Command definitions keyed by type, in registration order
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, CommandDefinition>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The quick commands every board supports
    pub fn builtin() -> Self {
        let mut registry = CommandRegistry::new();
        for def in builtin_definitions() {
            registry.commands.insert(def.kind.clone(), def);
        }
        registry
    }

    /// Built-ins plus the definitions from config
    pub fn with_config(extra: &[CommandConfig]) -> Result<Self, CommandError> {
        let mut registry = Self::builtin();
        for cmd in extra {
            registry.register(CommandDefinition::from_template(
                &cmd.kind,
                &cmd.pattern,
                &cmd.template,
            )?)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, def: CommandDefinition) -> Result<(), CommandError> {
        if self.commands.contains_key(&def.kind) {
            return Err(CommandError::DuplicateCommand(def.kind));
        }
        self.commands.insert(def.kind.clone(), def);
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<&CommandDefinition> {
        self.commands.get(kind)
    }

    /// Registered types in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|k| k.as_str())
    }

    pub fn definitions(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Put a `kind` command carrying `value` into `buffer`.
    ///
    /// If the buffer already has a `kind` command, the first one is replaced
    /// in place and the cursor lands at its end. Otherwise the command is
    /// inserted at `cursor` on its own line and the cursor moves past it.
    /// The inserted text may carry a leading and a trailing line break
    /// around the rendered command, so it can be longer than the command.
    ///
    /// Values containing a line break are rejected with
    /// `CommandError::InvalidValue`.
    pub fn insert_or_replace(
        &self,
        buffer: &str,
        cursor: usize,
        kind: &str,
        value: &str,
    ) -> Result<EditResult, CommandError> {
        let def = self
            .get(kind)
            .ok_or_else(|| CommandError::UnknownCommand(kind.to_string()))?;
        if value.contains(['\n', '\r']) {
            return Err(CommandError::InvalidValue(kind.to_string()));
        }
        let text = def.render(value);

        if let Some(m) = def.pattern.find(buffer) {
            let mut new_buffer = String::with_capacity(buffer.len() + text.len());
            new_buffer.push_str(&buffer[..m.start()]);
            new_buffer.push_str(&text);
            new_buffer.push_str(&buffer[m.end()..]);
            return Ok(EditResult {
                buffer: new_buffer,
                cursor: m.start() + text.len(),
                outcome: EditOutcome::Replaced,
            });
        }

        let cursor = clamp_cursor(buffer, cursor);
        let before = &buffer[..cursor];
        let after = &buffer[cursor..];

        let mut inserted = String::with_capacity(text.len() + 2);
        if !before.is_empty() && !before.ends_with('\n') {
            inserted.push('\n');
        }
        inserted.push_str(&text);
        if !after.is_empty() && !after.starts_with('\n') {
            inserted.push('\n');
        }

        Ok(EditResult {
            buffer: format!("{}{}{}", before, inserted, after),
            cursor: cursor + inserted.len(),
            outcome: EditOutcome::Inserted,
        })
    }
}

/// Clamp to the buffer and back off to the nearest char boundary
fn clamp_cursor(buffer: &str, cursor: usize) -> usize {
    let mut pos = cursor.min(buffer.len());
    while !buffer.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Prefix every comma- or space-separated token with `sigil` unless it has one
fn sigil_list(value: &str, sigil: char) -> String {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.starts_with(sigil) {
                token.to_string()
            } else {
                format!("{}{}", sigil, token)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn builtin_definitions() -> Vec<CommandDefinition> {
    let defs: Vec<Result<CommandDefinition, CommandError>> = vec![
        CommandDefinition::new("estimate", r"^/estimate .*$", |v| {
            format!("/estimate {}h", v.trim())
        }),
        CommandDefinition::new("label", r"^/label .*$", |v| {
            format!("/label {}", sigil_list(v, '~'))
        }),
        CommandDefinition::new("milestone", r"^/milestone .*$", |v| {
            let v = v.trim();
            if v.starts_with('%') {
                format!("/milestone {}", v)
            } else {
                format!("/milestone %{}", v)
            }
        }),
        CommandDefinition::new("assign", r"^/assign .*$", |v| {
            format!("/assign {}", sigil_list(v, '@'))
        }),
        CommandDefinition::new("due", r"^/due .*$", |v| format!("/due {}", v.trim())),
        CommandDefinition::new("weight", r"^/weight .*$", |v| {
            format!("/weight {}", v.trim())
        }),
    ];
    defs.into_iter()
        .filter_map(|d| match d {
            Ok(def) => Some(def),
            Err(e) => {
                tracing::error!(error = %e, "invalid built-in command definition");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> CommandRegistry {
        CommandRegistry::builtin()
    }

    #[test]
    fn builtin_registers_every_quick_command() {
        let reg = registry();
        let kinds: Vec<&str> = reg.kinds().collect();
        assert_eq!(
            kinds,
            vec!["estimate", "label", "milestone", "assign", "due", "weight"]
        );
    }

    #[test]
    fn inserts_on_new_line_after_text() {
        let r = registry().insert_or_replace("hello", 5, "estimate", "4").unwrap();
        assert_eq!(r.buffer, "hello\n/estimate 4h");
        assert_eq!(r.cursor, 18);
        assert_eq!(r.outcome, EditOutcome::Inserted);
    }

    #[test]
    fn second_call_replaces_the_first() {
        let reg = registry();
        let first = reg.insert_or_replace("hello", 5, "estimate", "4").unwrap();
        let second = reg
            .insert_or_replace(&first.buffer, first.cursor, "estimate", "8")
            .unwrap();
        assert_eq!(second.buffer, "hello\n/estimate 8h");
        assert_eq!(second.outcome, EditOutcome::Replaced);
        assert_eq!(reg.get("estimate").unwrap().count_in(&second.buffer), 1);
    }

    #[test]
    fn empty_buffer_gets_no_leading_newline() {
        let r = registry().insert_or_replace("", 0, "weight", "3").unwrap();
        assert_eq!(r.buffer, "/weight 3");
        assert_eq!(r.cursor, 9);
    }

    #[test]
    fn no_extra_newline_after_line_break() {
        let r = registry().insert_or_replace("note\n", 5, "due", "2024-05-01").unwrap();
        assert_eq!(r.buffer, "note\n/due 2024-05-01");
    }

    #[test]
    fn insert_mid_line_keeps_following_text_on_its_own_line() {
        let r = registry().insert_or_replace("abcdef", 3, "weight", "2").unwrap();
        assert_eq!(r.buffer, "abc\n/weight 2\ndef");
        assert_eq!(r.cursor, 3 + "\n/weight 2\n".len());
    }

    #[test]
    fn insert_at_start_of_non_empty_buffer() {
        let r = registry().insert_or_replace("body", 0, "weight", "1").unwrap();
        assert_eq!(r.buffer, "/weight 1\nbody");
    }

    #[test]
    fn replace_preserves_surrounding_text() {
        let buffer = "Please look\n/label ~bug\nthanks";
        let r = registry().insert_or_replace(buffer, 0, "label", "ux ~design").unwrap();
        assert_eq!(r.buffer, "Please look\n/label ~ux ~design\nthanks");
        assert_eq!(r.cursor, "Please look\n/label ~ux ~design".len());
    }

    #[test]
    fn multi_line_values_are_rejected() {
        let reg = registry();
        let first = reg.insert_or_replace("hello", 5, "estimate", "4").unwrap();

        let err = reg
            .insert_or_replace(&first.buffer, first.cursor, "estimate", "4h\n/estimate 9")
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidValue(ref kind) if kind == "estimate"));
        let err = reg
            .insert_or_replace(&first.buffer, first.cursor, "weight", "1\r\n/estimate 7")
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidValue(_)));

        // Nothing slipped in through the rejected calls
        assert_eq!(reg.get("estimate").unwrap().count_in(&first.buffer), 1);
        assert_eq!(reg.get("weight").unwrap().count_in(&first.buffer), 0);
    }

    #[test]
    fn sigil_lists_accept_commas() {
        let r = registry().insert_or_replace("", 0, "assign", "ada, @bob,cy").unwrap();
        assert_eq!(r.buffer, "/assign @ada @bob @cy");
    }

    #[test]
    fn replace_only_touches_first_match() {
        let buffer = "/weight 1\n/weight 2";
        let r = registry().insert_or_replace(buffer, 0, "weight", "5").unwrap();
        assert_eq!(r.buffer, "/weight 5\n/weight 2");
    }

    #[test]
    fn types_do_not_interfere() {
        let reg = registry();
        let mut buffer = String::from("Sprint cleanup");
        let mut cursor = buffer.len();
        for (kind, value) in [
            ("estimate", "2"),
            ("label", "bug"),
            ("milestone", "v1.2"),
            ("assign", "ada @bob"),
            ("due", "tomorrow"),
            ("weight", "3"),
            ("estimate", "5"),
            ("assign", "cy"),
        ] {
            let r = reg.insert_or_replace(&buffer, cursor, kind, value).unwrap();
            buffer = r.buffer;
            cursor = r.cursor;
        }
        assert_eq!(
            buffer,
            "Sprint cleanup\n/estimate 5h\n/label ~bug\n/milestone %v1.2\n/assign @cy\n/due tomorrow\n/weight 3"
        );
        for def in reg.definitions() {
            assert_eq!(def.count_in(&buffer), 1, "{}", def.kind());
        }
    }

    #[test]
    fn unassign_line_is_not_an_assign_command() {
        let r = registry()
            .insert_or_replace("/unassign @ada", 14, "assign", "bob")
            .unwrap();
        assert_eq!(r.outcome, EditOutcome::Inserted);
        assert_eq!(r.buffer, "/unassign @ada\n/assign @bob");
    }

    #[test]
    fn cursor_is_clamped_to_buffer_and_char_boundary() {
        let reg = registry();
        let r = reg.insert_or_replace("hi", 99, "weight", "1").unwrap();
        assert_eq!(r.buffer, "hi\n/weight 1");
        // 'é' is two bytes; offset 2 falls inside it
        let r = reg.insert_or_replace("né", 2, "weight", "1").unwrap();
        assert_eq!(r.buffer, "n\n/weight 1\né");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = registry().insert_or_replace("", 0, "spend", "1h").unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand(k) if k == "spend"));
    }

    #[test]
    fn config_commands_extend_the_builtins() {
        let reg = CommandRegistry::with_config(&[CommandConfig {
            kind: "spend".into(),
            pattern: r"^/spend .*$".into(),
            template: "/spend {value}".into(),
        }])
        .unwrap();
        let r = reg.insert_or_replace("done", 4, "spend", "30m").unwrap();
        assert_eq!(r.buffer, "done\n/spend 30m");
        let r = reg.insert_or_replace(&r.buffer, 0, "spend", "1h").unwrap();
        assert_eq!(r.buffer, "done\n/spend 1h");
    }

    #[test]
    fn config_errors_are_reported() {
        let dup = CommandRegistry::with_config(&[CommandConfig {
            kind: "label".into(),
            pattern: r"^/label .*$".into(),
            template: "/label {value}".into(),
        }]);
        assert!(matches!(dup, Err(CommandError::DuplicateCommand(_))));

        let bad = CommandRegistry::with_config(&[CommandConfig {
            kind: "spend".into(),
            pattern: r"^/spend (".into(),
            template: "/spend {value}".into(),
        }]);
        assert!(matches!(bad, Err(CommandError::InvalidPattern { .. })));

        let no_placeholder = CommandDefinition::from_template("x", "^/x .*$", "/x");
        assert!(matches!(
            no_placeholder,
            Err(CommandError::MissingPlaceholder(_))
        ));
    }
}
