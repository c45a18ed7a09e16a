//! Slash commands.
//!
//! Each graph declares a static [`CommandTable`]; the table is validated when
//! the registry is built and dispatch never fails. Unknown names fall back to
//! the help listing.

pub mod adapter;
pub mod builtin;

use std::collections::HashSet;

use futures_util::future::BoxFuture;
use plebchat_shared::CommandResult;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::GraphConfig;

pub const NOT_FOUND_BANNER: &str = "# ⛓️‍💥\n";

/// What a handler can reach while it runs.
pub struct CommandContext<'a> {
    pub table: &'a CommandTable,
    pub http: &'a Client,
    pub config: &'a GraphConfig,
}

pub type CommandHandler =
    for<'a> fn(&'a CommandContext<'a>, &'a [String]) -> BoxFuture<'a, CommandResult>;

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    /// First line of the help listing.
    pub summary: &'static str,
    /// Body of `/help <name>`.
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub const fn new(
        name: &'static str,
        summary: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self { name, summary, usage, handler }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandTableError {
    #[error("{graph}: command name `{name}` must be lowercase alphanumeric")]
    InvalidName { graph: &'static str, name: &'static str },
    #[error("{graph}: command `{name}` is declared twice")]
    Duplicate { graph: &'static str, name: &'static str },
    #[error("{graph}: command table has no `help`")]
    MissingHelp { graph: &'static str },
}

/// A slash command parsed from user text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased, without the slash. May be empty for a bare `/`.
    pub name: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Returns `None` unless `text` starts with `/`.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let mut tokens = rest.split_whitespace();
        // A leading space ("/ help") leaves the name empty.
        let name = if rest.starts_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.next().unwrap_or_default().to_lowercase()
        };
        Some(Self { name, args: tokens.map(str::to_string).collect() })
    }
}

#[derive(Debug)]
pub struct CommandTable {
    graph: &'static str,
    about: &'static str,
    commands: Vec<CommandSpec>,
}

impl CommandTable {
    pub fn new(graph: &'static str, about: &'static str, commands: Vec<CommandSpec>) -> Self {
        Self { graph, about, commands }
    }

    pub fn graph(&self) -> &'static str {
        self.graph
    }

    pub fn about(&self) -> &'static str {
        self.about
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn validate(&self) -> Result<(), CommandTableError> {
        let mut seen = HashSet::new();
        for command in &self.commands {
            let name = command.name;
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !valid {
                return Err(CommandTableError::InvalidName { graph: self.graph, name });
            }
            if !seen.insert(name) {
                return Err(CommandTableError::Duplicate { graph: self.graph, name });
            }
        }
        if self.get("help").is_none() {
            return Err(CommandTableError::MissingHelp { graph: self.graph });
        }
        Ok(())
    }

    /// Markdown listing of every command, sorted by name.
    pub fn help_listing(&self) -> String {
        let mut commands: Vec<&CommandSpec> = self.commands.iter().collect();
        commands.sort_by_key(|c| c.name);
        let lines: Vec<String> = commands
            .iter()
            .map(|c| format!("- `/{}` - {}", c.name, c.summary))
            .collect();
        format!(
            "### Commands Available\n\n{}\n\nFor detailed help on a specific command, type `/help command_name`\n",
            lines.join("\n")
        )
    }

    pub fn help_for(&self, name: &str) -> String {
        let name = name.to_lowercase();
        match self.get(&name) {
            Some(command) => format!("## Help: /{name}\n\n```\n{}\n```\n", command.usage),
            None => {
                format!("Command '/{name}' not found. Type `/help` to see all available commands.")
            }
        }
    }

    pub async fn dispatch(
        &self,
        http: &Client,
        config: &GraphConfig,
        command: &ParsedCommand,
    ) -> CommandResult {
        let Some(spec) = self.get(&command.name) else {
            debug!(graph = self.graph, command = %command.name, "unknown command");
            return CommandResult::direct(format!("{NOT_FOUND_BANNER}{}", self.help_listing()));
        };
        debug!(graph = self.graph, command = spec.name, args = command.args.len(), "dispatching command");
        let ctx = CommandContext { table: self, http, config };
        (spec.handler)(&ctx, &command.args).await
    }
}
