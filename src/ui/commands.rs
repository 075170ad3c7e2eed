use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Set, clear or show the API key
    Key,
    /// Toggle whether the API key is shown in full
    Reveal,
    /// Clear the conversation
    Clear,
    /// Reprint the conversation
    History,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Key => "set the API key (/key <secret>), remove it (/key clear) or show it (/key)",
            SlashCommand::Reveal => "toggle showing the API key in full",
            SlashCommand::Clear => "clear the conversation",
            SlashCommand::History => "print the conversation so far",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim_start();
    let body = input.strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head.to_lowercase())
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "h" | "?" => Some(SlashCommand::Help),
            "apikey" | "api-key" => Some(SlashCommand::Key),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("/{} - {}\n", command.command(), command.description()));
    }
    help.push_str("\nAliases: /q, /quit, /exit for /bye; /h for /help.");
    help
}
