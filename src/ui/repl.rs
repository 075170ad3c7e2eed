//! Interactive line-oriented chat loop.

use anyhow::{Context, Result};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::credential::{Credential, CredentialPanel};
use crate::error::ChatError;
use crate::session::ConversationSession;
use crate::ui::commands::{ParsedCommand, SlashCommand, get_help_text, parse_slash_command};
use crate::ui::history::{render_message, render_transcript};

const WRAP_WIDTH: usize = 80;

/// What the loop should do after handling a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplAction {
    Continue(Option<String>),
    Exit,
}

pub struct ChatRepl {
    session: ConversationSession,
    panel: CredentialPanel,
}

impl ChatRepl {
    pub fn new(session: ConversationSession, panel: CredentialPanel) -> Self {
        Self { session, panel }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("💬 Replica chat. Type a message, or /help for commands.");
        if self.session.credential().is_none() {
            println!("🔑 No API key configured. Set one with /key <secret>.");
        }
        println!();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            io::stdout().flush()?;

            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                break;
            };

            if let Some(command) = parse_slash_command(&line) {
                match self.handle_command(command) {
                    ReplAction::Continue(Some(output)) => println!("{}\n", output),
                    ReplAction::Continue(None) => {}
                    ReplAction::Exit => break,
                }
                continue;
            }

            self.send(&line).await;
        }

        println!("👋 Bye!");
        Ok(())
    }

    async fn send(&mut self, line: &str) {
        let pending = match self.session.begin_exchange(line) {
            Ok(pending) => pending,
            Err(e) => {
                report(&e);
                return;
            }
        };

        if let Some(placeholder) = self.session.transcript().last() {
            println!("{}", render_message(placeholder, WRAP_WIDTH));
        }

        match self.session.complete_exchange(pending).await {
            Ok(_) => {
                if let Some(reply) = self.session.transcript().last() {
                    println!("{}\n", render_message(reply, WRAP_WIDTH));
                }
            }
            Err(e) => report(&e),
        }
    }

    pub fn handle_command(&mut self, command: ParsedCommand) -> ReplAction {
        let output = match command.command {
            SlashCommand::Key => self.handle_key(command.argument()),
            SlashCommand::Reveal => {
                let visible = self.panel.toggle();
                format!(
                    "API key is now {}: {}",
                    if visible { "shown" } else { "masked" },
                    self.panel.render(self.session.credential())
                )
            }
            SlashCommand::Clear => {
                let removed = self.session.transcript().len();
                self.session.clear_transcript();
                format!("Conversation cleared ({} messages).", removed)
            }
            SlashCommand::History => {
                let mut out = render_transcript(self.session.transcript(), WRAP_WIDTH);
                if let Some(error) = self.session.last_error() {
                    out.push_str(&format!("\n\n❌ Last error: {}", error));
                }
                out
            }
            SlashCommand::Help => get_help_text(),
            SlashCommand::Bye => return ReplAction::Exit,
        };
        ReplAction::Continue(Some(output))
    }

    fn handle_key(&mut self, argument: Option<&str>) -> String {
        match argument {
            None => {
                let key = self.panel.render(self.session.credential());
                match self.session.replica_id() {
                    Some(replica_id) => format!("API key: {} (replica {})", key, replica_id),
                    None => format!("API key: {}", key),
                }
            }
            Some("clear") => {
                self.session.set_credential(None);
                "API key removed.".to_string()
            }
            Some(raw) => match Credential::new(raw) {
                Some(credential) => {
                    self.session.set_credential(Some(credential));
                    format!("API key set: {}", self.panel.render(self.session.credential()))
                }
                None => "API key cannot be empty.".to_string(),
            },
        }
    }
}

fn report(err: &ChatError) {
    if err.is_validation() {
        println!("⚠️  {}\n", err);
    } else {
        debug!(error = ?err, "Exchange failed");
        println!("❌ {}\n", err);
    }
}
