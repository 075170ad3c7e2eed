//! Terminal front end: slash commands, message rendering and the chat loop

pub mod commands;
pub mod history;
pub mod repl;

pub use repl::ChatRepl;
