//! Special commands parser for interactive chat
//!
//! Lines starting with `/` are handled by the chat loop instead of being sent
//! to the assistant. Command names are case-insensitive; arguments (paths)
//! are kept as typed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Attach an image to the next message
    AttachImage(PathBuf),

    /// Drop a pending image attachment
    DetachImage,

    /// Start a new session with the same agent
    NewSession,

    /// Show the agent, session and pending attachment
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input to the assistant
    None,
}

/// Parse one line of chat input
///
/// # Errors
///
/// Returns `UnknownCommand` for unrecognised `/` commands and
/// `MissingArgument` for `/image` without a path.
///
/// # Examples
///
/// ```
/// use chatmate::commands::special_commands::{parse_special_command, SpecialCommand};
/// use std::path::PathBuf;
///
/// assert_eq!(
///     parse_special_command("/image ~/Pictures/Cat.png").unwrap(),
///     SpecialCommand::AttachImage(PathBuf::from("~/Pictures/Cat.png"))
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower, ""),
    };

    match name.as_str() {
        "exit" | "quit" | "/exit" | "/quit" | "/q" => Ok(SpecialCommand::Exit),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/new" => Ok(SpecialCommand::NewSession),
        "/noimage" => Ok(SpecialCommand::DetachImage),
        "/image" if arg.is_empty() => Err(CommandError::MissingArgument {
            command: "/image".to_string(),
            usage: "/image <path>".to_string(),
        }),
        "/image" => Ok(SpecialCommand::AttachImage(PathBuf::from(arg))),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the in-chat command reference
pub fn print_help() {
    use colored::Colorize;

    println!("\n{}", "Chat commands".bold());
    println!("  {}  attach an image to your next message", "/image <path>".cyan());
    println!("  {}       drop the pending image", "/noimage".cyan());
    println!("  {}            start a new session with this agent", "/new".cyan());
    println!("  {}         show agent and session", "/status".cyan());
    println!("  {}           show this help", "/help".cyan());
    println!("  {}           leave the chat (also 'exit' or Ctrl-D)\n", "/exit".cyan());
}
