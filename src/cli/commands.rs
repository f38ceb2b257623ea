//! Slash commands accepted in the question input.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show the connection form again.
    Connect,
    /// Re-render the transcript.
    History,
    Help,
    Exit,
    Unknown(String),
}

/// Parse input as a slash command. `None` means it is a question.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/connect" | "/c" => Some(ChatCommand::Connect),
        "/history" => Some(ChatCommand::History),
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}  {}", style("/connect").cyan(), "Connect (or reconnect) to a MySQL database");
    println!("  {}  {}", style("/history").cyan(), "Show the conversation so far");
    println!("  {}     {}", style("/help").cyan(), "Show this help message");
    println!("  {}     {}", style("/exit").cyan(), "End the session");
    println!();
    println!("  {}", style("Anything else is sent as a question about your database.").dim());
    println!();
}
