//! Interpretation of one line typed at the prompt

/// What the user asked the chat loop to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the text to the session as a question
    Ask(String),
    Help,
    /// Print the conversation so far
    History,
    Exit,
    /// Blank line or Esc
    Empty,
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "" => Command::Empty,
        "help" | "?" => Command::Help,
        "history" => Command::History,
        "exit" | "quit" => Command::Exit,
        _ => Command::Ask(trimmed.to_string()),
    }
}
