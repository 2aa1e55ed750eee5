//! UI utilities for the chat terminal

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use ragchat_core::{ConversationMessage, Result, Role};
use ragchat_rag::IngestionOutcome;

const PROMPT: &str = "ask>";

/// Display the startup banner
pub fn display_banner(docs_dir: &Path, chat_model: &str) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);
    let inner = banner_width - 2;

    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "RagChat - chat with your documents";
    println!(
        "{}{}{}{}",
        "│  ".blue(),
        title.blue().bold(),
        " ".repeat(inner.saturating_sub(title.chars().count() + 2)),
        "│".blue()
    );
    println!("{}", empty_line.blue());

    let docs = format!("Documents: {}", docs_dir.display());
    let model = format!("Model: {}", chat_model);
    let version = format!("v{}", env!("CARGO_PKG_VERSION"));
    for line in [docs.as_str(), model.as_str(), "", version.as_str()] {
        if line.is_empty() {
            println!("{}", empty_line.blue());
            continue;
        }
        let shown: String = line.chars().take(inner.saturating_sub(4)).collect();
        let padding = " ".repeat(inner.saturating_sub(shown.chars().count() + 2));
        if line == version {
            println!("{}{}{}{}", "│  ".blue(), shown.dimmed(), padding, "│".blue());
        } else {
            println!("{}", format!("│  {}{}│", shown, padding).blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "Tip: ask a question about your documents, or type 'help' for commands".dimmed()
    );
    println!();
}

fn redraw(input: &str) -> io::Result<()> {
    print!(
        "\r{} {}\r{} {}",
        PROMPT.green().bold(),
        " ".repeat(input.chars().count() + 50),
        PROMPT.green().bold(),
        input
    );
    io::stdout().flush()
}

/// Read one line, with ↑/↓ navigation through earlier lines
///
/// Falls back to a plain line read when stdin is not a terminal. Esc returns
/// an empty string; end of input returns `None`.
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(Some(input));
    }

    enable_raw_mode()?;
    let result = read_raw_line(history);
    disable_raw_mode()?;
    println!();
    result.map(Some)
}

fn read_raw_line(history: &mut Vec<String>) -> Result<String> {
    let mut input: Vec<char> = Vec::new();
    let mut history_index: Option<usize> = None;

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }
        match key_event.code {
            KeyCode::Enter => {
                let line: String = input.iter().collect();
                if !line.trim().is_empty() {
                    history.push(line.clone());
                }
                return Ok(line);
            }
            KeyCode::Char(c) => {
                input.push(c);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Up => {
                if history.is_empty() {
                    continue;
                }
                let new_index = match history_index {
                    None => history.len() - 1,
                    Some(idx) if idx > 0 => idx - 1,
                    Some(idx) => idx,
                };
                history_index = Some(new_index);
                input = history[new_index].chars().collect();
            }
            KeyCode::Down => {
                let Some(idx) = history_index else {
                    continue;
                };
                if idx + 1 < history.len() {
                    history_index = Some(idx + 1);
                    input = history[idx + 1].chars().collect();
                } else {
                    history_index = None;
                    input.clear();
                }
            }
            KeyCode::Esc => return Ok(String::new()),
            _ => continue,
        }
        redraw(&input.iter().collect::<String>())?;
    }
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask anything about the loaded documents", "<question>".green());
    println!("  {} - Show the conversation so far", "history".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  when is the application deadline?");
    println!("  which documents mention housing?");
}

/// Label shown in front of a transcript message
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::System => "System",
    }
}

/// Print the transcript in order, one role-tagged message per block
pub fn print_transcript(messages: &[ConversationMessage]) {
    if messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    for message in messages {
        let label = role_label(message.role);
        let label = match message.role {
            Role::User => label.green().bold(),
            _ => label.cyan().bold(),
        };
        println!("{}: {}", label, message.content);
        println!();
    }
}

/// Report how the knowledge base was prepared
pub fn print_outcome(outcome: &IngestionOutcome) {
    let line = outcome.to_string();
    match outcome {
        IngestionOutcome::Empty => println!("{} {}", "!".yellow().bold(), line.yellow()),
        IngestionOutcome::RebuiltAfterCorruption { .. }
        | IngestionOutcome::RebuiltAfterModelChange { .. } => {
            println!("{} {}", "!".yellow().bold(), line)
        }
        _ => println!("{} {}", "✓".green().bold(), line),
    }
}

/// List the files an answer drew on
pub fn print_sources(sources: &[PathBuf]) {
    if sources.is_empty() {
        return;
    }
    println!("{}", format_sources(sources).dimmed());
}

fn format_sources(sources: &[PathBuf]) -> String {
    let names: Vec<String> = sources
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    format!("Sources: {}", names.join(", "))
}

/// Write one streamed fragment and make it visible immediately
pub fn print_fragment(fragment: &str) {
    print!("{}", fragment);
    let _ = io::stdout().flush();
}

pub fn print_notice(message: &str) {
    println!("{} {}", "ℹ".cyan(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}
