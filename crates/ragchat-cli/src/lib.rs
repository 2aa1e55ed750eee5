//! Terminal interface for RagChat

mod command;
pub mod logging;
mod ui;

pub use command::{parse_command, Command};
pub use ui::{
    display_banner, handle_input_with_history, print_error, print_fragment, print_help,
    print_notice, print_outcome, print_sources, print_transcript, role_label,
};

// Re-export core types
pub use ragchat_core::{Error, Result};
