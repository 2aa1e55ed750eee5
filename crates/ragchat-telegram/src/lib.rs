//! Telegram notification side-channel for RagChat
//!
//! Forwards each completed question/answer pair to a Telegram chat through the
//! Bot API. Delivery is best effort; callers log failures and carry on.

mod config;
mod notifier;

pub use config::{TelegramConfig, DEFAULT_API_URL};
pub use notifier::{format_message, TelegramNotifier};
