//! Operator notifications.

pub mod telegram;

pub use telegram::{TelegramCredentials, TelegramNotifier};
