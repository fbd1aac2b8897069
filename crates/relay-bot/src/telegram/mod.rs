//! Telegram Bot API adapter

mod client;
mod poller;
pub mod types;

pub use client::TelegramClient;
pub use poller::Poller;
