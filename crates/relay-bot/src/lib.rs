//! # relay-bot
//!
//! Infrastructure adapters and process assembly:
//!
//! - [`telegram`] - Bot API client implementing `MessagingGateway` and the
//!   long-polling update source
//! - [`classifier`] - OpenAI-compatible chat-completions `Classifier`
//! - [`captcha`] - animated GIF `CaptchaGenerator`
//! - [`app`] - wiring of every layer and the run loop

pub mod app;
pub mod captcha;
pub mod classifier;
pub mod telegram;

pub use app::run;
pub use captcha::GifCaptcha;
pub use classifier::OpenAiClassifier;
pub use telegram::{Poller, TelegramClient};
