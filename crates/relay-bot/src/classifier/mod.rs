//! Spam classifier backend

mod openai;

pub use openai::{OpenAiClassifier, SYSTEM_PROMPT};
