//! Runtime setting - durable key/value facts written once at bootstrap

/// Key under which the moderation thread id is stored
pub const SPAM_TOPIC_KEY: &str = "spam_topic";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSetting {
    pub key: String,
    pub value: String,
}

impl RuntimeSetting {
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}
