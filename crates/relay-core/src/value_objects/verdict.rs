//! Moderation verdict
//!
//! The classifier backend answers with a JSON document of exactly two fields,
//! `{"spam": bool, "reason": string}`. Anything else is a schema violation.

use serde::{Deserialize, Serialize};

/// Outcome of a spam check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Verdict {
    #[serde(rename = "spam")]
    pub is_spam: bool,
    pub reason: String,
}

impl Verdict {
    pub fn spam(reason: impl Into<String>) -> Self {
        Self {
            is_spam: true,
            reason: reason.into(),
        }
    }

    pub fn clean(reason: impl Into<String>) -> Self {
        Self {
            is_spam: false,
            reason: reason.into(),
        }
    }

    /// Strictly parse a backend answer
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.trim())
    }
}
