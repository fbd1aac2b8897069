use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{Classifier, ClassifierError};

/// One scripted classifier reaction
#[derive(Debug, Clone)]
pub enum Script {
    /// Raw answer text
    Answer(String),
    Fail(ClassifierError),
    /// Never answers within any reasonable deadline
    Hang,
}

impl Script {
    pub fn verdict(spam: bool, reason: &str) -> Self {
        Self::Answer(format!(r#"{{"spam": {spam}, "reason": "{reason}"}}"#))
    }
}

/// Plays back scripted answers, then answers "clean"
#[derive(Debug)]
pub struct ScriptedClassifier {
    configured: bool,
    script: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = Script>) -> Self {
        Self {
            configured: true,
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// No credentials: moderation uses keywords only
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new([])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _text: &str) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        match next {
            Some(Script::Answer(raw)) => Ok(raw),
            Some(Script::Fail(err)) => Err(err),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ClassifierError::Unknown("hang script resumed".to_string()))
            }
            None => Ok(r#"{"spam": false, "reason": "looks fine"}"#.to_string()),
        }
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
