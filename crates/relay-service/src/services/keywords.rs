//! Prohibited-word list for the keyword fallback
//!
//! Matching is a case-sensitive substring scan; the first listed word that
//! occurs in the text wins.

use std::path::Path;

const EMBEDDED: &str = include_str!("../../assets/prohibited_words.txt");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordList {
    words: Vec<String>,
}

impl KeywordList {
    /// The list shipped with the binary
    pub fn embedded() -> Self {
        Self::from_text(EMBEDDED)
    }

    /// One word per line; blank lines are skipped
    pub fn from_text(text: &str) -> Self {
        let words = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect();
        Self { words }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a list from disk
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be read
    pub fn load(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(|text| Self::from_text(&text))
    }

    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.words
            .iter()
            .find(|word| text.contains(word.as_str()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
