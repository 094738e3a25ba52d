//! Domain types shared by the text, model and chat crates.

use serde::{Deserialize, Serialize};

/// Neutral id used to pad vectorized inputs; never assigned to a token.
pub const PAD_ID: u32 = 0;

/// One token as produced by the lemmatizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
    pub text: String,
    pub is_alpha: bool,
    pub is_digit: bool,
}

impl Lemma {
    pub fn new(text: impl Into<String>, is_alpha: bool, is_digit: bool) -> Self {
        Self { text: text.into(), is_alpha, is_digit }
    }

    /// Flags derived from the lemma text itself.
    pub fn classify(text: impl Into<String>) -> Self {
        let text = text.into();
        let is_alpha = !text.is_empty() && text.chars().all(char::is_alphabetic);
        let is_digit = !text.is_empty() && text.chars().all(|c| c.is_ascii_digit());
        Self { text, is_alpha, is_digit }
    }
}

/// One conversation entry of the knowledge base.
///
/// Several records may share the same `completion`; lookups match on that
/// text, never on record identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeRecord {
    pub prompt: String,
    pub completion: String,
    pub intent: String,
    pub task: String,
    pub meaning: String,
    pub examples: Vec<String>,
    #[serde(alias = "patterns")]
    pub pattern: Vec<String>,
}

impl KnowledgeRecord {
    pub fn first_example(&self) -> Option<&str> {
        self.examples.first().map(String::as_str)
    }
}
