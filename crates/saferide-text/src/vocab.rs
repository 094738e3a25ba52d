//! Fitted vocabulary and the normalized-text → fixed-length id vectorizer.
//!
//! The artifact is the exported word index of the trained tokenizer:
//!
//! ```json
//! { "oov_token": "<OOV>", "num_words": 700, "word_index": { "<OOV>": 1, "viaje": 2 } }
//! ```
//!
//! Ids start at 1; `0` is reserved for padding. With `num_words` set, words
//! ranked at or beyond the cap map to the OOV id, as they did at training time.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::Model;

use saferide_core::error::{Error, Result};
pub use saferide_core::types::PAD_ID;

#[derive(Deserialize)]
struct VocabularyFile {
    #[serde(default = "default_oov_token")]
    oov_token: String,
    #[serde(default)]
    num_words: Option<u32>,
    word_index: HashMap<String, u32>,
}

fn default_oov_token() -> String { "<OOV>".to_string() }

pub struct Vocabulary {
    model: WordLevel,
    oov_id: u32,
    num_words: Option<u32>,
    max_id: u32,
    len: usize,
}

impl Vocabulary {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::artifact(path, e))?;
        let file: VocabularyFile = serde_json::from_str(&raw).map_err(|e| Error::artifact(path, e))?;
        let vocab = Self::from_word_index(file.word_index, &file.oov_token, file.num_words)
            .map_err(|e| Error::artifact(path, e))?;
        tracing::info!(tokens = vocab.len(), oov_id = vocab.oov_id(), path = %path.display(), "loaded vocabulary");
        Ok(vocab)
    }

    pub fn from_word_index(word_index: HashMap<String, u32>, oov_token: &str, num_words: Option<u32>) -> Result<Self> {
        let oov_id = *word_index
            .get(oov_token)
            .ok_or_else(|| Error::NotFound(format!("OOV token {oov_token:?} missing from word index")))?;
        let mut seen = HashSet::with_capacity(word_index.len());
        for (token, id) in &word_index {
            if *id == PAD_ID {
                return Err(Error::Operation(format!("token {token:?} uses the padding id {PAD_ID}")));
            }
            if !seen.insert(*id) {
                return Err(Error::Operation(format!("id {id} assigned to more than one token")));
            }
        }
        if num_words.is_some_and(|cap| oov_id >= cap) {
            return Err(Error::Operation(format!("OOV id {oov_id} falls outside num_words cap")));
        }
        let len = word_index.len();
        let largest = word_index.values().copied().max().unwrap_or(oov_id);
        let max_id = match num_words {
            Some(cap) => largest.min(cap.saturating_sub(1)).max(oov_id),
            None => largest,
        };
        let model = WordLevel::builder()
            .vocab(word_index)
            .unk_token(oov_token.to_string())
            .build()
            .map_err(|e| Error::Operation(format!("word level model: {e}")))?;
        Ok(Self { model, oov_id, num_words, max_id, len })
    }

    pub fn oov_id(&self) -> u32 { self.oov_id }

    /// Largest id `encode` can emit.
    pub fn max_id(&self) -> u32 { self.max_id }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Id of one token; unknown or capped-out tokens map to the OOV id.
    pub fn id_of(&self, token: &str) -> u32 {
        match self.model.token_to_id(token) {
            Some(id) if self.num_words.map_or(true, |cap| id < cap) => id,
            _ => self.oov_id,
        }
    }

    /// Whitespace split and lookup, before any padding.
    pub fn encode(&self, normalized: &str) -> TokenIds {
        let ids = normalized.split_whitespace().map(|t| self.id_of(t)).collect();
        TokenIds { ids, oov_id: self.oov_id }
    }

    /// Exactly `max_len` ids.
    pub fn vectorize(&self, normalized: &str, max_len: usize) -> Vec<u32> {
        self.encode(normalized).padded(max_len)
    }
}

/// Token ids of one utterance, unpadded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIds {
    ids: Vec<u32>,
    oov_id: u32,
}

impl TokenIds {
    pub fn as_slice(&self) -> &[u32] { &self.ids }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn oov_count(&self) -> usize {
        self.ids.iter().filter(|id| **id == self.oov_id).count()
    }

    /// Fraction of OOV ids; 0 for an empty sequence.
    pub fn oov_ratio(&self) -> f64 {
        if self.ids.is_empty() { return 0.0; }
        self.oov_count() as f64 / self.ids.len() as f64
    }

    /// Right-padded with [`PAD_ID`] or right-truncated to `max_len`.
    pub fn padded(&self, max_len: usize) -> Vec<u32> {
        let mut out: Vec<u32> = self.ids.iter().copied().take(max_len).collect();
        out.resize(max_len, PAD_ID);
        out
    }
}
