//! Read-only artifacts loaded once at startup: the response-class map and the
//! conversation knowledge base. Any load problem is an [`Error::Artifact`].

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::KnowledgeRecord;

/// Closed set of canned responses, index ↔ text.
#[derive(Debug, Clone)]
pub struct ResponseClasses {
    texts: Vec<String>,
    by_text: HashMap<String, usize>,
}

impl ResponseClasses {
    /// Reads a `{ "<canonical text>": <index> }` JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::artifact(path, e))?;
        let map: HashMap<String, usize> = serde_json::from_str(&raw).map_err(|e| Error::artifact(path, e))?;
        let classes = Self::from_map(map).map_err(|e| Error::artifact(path, e))?;
        tracing::info!(classes = classes.len(), path = %path.display(), "loaded response classes");
        Ok(classes)
    }

    /// Indices must be exactly `0..N`, each used once.
    pub fn from_map(map: HashMap<String, usize>) -> Result<Self> {
        let n = map.len();
        let mut slots: Vec<Option<String>> = vec![None; n];
        for (text, idx) in &map {
            let slot = slots
                .get_mut(*idx)
                .ok_or_else(|| Error::Operation(format!("class index {idx} out of range 0..{n}")))?;
            if slot.is_some() {
                return Err(Error::Operation(format!("class index {idx} assigned twice")));
            }
            *slot = Some(text.clone());
        }
        let texts: Vec<String> = slots.into_iter().flatten().collect();
        Ok(Self { texts, by_text: map })
    }

    pub fn from_texts<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (i, t) in texts.into_iter().enumerate() {
            let t = t.into();
            if map.insert(t.clone(), i).is_some() {
                return Err(Error::Operation(format!("duplicate response text: {t:?}")));
            }
        }
        Self::from_map(map)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.texts.get(index).map(String::as_str)
    }

    pub fn index_of(&self, text: &str) -> Option<usize> {
        self.by_text.get(text).copied()
    }

    pub fn len(&self) -> usize { self.texts.len() }

    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.texts.iter().enumerate().map(|(i, t)| (i, t.as_str()))
    }
}

#[derive(Deserialize)]
struct KnowledgeFile {
    conversations: Vec<KnowledgeRecord>,
}

/// Conversation records, in file order.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: Vec<KnowledgeRecord>,
}

impl KnowledgeBase {
    /// Reads a `{ "conversations": [...] }` JSON document.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::artifact(path, e))?;
        let kb = Self::from_json_str(&raw).map_err(|e| Error::artifact(path, e))?;
        tracing::info!(records = kb.len(), path = %path.display(), "loaded knowledge base");
        let shared = kb.shared_completions();
        if !shared.is_empty() {
            tracing::warn!(completions = shared.len(), "knowledge base has completions shared by several records; first record wins");
        }
        Ok(kb)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: KnowledgeFile = serde_json::from_str(raw).map_err(|e| Error::Operation(e.to_string()))?;
        Ok(Self { records: file.conversations })
    }

    pub fn from_records(records: Vec<KnowledgeRecord>) -> Self {
        Self { records }
    }

    /// First record whose completion equals `completion` exactly.
    pub fn find_by_completion(&self, completion: &str) -> Option<&KnowledgeRecord> {
        self.records.iter().find(|r| r.completion == completion)
    }

    /// Completion texts carried by more than one record, with their counts,
    /// in order of first appearance.
    pub fn shared_completions(&self) -> Vec<(&str, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for r in &self.records {
            let c = counts.entry(r.completion.as_str()).or_insert(0);
            if *c == 0 { order.push(r.completion.as_str()); }
            *c += 1;
        }
        order.into_iter().filter_map(|t| counts.get(t).filter(|n| **n > 1).map(|n| (t, *n))).collect()
    }

    pub fn records(&self) -> &[KnowledgeRecord] { &self.records }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}
