use std::collections::HashSet;

use saferide_core::error::{Error, Result};
use saferide_core::knowledge::{KnowledgeBase, ResponseClasses};

/// Canned response for a class, optionally followed by one example.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub class_index: usize,
    pub text: String,
    /// Intent of the knowledge record the canonical text matched, if any.
    pub intent: Option<String>,
    pub enriched: bool,
}

/// Maps a class index to its canonical text and cross-references the
/// knowledge base. The first record with an identical completion decides;
/// with duplicated completions the answer therefore depends on file order.
pub struct ResponseResolver {
    classes: ResponseClasses,
    knowledge: KnowledgeBase,
    technical_intents: HashSet<String>,
}

impl ResponseResolver {
    pub fn new<I, S>(classes: ResponseClasses, knowledge: KnowledgeBase, technical_intents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let technical_intents = technical_intents.into_iter().map(Into::into).collect();
        Self { classes, knowledge, technical_intents }
    }

    pub fn resolve(&self, top_class_index: usize) -> Result<Resolved> {
        let canonical = self
            .classes
            .text(top_class_index)
            .ok_or_else(|| Error::NotFound(format!("response class {top_class_index}")))?;

        let Some(record) = self.knowledge.find_by_completion(canonical) else {
            tracing::debug!(class = top_class_index, "no knowledge record for class");
            return Ok(Resolved { class_index: top_class_index, text: canonical.to_string(), intent: None, enriched: false });
        };

        let example = record.first_example().filter(|_| self.technical_intents.contains(&record.intent));
        let (text, enriched) = match example {
            Some(example) => (format!("{canonical}\n\nEjemplo:\n{example}"), true),
            None => (canonical.to_string(), false),
        };
        Ok(Resolved { class_index: top_class_index, text, intent: Some(record.intent.clone()), enriched })
    }

    pub fn classes(&self) -> &ResponseClasses { &self.classes }

    pub fn knowledge(&self) -> &KnowledgeBase { &self.knowledge }

    /// Classes whose canonical text has no knowledge record.
    pub fn unmatched_classes(&self) -> Vec<usize> {
        self.classes
            .iter()
            .filter(|(_, text)| self.knowledge.find_by_completion(text).is_none())
            .map(|(i, _)| i)
            .collect()
    }
}
