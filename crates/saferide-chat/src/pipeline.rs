//! Response resolution for one utterance.
//!
//! ```text
//! START ─ math? ─┬─ yes ─ evaluate ─┬─ value ──────────── Math
//!                │                  └─ none ───────────── MathUnresolved
//!                └─ no ── normalize ─ encode ─┬─ empty ── EmptyInput
//!                                             └─ gate ─┬─ low ── LowConfidence
//!                                                      └─ ok ─── classify ─ resolve ─ Answered
//! ```
//!
//! Every outcome is a successful reply. Only lemmatizer or scorer faults come
//! back as `Err`.

use anyhow::Context;
use serde::Serialize;

use saferide_core::config::{Messages, Settings};
use saferide_core::error::{Error, Result};
use saferide_core::knowledge::{KnowledgeBase, ResponseClasses};
use saferide_core::traits::{IntentScorer, Lemmatizer};
use saferide_math::{evaluate, format_number, MathDetector};
use saferide_model::get_default_scorer;
use saferide_text::{ConfidenceGate, Normalizer, TantivyLemmatizer, Vocabulary};

use crate::resolver::ResponseResolver;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Math { expression: String, value: f64 },
    MathUnresolved { expression: String },
    EmptyInput,
    LowConfidence { oov_ratio: f64 },
    Answered { class_index: usize, enriched: bool },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Math { .. } => "math",
            Outcome::MathUnresolved { .. } => "math_unresolved",
            Outcome::EmptyInput => "empty_input",
            Outcome::LowConfidence { .. } => "low_confidence",
            Outcome::Answered { .. } => "answered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub outcome: Outcome,
    pub text: String,
}

pub struct ChatPipeline {
    detector: MathDetector,
    normalizer: Normalizer,
    vocabulary: Vocabulary,
    gate: ConfidenceGate,
    scorer: Box<dyn IntentScorer>,
    resolver: ResponseResolver,
    max_len: usize,
    messages: Messages,
}

impl ChatPipeline {
    /// Assembles the pipeline and checks the artifacts agree with each other.
    pub fn new(
        settings: &Settings,
        lemmatizer: Box<dyn Lemmatizer>,
        vocabulary: Vocabulary,
        classes: ResponseClasses,
        knowledge: KnowledgeBase,
        scorer: Box<dyn IntentScorer>,
    ) -> Result<Self> {
        settings.validate()?;
        if classes.is_empty() {
            return Err(Error::InvalidConfig("response map has no classes".to_string()));
        }
        if scorer.num_classes() != classes.len() {
            return Err(Error::InvalidConfig(format!(
                "scorer predicts {} classes but the response map has {}",
                scorer.num_classes(),
                classes.len()
            )));
        }
        if let Some(capacity) = scorer.token_capacity() {
            if vocabulary.max_id() as usize >= capacity {
                return Err(Error::InvalidConfig(format!(
                    "vocabulary emits ids up to {} but the scorer embeds only {capacity}",
                    vocabulary.max_id()
                )));
            }
        }
        let resolver = ResponseResolver::new(classes, knowledge, settings.technical_intents.iter().cloned());
        let unmatched = resolver.unmatched_classes();
        if !unmatched.is_empty() {
            tracing::warn!(classes = unmatched.len(), "response classes without a knowledge record");
        }
        Ok(Self {
            detector: MathDetector::new()?,
            normalizer: Normalizer::new(lemmatizer),
            vocabulary,
            gate: ConfidenceGate::new(settings.oov_threshold),
            scorer,
            resolver,
            max_len: settings.max_len,
            messages: settings.messages.clone(),
        })
    }

    /// Loads every artifact named by `settings`. Any failure here means the
    /// service must not start.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let paths = &settings.artifacts;
        let vocabulary = Vocabulary::load(&paths.vocabulary_path())?;
        let classes = ResponseClasses::load(&paths.response_map_path())?;
        let knowledge = KnowledgeBase::load(&paths.knowledge_base_path())?;
        let lemmatizer = TantivyLemmatizer::for_language(&settings.lemmatizer.language)?;
        let scorer = get_default_scorer(&paths.model_path(), classes.len())
            .with_context(|| format!("loading scorer from {}", paths.model_path().display()))?;
        Ok(Self::new(settings, Box::new(lemmatizer), vocabulary, classes, knowledge, scorer)?)
    }

    pub fn reply(&self, utterance: &str) -> Result<Reply> {
        if let Some(expression) = self.detector.detect(utterance) {
            let expression = expression.into_owned();
            let reply = match evaluate(&expression) {
                Some(value) => Reply {
                    text: format!("El resultado de {expression} es {}", format_number(value)),
                    outcome: Outcome::Math { expression, value },
                },
                None => Reply { text: self.messages.math_failure.clone(), outcome: Outcome::MathUnresolved { expression } },
            };
            tracing::debug!(outcome = reply.outcome.label(), "math short-circuit");
            return Ok(reply);
        }

        let normalized = self.normalizer.normalize(utterance)?;
        let ids = self.vocabulary.encode(&normalized);
        if ids.is_empty() {
            tracing::debug!(outcome = "empty_input", "nothing left after normalization");
            return Ok(Reply { outcome: Outcome::EmptyInput, text: self.messages.empty_input.clone() });
        }

        if !self.gate.is_confident(&ids) {
            let oov_ratio = ids.oov_ratio();
            tracing::debug!(outcome = "low_confidence", oov_ratio, tokens = ids.len(), "refused before classification");
            return Ok(Reply { outcome: Outcome::LowConfidence { oov_ratio }, text: self.messages.low_confidence.clone() });
        }

        let class_index = self.classify(&ids.padded(self.max_len))?;
        let resolved = self.resolver.resolve(class_index)?;
        tracing::debug!(outcome = "answered", class = class_index, intent = ?resolved.intent, enriched = resolved.enriched, "resolved");
        Ok(Reply { outcome: Outcome::Answered { class_index, enriched: resolved.enriched }, text: resolved.text })
    }

    /// Arg-max over the scorer's distribution; ties go to the lowest index.
    pub fn classify(&self, padded: &[u32]) -> Result<usize> {
        let probs = self.scorer.score(padded)?;
        if probs.len() != self.resolver.classes().len() {
            return Err(Error::Scorer(format!(
                "distribution has {} entries, expected {}",
                probs.len(),
                self.resolver.classes().len()
            )));
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(Error::Scorer("distribution contains non-finite scores".to_string()));
        }
        Ok(probs.iter().enumerate().fold(0, |best, (i, p)| if *p > probs[best] { i } else { best }))
    }

    pub fn messages(&self) -> &Messages { &self.messages }

    pub fn max_len(&self) -> usize { self.max_len }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn resolver(&self) -> &ResponseResolver { &self.resolver }

    pub fn scorer(&self) -> &dyn IntentScorer { self.scorer.as_ref() }
}
