use regex::{Regex, RegexSet};
use std::borrow::Cow;

use saferide_core::error::{Error, Result};

/// Phrasings that mark an utterance as an arithmetic question. Any single
/// match is enough. Matched against the lowercased raw utterance.
const MATH_PATTERNS: [&str; 7] = [
    r"\d+\s*[\+\-\*/x×÷]\s*\d+",
    r"cuanto es (.*)\?",
    r"calcula (.*)",
    r"resultado de (.*)",
    r"\d+\s*\^\s*\d+",
    r"raiz cuadrada de \d+",
    r"\d+\s*!",
];

/// Lead-in phrasings whose trailing content (minus a final `?`) is the expression.
const LEAD_IN: &str = r"(?:cuanto es|calcula|resultado de)\s*(.*?)\??$";

pub struct MathDetector {
    patterns: RegexSet,
    lead_in: Regex,
}

impl MathDetector {
    pub fn new() -> Result<Self> {
        let patterns = RegexSet::new(MATH_PATTERNS).map_err(|e| Error::Operation(format!("math patterns: {e}")))?;
        let lead_in = Regex::new(LEAD_IN).map_err(|e| Error::Operation(format!("math lead-in: {e}")))?;
        Ok(Self { patterns, lead_in })
    }

    pub fn looks_like_math(&self, text: &str) -> bool {
        self.patterns.is_match(&text.to_lowercase())
    }

    /// The captured expression after a lead-in phrase (lowercased), or the
    /// whole utterance untouched when there is no lead-in.
    pub fn extract_expression<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let lower = text.to_lowercase();
        match self.lead_in.captures(&lower).and_then(|c| c.get(1)) {
            Some(m) => Cow::Owned(m.as_str().to_string()),
            None => Cow::Borrowed(text),
        }
    }

    /// `Some(expression)` when the utterance is a math question.
    pub fn detect<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        if self.looks_like_math(text) { Some(self.extract_expression(text)) } else { None }
    }
}
