use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream};

use saferide_core::error::{Error, Result};
use saferide_core::traits::Lemmatizer;
use saferide_core::types::Lemma;

/// Input guard in characters until a caller raises it.
pub const DEFAULT_MAX_LENGTH: usize = 1_000_000;

/// Re-stemming passes before a stem is taken as final.
const MAX_STEM_PASSES: usize = 8;

/// Tantivy analyzer chain standing in for a lemmatizer: alphanumeric word
/// split, lowercasing and Snowball stemming. Lemmas are stems, re-stemmed
/// until stable so a normalized text normalizes to itself.
pub struct TantivyLemmatizer {
    analyzer: TextAnalyzer,
    stemming: bool,
    max_length: usize,
}

impl TantivyLemmatizer {
    pub fn new(language: Option<Language>) -> Self {
        let stemming = language.is_some();
        let analyzer = match language {
            Some(lang) => TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(LowerCaser)
                .filter(Stemmer::new(lang))
                .build(),
            None => TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build(),
        };
        Self { analyzer, stemming, max_length: DEFAULT_MAX_LENGTH }
    }

    /// `none` disables stemming.
    pub fn for_language(name: &str) -> Result<Self> {
        let language = match name.to_ascii_lowercase().as_str() {
            "none" => None,
            "spanish" | "es" => Some(Language::Spanish),
            "english" | "en" => Some(Language::English),
            "portuguese" | "pt" => Some(Language::Portuguese),
            "french" | "fr" => Some(Language::French),
            "italian" | "it" => Some(Language::Italian),
            "german" | "de" => Some(Language::German),
            other => return Err(Error::InvalidConfig(format!("unsupported lemmatizer language: {other}"))),
        };
        Ok(Self::new(language))
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            out.push(stream.token().text.clone());
        }
        out
    }

    /// Stems `stem` again until it stops changing (`viajeros → viajer → viaj`).
    fn settle(&self, mut stem: String) -> String {
        for _ in 0..MAX_STEM_PASSES {
            match self.analyze(&stem).as_slice() {
                [next] if *next != stem => stem = next.clone(),
                _ => break,
            }
        }
        stem
    }
}

impl Lemmatizer for TantivyLemmatizer {
    fn max_length(&self) -> usize { self.max_length }

    fn set_max_length(&mut self, max_length: usize) { self.max_length = max_length; }

    fn lemmatize(&self, text: &str) -> Result<Vec<Lemma>> {
        let chars = text.chars().count();
        if chars > self.max_length {
            return Err(Error::Lemmatizer(format!("input of {chars} characters exceeds limit of {}", self.max_length)));
        }
        Ok(self
            .analyze(text)
            .into_iter()
            .map(|token| if self.stemming { self.settle(token) } else { token })
            .map(Lemma::classify)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_flags_tokens() {
        let lem = TantivyLemmatizer::for_language("none").unwrap();
        let out = lem.lemmatize("¿Hola, viaje 24 a1?").unwrap();
        let texts: Vec<&str> = out.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["hola", "viaje", "24", "a1"]);
        assert!(out[0].is_alpha && !out[0].is_digit);
        assert!(out[2].is_digit && !out[2].is_alpha);
        assert!(!out[3].is_alpha && !out[3].is_digit);
    }

    #[test]
    fn length_guard() {
        let mut lem = TantivyLemmatizer::for_language("none").unwrap();
        lem.set_max_length(3);
        assert!(matches!(lem.lemmatize("hola"), Err(Error::Lemmatizer(_))));
        assert!(TantivyLemmatizer::for_language("klingon").is_err());
    }

    #[test]
    fn stems_are_fixed_points() {
        let lem = TantivyLemmatizer::for_language("spanish").unwrap();
        let once: Vec<String> = lem.lemmatize("viajeros").unwrap().into_iter().map(|l| l.text).collect();
        assert_eq!(once.len(), 1);
        let twice: Vec<String> = lem.lemmatize(&once[0]).unwrap().into_iter().map(|l| l.text).collect();
        assert_eq!(once, twice);
    }
}
