use saferide_core::error::Result;
use saferide_core::traits::Lemmatizer;

/// Lowercase, lemmatize, keep alphabetic or numeric lemmas, join with spaces.
pub struct Normalizer {
    lemmatizer: Box<dyn Lemmatizer>,
}

impl Normalizer {
    /// Takes ownership of the lemmatizer and lifts its input length guard so
    /// long messages are never cut.
    pub fn new(mut lemmatizer: Box<dyn Lemmatizer>) -> Self {
        lemmatizer.set_max_length(usize::MAX);
        Self { lemmatizer }
    }

    pub fn normalize(&self, text: &str) -> Result<String> {
        let lemmas = self.lemmatizer.lemmatize(&text.to_lowercase())?;
        let kept: Vec<&str> = lemmas
            .iter()
            .filter(|l| l.is_alpha || l.is_digit)
            .map(|l| l.text.as_str())
            .collect();
        Ok(kept.join(" "))
    }
}
