use crate::error::Result;
use crate::types::Lemma;

/// External lemmatization service.
pub trait Lemmatizer: Send + Sync {
    /// Longest input, in characters, accepted by `lemmatize`.
    fn max_length(&self) -> usize;
    /// Raise or lower the input length guard.
    fn set_max_length(&mut self, max_length: usize);
    fn lemmatize(&self, text: &str) -> Result<Vec<Lemma>>;
}

/// Trained intent classifier, consumed as an opaque scoring function.
pub trait IntentScorer: Send + Sync {
    /// Size of the closed class set the distribution ranges over.
    fn num_classes(&self) -> usize;
    /// Probability distribution over `num_classes()` classes for a vectorized input.
    fn score(&self, ids: &[u32]) -> Result<Vec<f32>>;
    /// Exclusive upper bound on token ids the scorer can embed, if it has one.
    fn token_capacity(&self) -> Option<usize> { None }
}
