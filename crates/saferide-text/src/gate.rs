use crate::vocab::TokenIds;

/// Refuses inputs dominated by unknown words before they reach the classifier.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceGate {
    threshold: f64,
}

impl Default for ConfidenceGate {
    fn default() -> Self { Self { threshold: 0.4 } }
}

impl ConfidenceGate {
    pub fn new(threshold: f64) -> Self { Self { threshold } }

    pub fn threshold(&self) -> f64 { self.threshold }

    /// Takes the unpadded ids so padding never counts toward the ratio.
    /// An empty sequence is never confident.
    pub fn is_confident(&self, ids: &TokenIds) -> bool {
        !ids.is_empty() && ids.oov_ratio() <= self.threshold
    }
}
