//! saferide-text
//!
//! Text side of the pipeline: lemmatize-and-filter normalization, vocabulary
//! lookup into fixed-length id vectors, and the out-of-vocabulary gate.

pub mod gate;
pub mod lemmatizer;
pub mod normalize;
pub mod vocab;

pub use gate::ConfidenceGate;
pub use lemmatizer::TantivyLemmatizer;
pub use normalize::Normalizer;
pub use vocab::{TokenIds, Vocabulary, PAD_ID};
