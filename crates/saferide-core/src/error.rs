use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A startup artifact is missing or corrupt. The service must not start.
    #[error("Failed to load artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    #[error("Lemmatizer failed: {0}")]
    Lemmatizer(String),

    #[error("Scorer failed: {0}")]
    Scorer(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Artifact { path: path.into(), reason: reason.to_string() }
    }

    /// True for faults of an external collaborator during a single request.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Lemmatizer(_) | Self::Scorer(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
