use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecallError {
    /// Similarity requested over vectors of different lengths.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A document could not be resolved by its source. Never fatal to assembly.
    #[error("unreadable document '{id}': {reason}")]
    UnreadableDocument { id: String, reason: String },

    /// A snapshot payload failed to parse or validate.
    #[error("corrupt snapshot: {0}")]
    SerializationCorrupt(String),

    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] serde_json::Error),
}

impl RecallError {
    pub fn unreadable(id: impl Into<String>, reason: impl ToString) -> Self {
        RecallError::UnreadableDocument {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        RecallError::SerializationCorrupt(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, RecallError>;
