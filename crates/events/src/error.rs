//! Journal and sink errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("event encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{file}:{line}: not a vault event ({reason})")]
    InvalidFile {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("event sink lock poisoned")]
    Poisoned,
}
