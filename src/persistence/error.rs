use thiserror::Error;

/// Persistence failures abort the current mutation batch; the in-memory state is rolled back to
/// the pre-batch snapshot and the batch retries on the next tick (§7).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no saved state found at {0}")]
    NotFound(String),
}
