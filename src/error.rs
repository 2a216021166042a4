use crate::{persistence::error::PersistenceError, trade::error::TradeError};
use thiserror::Error;

/// Crate-wide error aggregate. Validation errors (see [`TradeError`]) are returned to callers and
/// never abort the engine; [`PersistenceError`] aborts only the current mutation batch (§7
/// propagation policy).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("trade rejected: {0}")]
    Trade(#[from] TradeError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
