use crate::time::Symbol;
use thiserror::Error;

/// Failures surfaced while replaying corporate events or cash events. Per §7 propagation policy,
/// these are logged and skipped per-symbol rather than aborting the tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("unknown symbol {0}")]
    UnknownSymbol(Symbol),

    #[error("event {0} already applied")]
    AlreadyApplied(&'static str),
}
