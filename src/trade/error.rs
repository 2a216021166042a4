use crate::{money::Money, time::Symbol};
use thiserror::Error;

/// Every way a [`crate::trade::Order`] (or a catalog replay step that behaves like one) can be
/// rejected. Validation errors carry enough context to be human-readable and are returned to the
/// caller verbatim; they never abort the engine (§7 propagation policy).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("market is closed")]
    MarketClosed,

    #[error("trading halted: {halt_id}")]
    TradingHalted { halt_id: &'static str },

    #[error("unknown symbol {0}")]
    UnknownSymbol(Symbol),

    #[error("{0} is not listed yet")]
    NotListedYet(Symbol),

    #[error("{0} has been delisted")]
    Delisted(Symbol),

    #[error("insufficient cash: need {needed}, have {available}")]
    InsufficientCash { needed: Money, available: Money },

    #[error("insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: u64, available: u64 },

    #[error("insufficient float: need {needed}, available {available}")]
    InsufficientFloat { needed: u64, available: u64 },

    #[error("limit price not crossed")]
    LimitNotCrossed,

    #[error("credit score {score} too low (need {required})")]
    CreditTooLow { score: u32, required: u32 },

    #[error("no loan available from any lender")]
    LoanUnavailable,

    #[error("trade would exceed concentration limit for {0}")]
    ConcentrationExceeded(Symbol),

    #[error("trade would exceed leverage limit")]
    LeverageExceeded,

    #[error("event already applied")]
    EventAlreadyApplied,
}
