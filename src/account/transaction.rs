//! The append-only transaction log every mutating account operation emits (§3 `transactions`,
//! §4.8 step 6).

use crate::money::Money;
use crate::time::{Instant, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransactionKind {
    Buy,
    Sell,
    Short,
    Cover,
    Dividend,
    BondCoupon,
    BondMaturity,
    LoanDraw,
    LoanPayment,
    LoanPenalty,
    CorporateEvent,
    Fee,
    Tax,
    MarginInterest,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
    pub id: uuid::Uuid,
    pub at: Instant,
    pub kind: TransactionKind,
    pub symbol: Option<Symbol>,
    pub shares: Option<i64>,
    pub price: Option<f64>,
    pub cash_delta: Money,
    pub fees: Money,
    pub taxes: Money,
    pub note: String,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        at: Instant,
        kind: TransactionKind,
        symbol: Option<Symbol>,
        shares: Option<i64>,
        price: Option<f64>,
        cash_delta: Money,
        fees: Money,
        taxes: Money,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            at,
            kind,
            symbol,
            shares,
            price,
            cash_delta,
            fees,
            taxes,
            note: note.into(),
        }
    }
}
