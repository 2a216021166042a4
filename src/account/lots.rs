//! Cost-basis lot accounting: FIFO by default, closed oldest-first on a sell, each lot carrying
//! its own acquisition date (for the short/long-term capital-gains split in §6) and per-share
//! cost basis (adjusted by splits, §4.6).

use crate::money::Money;
use crate::time::{Instant, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PurchaseLot {
    pub symbol: Symbol,
    pub shares: i64,
    pub cost_basis_per_share: Money,
    pub acquired_at: Instant,
}

/// One FIFO lot fully or partially consumed by a sell, with the realized gain already computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedLot {
    pub shares: i64,
    pub cost_basis_per_share: Money,
    pub proceeds_per_share: Money,
    pub acquired_at: Instant,
    pub is_long_term: bool,
}

impl ClosedLot {
    pub fn realized_gain(&self) -> Money {
        (self.proceeds_per_share - self.cost_basis_per_share).scale(self.shares as f64)
    }
}

const LONG_TERM_HOLDING_DAYS: i64 = 365;

/// Consumes `qty` shares FIFO from `lots` (oldest `acquired_at` first), removing or shrinking lots
/// in place, and returns the closed-lot breakdown for tax computation. Panics if `qty` exceeds the
/// sum of all lots — callers must have already checked sufficient shares (§4.8 step 3).
pub fn close_fifo(lots: &mut Vec<PurchaseLot>, qty: i64, sold_at: Instant, proceeds_per_share: Money) -> Vec<ClosedLot> {
    lots.sort_by_key(|l| l.acquired_at);
    let mut remaining = qty;
    let mut closed = Vec::new();
    let mut i = 0;
    while remaining > 0 {
        assert!(i < lots.len(), "insufficient lots to cover sale quantity");
        let lot = &mut lots[i];
        let take = lot.shares.min(remaining);
        let is_long_term = (sold_at - lot.acquired_at).num_days() >= LONG_TERM_HOLDING_DAYS;
        closed.push(ClosedLot {
            shares: take,
            cost_basis_per_share: lot.cost_basis_per_share,
            proceeds_per_share,
            acquired_at: lot.acquired_at,
            is_long_term,
        });
        lot.shares -= take;
        remaining -= take;
        if lot.shares == 0 {
            lots.remove(i);
        } else {
            i += 1;
        }
    }
    closed
}

/// Applies a split ratio to every lot of `symbol`: shares multiply by `ratio`, cost basis per
/// share divides by it, so the total basis is preserved (§4.6 `split(k)` effect).
pub fn apply_split(lots: &mut [PurchaseLot], symbol: &Symbol, ratio: f64) {
    for lot in lots.iter_mut().filter(|l| &l.symbol == symbol) {
        lot.shares = (lot.shares as f64 * ratio).round() as i64;
        lot.cost_basis_per_share = lot.cost_basis_per_share.scale(1.0 / ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant;

    #[test]
    fn fifo_consumes_oldest_lot_first() {
        let mut lots = vec![
            PurchaseLot {
                symbol: Symbol::new("IBM"),
                shares: 10,
                cost_basis_per_share: Money::cents(1000),
                acquired_at: instant(2000, 1, 1, 0, 0, 0),
            },
            PurchaseLot {
                symbol: Symbol::new("IBM"),
                shares: 10,
                cost_basis_per_share: Money::cents(2000),
                acquired_at: instant(2001, 1, 1, 0, 0, 0),
            },
        ];
        let closed = close_fifo(&mut lots, 15, instant(2002, 1, 1, 0, 0, 0), Money::cents(3000));
        assert_eq!(closed[0].shares, 10);
        assert_eq!(closed[0].cost_basis_per_share, Money::cents(1000));
        assert_eq!(closed[1].shares, 5);
        assert_eq!(closed[1].cost_basis_per_share, Money::cents(2000));
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].shares, 5);
    }

    #[test]
    fn long_term_threshold_is_one_year() {
        let mut lots = vec![PurchaseLot {
            symbol: Symbol::new("IBM"),
            shares: 10,
            cost_basis_per_share: Money::cents(1000),
            acquired_at: instant(2000, 1, 1, 0, 0, 0),
        }];
        let closed = close_fifo(&mut lots, 10, instant(2001, 1, 2, 0, 0, 0), Money::cents(1500));
        assert!(closed[0].is_long_term);
    }

    #[test]
    fn split_scales_shares_and_divides_basis() {
        let mut lots = vec![PurchaseLot {
            symbol: Symbol::new("AAPL"),
            shares: 10,
            cost_basis_per_share: Money::cents(10_000),
            acquired_at: instant(2010, 1, 1, 0, 0, 0),
        }];
        apply_split(&mut lots, &Symbol::new("AAPL"), 7.0);
        assert_eq!(lots[0].shares, 70);
        assert_eq!(lots[0].cost_basis_per_share, Money::cents(10_000 / 7));
    }
}
