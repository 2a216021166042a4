//! Margin rules: buying power against uninvested cash plus a fraction of long-position value,
//! short-sale collateral, and the concentration limit that caps any single symbol's share of the
//! portfolio (§4.8 step 4, §6 margin rules, §7 `InsufficientMargin`/`ConcentrationLimitExceeded`).

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Fraction of long-position market value the account may additionally borrow against.
pub const MARGIN_FACTOR: f64 = 0.5;

/// Collateral the account must set aside per dollar of short-sale proceeds.
pub const SHORT_COLLATERAL_FACTOR: f64 = 1.5;

/// No single symbol's position may exceed this fraction of total portfolio value.
pub const CONCENTRATION_LIMIT: f64 = 0.40;

/// Maximum ratio of (cash + long value + short liability) to account net equity before new
/// leveraged trades are refused.
pub const MAX_LEVERAGE_RATIO: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct MarginState {
    pub short_collateral_held: Money,
    pub margin_drawn: Money,
}

impl MarginState {
    /// Buying power available for a new purchase: uninvested cash plus half the value of the
    /// account's long holdings, less margin already drawn.
    pub fn buying_power(&self, cash: Money, long_position_value: Money) -> Money {
        let base = cash + long_position_value.scale(MARGIN_FACTOR);
        (base - self.margin_drawn).max(Money::ZERO)
    }

    pub fn collateral_required_for_short(proceeds: Money) -> Money {
        proceeds.scale(SHORT_COLLATERAL_FACTOR)
    }

    /// True if, after adding `incremental_value` to `symbol`'s position, no single symbol would
    /// exceed [`CONCENTRATION_LIMIT`] of total portfolio value.
    pub fn within_concentration_limit(
        existing_symbol_value: Money,
        incremental_value: Money,
        total_portfolio_value: Money,
    ) -> bool {
        if total_portfolio_value.as_cents() <= 0 {
            return true;
        }
        let projected_symbol = existing_symbol_value + incremental_value;
        let projected_total = total_portfolio_value + incremental_value;
        projected_symbol.as_cents() as f64 <= projected_total.as_cents() as f64 * CONCENTRATION_LIMIT
    }

    /// True if drawing `incremental_exposure` would keep total exposure within [`MAX_LEVERAGE_RATIO`]
    /// times net equity.
    pub fn within_leverage_limit(total_exposure: Money, incremental_exposure: Money, net_equity: Money) -> bool {
        if net_equity.as_cents() <= 0 {
            return incremental_exposure.as_cents() <= 0;
        }
        let projected = total_exposure + incremental_exposure;
        projected.as_cents() as f64 <= net_equity.as_cents() as f64 * MAX_LEVERAGE_RATIO
    }
}
