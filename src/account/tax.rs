//! Tax computation (§6 "Tax rules"): short-term and long-term capital gains, dividend withholding,
//! and bond interest taxation (exempt for municipal bonds, taxable otherwise).

use crate::account::lots::ClosedLot;
use crate::money::Money;
use crate::reference::bonds::BondKind;

pub const SHORT_TERM_CAPITAL_GAINS_RATE: f64 = 0.25;
pub const LONG_TERM_CAPITAL_GAINS_RATE: f64 = 0.15;
pub const DIVIDEND_WITHHOLDING_RATE: f64 = 0.15;
pub const BOND_INTEREST_RATE: f64 = 0.25;

/// Tax owed on a single closed lot's realized gain. Losses owe nothing (no loss-harvesting
/// carryforward is modelled).
pub fn tax_on_closed_lot(lot: &ClosedLot) -> Money {
    let gain = lot.realized_gain();
    if gain.as_cents() <= 0 {
        return Money::ZERO;
    }
    let rate = if lot.is_long_term {
        LONG_TERM_CAPITAL_GAINS_RATE
    } else {
        SHORT_TERM_CAPITAL_GAINS_RATE
    };
    gain.scale(rate)
}

pub fn tax_on_closed_lots(lots: &[ClosedLot]) -> Money {
    lots.iter().map(tax_on_closed_lot).sum()
}

/// Dividends are withheld at a flat rate before deposit (§6).
pub fn withhold_dividend(gross: Money) -> (Money, Money) {
    let tax = gross.scale(DIVIDEND_WITHHOLDING_RATE);
    (gross - tax, tax)
}

/// Bond coupon interest is taxable unless the bond is municipal and flagged tax-exempt.
pub fn tax_on_bond_interest(gross: Money, kind: BondKind, tax_exempt: bool) -> (Money, Money) {
    if kind == BondKind::Municipal && tax_exempt {
        return (gross, Money::ZERO);
    }
    let tax = gross.scale(BOND_INTEREST_RATE);
    (gross - tax, tax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant;

    fn lot(gain_cents: i64, is_long_term: bool) -> ClosedLot {
        ClosedLot {
            shares: 1,
            cost_basis_per_share: Money::cents(0),
            proceeds_per_share: Money::cents(gain_cents),
            acquired_at: instant(2000, 1, 1, 0, 0, 0),
            is_long_term,
        }
    }

    #[test]
    fn short_term_gain_taxed_at_higher_rate() {
        let tax = tax_on_closed_lot(&lot(10_000, false));
        assert_eq!(tax, Money::cents(2_500));
    }

    #[test]
    fn long_term_gain_taxed_at_lower_rate() {
        let tax = tax_on_closed_lot(&lot(10_000, true));
        assert_eq!(tax, Money::cents(1_500));
    }

    #[test]
    fn losses_owe_no_tax() {
        let loss = ClosedLot {
            shares: 1,
            cost_basis_per_share: Money::cents(10_000),
            proceeds_per_share: Money::cents(5_000),
            acquired_at: instant(2000, 1, 1, 0, 0, 0),
            is_long_term: false,
        };
        assert_eq!(tax_on_closed_lot(&loss), Money::ZERO);
    }

    #[test]
    fn dividend_withholding_is_flat_fifteen_percent() {
        let (net, tax) = withhold_dividend(Money::cents(10_000));
        assert_eq!(tax, Money::cents(1_500));
        assert_eq!(net, Money::cents(8_500));
    }

    #[test]
    fn municipal_tax_exempt_bond_interest_is_untaxed() {
        let (net, tax) = tax_on_bond_interest(Money::cents(10_000), BondKind::Municipal, true);
        assert_eq!(tax, Money::ZERO);
        assert_eq!(net, Money::cents(10_000));
    }

    #[test]
    fn corporate_bond_interest_is_taxed() {
        let (net, tax) = tax_on_bond_interest(Money::cents(10_000), BondKind::Corporate, false);
        assert_eq!(tax, Money::cents(2_500));
        assert_eq!(net, Money::cents(7_500));
    }
}
