//! Prevailing yield curve: a simple function of simulated year and credit rating (§3 Bond data
//! model), used to mark outstanding bonds to market between issue and maturity.

use crate::price::economic::EconomicIndicators;
use crate::reference::bonds::CreditRating;
use chrono::Datelike;

/// Credit spread added to the base risk-free rate, in annualized terms.
fn credit_spread(rating: CreditRating) -> f64 {
    match rating {
        CreditRating::Aaa => 0.002,
        CreditRating::Aa => 0.005,
        CreditRating::A => 0.009,
        CreditRating::Bbb => 0.015,
        CreditRating::Bb => 0.035,
        CreditRating::B => 0.06,
    }
}

/// Prevailing annualized yield for a bond of `rating` at `t`: the fed-funds rate (as a risk-free
/// proxy) plus an inflation premium and the rating's credit spread.
pub fn prevailing_yield(t: chrono::DateTime<chrono::Utc>, rating: CreditRating) -> f64 {
    let ind = EconomicIndicators::for_year(t.year());
    (ind.fed_funds_rate + ind.inflation * 0.4 + credit_spread(rating)).max(0.001)
}

/// Present value of a bond's remaining coupons plus face value, discounted at the prevailing
/// yield, standard fixed-income present-value math.
pub fn present_value(
    face_value_cents: i64,
    coupon_rate: f64,
    coupon_frequency_per_year: u32,
    periods_remaining: u32,
    yield_annual: f64,
) -> f64 {
    if periods_remaining == 0 {
        return face_value_cents as f64;
    }
    let coupon = face_value_cents as f64 * coupon_rate / coupon_frequency_per_year as f64;
    let period_yield = yield_annual / coupon_frequency_per_year as f64;
    let mut pv = 0.0;
    for period in 1..=periods_remaining {
        let discount = (1.0 + period_yield).powi(period as i32);
        pv += coupon / discount;
    }
    pv += face_value_cents as f64 / (1.0 + period_yield).powi(periods_remaining as i32);
    pv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_value_at_par_when_yield_equals_coupon() {
        let pv = present_value(100_000, 0.05, 2, 20, 0.05);
        assert!((pv - 100_000.0).abs() < 50.0);
    }

    #[test]
    fn present_value_below_par_when_yield_exceeds_coupon() {
        let pv = present_value(100_000, 0.03, 2, 20, 0.06);
        assert!(pv < 100_000.0);
    }

    #[test]
    fn zero_periods_returns_face_value() {
        assert_eq!(present_value(100_000, 0.05, 2, 0, 0.03), 100_000.0);
    }
}
