//! Market-Average Controls (§4.4): the four post-anchor stabilizers applied, in order, to every
//! proposed daily return once a symbol's price path runs past its last curated anchor. Historical
//! (anchor-bracketed) periods never pass through here.

use crate::engine::state::ControlsState;

pub const REVERSION_THETA: f64 = 0.15;
pub const REVERSION_MU_ANNUAL: f64 = 0.07;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const VOL_EWMA_LAMBDA: f64 = 0.94;
const TRAILING_WINDOW: usize = 5;

/// Mean reversion: pulls the proposed return toward the long-run daily drift implied by a 7%
/// annualized mean, at rate `theta`. Half-life ≈ 4.6 years by construction (`theta` + `252`
/// trading days/year already bakes this in; nothing else needs to change `theta` to hit it).
fn mean_reversion(r: f64) -> f64 {
    let mu_daily = REVERSION_MU_ANNUAL / TRADING_DAYS_PER_YEAR;
    r - REVERSION_THETA * (r - mu_daily)
}

/// Piecewise-linear dampening factor from the running market P/E, applied only to positive
/// returns: identity below 16, 0.7x at 20, 0.4x at 30, 0.2x at or above 40.
fn valuation_dampening_factor(market_pe: f64) -> f64 {
    const POINTS: [(f64, f64); 4] = [(16.0, 1.0), (20.0, 0.7), (30.0, 0.4), (40.0, 0.2)];
    if market_pe <= POINTS[0].0 {
        return POINTS[0].1;
    }
    if market_pe >= POINTS[POINTS.len() - 1].0 {
        return POINTS[POINTS.len() - 1].1;
    }
    for window in POINTS.windows(2) {
        let (pe_lo, f_lo) = window[0];
        let (pe_hi, f_hi) = window[1];
        if market_pe >= pe_lo && market_pe <= pe_hi {
            let t = (market_pe - pe_lo) / (pe_hi - pe_lo);
            return f_lo + t * (f_hi - f_lo);
        }
    }
    POINTS[POINTS.len() - 1].1
}

fn valuation_dampening(r: f64, market_pe: f64) -> f64 {
    if r <= 0.0 {
        return r;
    }
    r * valuation_dampening_factor(market_pe)
}

/// Regime cap on `|r|` driven by the EWMA realized-volatility estimate (annualized).
fn volatility_cap(vol_ewma: f64) -> f64 {
    if vol_ewma < 0.15 {
        0.40
    } else if vol_ewma < 0.30 {
        0.25
    } else if vol_ewma < 0.50 {
        0.20
    } else {
        0.15
    }
}

fn apply_volatility_cap(r: f64, vol_ewma: f64) -> f64 {
    let cap = volatility_cap(vol_ewma);
    r.clamp(-cap, cap)
}

/// Soft circuit breaker: returns beyond `threshold` are compressed rather than clipped, so the
/// sign and a fraction of the excess survive.
fn soft_breaker(r: f64, threshold: f64) -> f64 {
    if r.abs() <= threshold {
        return r;
    }
    r.signum() * (threshold + 0.5 * (r.abs() - threshold))
}

/// Applies all four mechanisms in spec order to a single proposed daily return, updating and
/// returning the new [`ControlsState`] in the process (§4.4). `earnings_growth` is the assumed
/// annual earnings growth rate driving the running market P/E.
pub fn apply_daily(state: &mut ControlsState, proposed_return: f64, earnings_growth: f64) -> f64 {
    let mut r = mean_reversion(proposed_return);
    r = valuation_dampening(r, state.market_pe);
    r = apply_volatility_cap(r, state.recent_volatility_ewma);
    r = soft_breaker(r, 0.10);

    state.trailing_returns.push(r);
    if state.trailing_returns.len() > TRAILING_WINDOW {
        state.trailing_returns.remove(0);
    }
    let weekly_return: f64 = state
        .trailing_returns
        .iter()
        .map(|x| 1.0 + x)
        .product::<f64>()
        - 1.0;
    if weekly_return.abs() > 0.20 {
        let scale = soft_breaker(weekly_return, 0.20) / weekly_return;
        r *= scale;
    }

    state.recent_volatility_ewma =
        (VOL_EWMA_LAMBDA * state.recent_volatility_ewma.powi(2)
            + (1.0 - VOL_EWMA_LAMBDA) * r.powi(2) * TRADING_DAYS_PER_YEAR)
            .sqrt();

    let daily_growth = earnings_growth / TRADING_DAYS_PER_YEAR;
    state.market_pe *= (1.0 + r) / (1.0 + daily_growth);
    state.market_pe = state.market_pe.clamp(5.0, 80.0);

    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_reversion_pulls_extreme_returns_toward_mean() {
        let reverted = mean_reversion(0.5);
        assert!(reverted < 0.5);
    }

    #[test]
    fn valuation_dampening_is_identity_below_16_pe() {
        let r = valuation_dampening(0.05, 14.0);
        assert!((r - 0.05).abs() < 1e-9);
    }

    #[test]
    fn valuation_dampening_leaves_negative_returns_untouched() {
        let r = valuation_dampening(-0.05, 45.0);
        assert!((r + 0.05).abs() < 1e-9);
    }

    #[test]
    fn volatility_cap_tightens_in_high_vol_regime() {
        assert_eq!(volatility_cap(0.10), 0.40);
        assert_eq!(volatility_cap(0.60), 0.15);
    }

    #[test]
    fn soft_breaker_compresses_but_preserves_sign() {
        let compressed = soft_breaker(0.30, 0.10);
        assert!(compressed > 0.10 && compressed < 0.30);
        let compressed_neg = soft_breaker(-0.30, 0.10);
        assert!(compressed_neg < -0.10 && compressed_neg > -0.30);
    }

    #[test]
    fn apply_daily_never_exceeds_hard_invariant() {
        let mut state = ControlsState::default();
        for day in 0..500 {
            let proposed = if day == 250 { 2.0 } else { 0.01 };
            let r = apply_daily(&mut state, proposed, 0.06);
            assert!(r.abs() <= 0.50, "daily return exceeded hard 50% cap: {r}");
        }
    }
}
