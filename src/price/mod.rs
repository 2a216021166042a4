//! The Price Engine (§4.3): deterministic `(symbol, instant) -> price` resolution. Historical
//! segments log-linearly interpolate between curated anchors with an enveloped noise/crash/era
//! overlay that vanishes exactly at each anchor; post-anchor segments compound a day-by-day
//! forward simulation through the Market-Average Controls.

pub mod economic;
pub mod sector_bias;
pub mod yield_curve;

use crate::controls;
use crate::engine::state::ControlsState;
use crate::reference::companies::Company;
use crate::reference::corporate_events::CorporateEventKind;
use crate::reference::crashes::CrashScenario;
use crate::reference::indices::IndexFund;
use crate::reference::{AssetClass, ReferenceData, Sector};
use crate::rng::{keyed_normal, Purpose};
use crate::time::{Instant, Symbol};
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const DAILY_VOL: f64 = 0.018;
const MARKET_OPEN_HOUR: u32 = 14;
const MARKET_OPEN_MINUTE: u32 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("symbol {0} is not in the reference catalog")]
    UnknownSymbol(Symbol),
    #[error("price unavailable for {0}: not listed at the queried instant")]
    Unavailable(Symbol),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub price: f64,
    pub change_pct_vs_prior_day: f64,
}

fn day_index(t: Instant) -> i64 {
    t.date_naive().num_days_from_ce() as i64
}

fn instant_for_day(day_index: i64) -> Instant {
    let date = NaiveDate::from_num_days_from_ce_opt(day_index as i32)
        .expect("day index within chrono's representable range");
    Utc.from_utc_datetime(&date.and_hms_opt(MARKET_OPEN_HOUR, MARKET_OPEN_MINUTE, 0).unwrap())
}

/// Parabolic envelope, zero at both bracket edges and maximal at the midpoint: lets overlays
/// (noise, era bias, crash) perturb the interior of an anchor bracket without ever displacing the
/// curated endpoint prices themselves.
fn bridge_envelope(t_frac: f64) -> f64 {
    4.0 * t_frac * (1.0 - t_frac)
}

#[derive(Debug, Clone)]
struct PostAnchorCheckpoint {
    day_index: i64,
    log_price: f64,
    controls: ControlsState,
}

pub struct PriceEngine {
    reference: Arc<ReferenceData>,
    global_seed: u64,
    post_anchor: Mutex<HashMap<Symbol, PostAnchorCheckpoint>>,
    /// Manually triggered crash overlays (`/api/crash/trigger`), layered additively on top of the
    /// scheduled catalog per the same tie-break rule as two overlapping scheduled scenarios.
    manual_crashes: Mutex<Vec<CrashScenario>>,
}

impl PriceEngine {
    pub fn new(reference: Arc<ReferenceData>, global_seed: u64) -> Self {
        Self {
            reference,
            global_seed,
            post_anchor: Mutex::new(HashMap::new()),
            manual_crashes: Mutex::new(Vec::new()),
        }
    }

    /// Activates `scenario_id`'s cataloged scenario starting at `at` instead of its cataloged
    /// start, shifting its `end` (if any) by the same offset. Replaces any prior manual trigger
    /// of the same id. Returns `false` if the id isn't in the catalog.
    pub fn trigger_crash(&self, scenario_id: &str, at: Instant) -> bool {
        let Some(template) = self.reference.crashes.get(scenario_id) else {
            return false;
        };
        let offset = at - template.start;
        let mut scenario = template.clone();
        scenario.start = at;
        scenario.end = scenario.end.map(|e| e + offset);

        let mut manual = self.manual_crashes.lock();
        manual.retain(|c| c.id != scenario_id);
        manual.push(scenario);
        true
    }

    /// Removes a manually triggered scenario, if one is active. Returns `false` if none was
    /// active under that id. The scheduled catalog entry (if any) is unaffected.
    pub fn deactivate_crash(&self, scenario_id: &str) -> bool {
        let mut manual = self.manual_crashes.lock();
        let before = manual.len();
        manual.retain(|c| c.id != scenario_id);
        manual.len() != before
    }

    pub fn active_manual_crash_ids(&self) -> Vec<&'static str> {
        self.manual_crashes.lock().iter().map(|c| c.id).collect()
    }

    /// Scheduled catalog impact plus any manually triggered overlay, composed additively (§4.3.4).
    fn crash_impact(&self, t: Instant, sector: Sector) -> f64 {
        let scheduled = self.reference.crashes.active_at(t, sector);
        let manual: f64 = self.manual_crashes.lock().iter().map(|c| c.effective_impact(t, sector)).sum();
        scheduled + manual
    }

    pub fn price(&self, symbol: &Symbol, t: Instant) -> Result<PriceSample, PriceError> {
        let meta = self
            .reference
            .security(symbol)
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.clone()))?;

        match meta.asset_class {
            AssetClass::Stock => self.price_stock(symbol, t),
            AssetClass::Index => self.price_index(symbol, t),
            AssetClass::Bond => self.price_bond(symbol, t),
        }
    }

    fn corporate_event_override(&self, symbol: &Symbol, t: Instant) -> Option<f64> {
        self.reference
            .corporate_events
            .all()
            .iter()
            .filter(|e| &e.symbol == symbol && t >= e.effective_instant)
            .find_map(|e| match &e.kind {
                CorporateEventKind::AcquisitionCash { price_per_share, .. } => Some(*price_per_share),
                CorporateEventKind::GoingPrivate { price_per_share } => Some(*price_per_share),
                CorporateEventKind::Bankruptcy => Some(0.01),
                _ => None,
            })
    }

    fn price_stock(&self, symbol: &Symbol, t: Instant) -> Result<PriceSample, PriceError> {
        let company = self
            .reference
            .companies
            .get(symbol)
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.clone()))?;

        if !company.meta.is_listed_at(t) {
            return Err(PriceError::Unavailable(symbol.clone()));
        }

        let price = self.raw_stock_price(company, t).max(0.01);
        let prior_day = t - chrono::Duration::days(1);
        let change_pct_vs_prior_day = if company.meta.is_listed_at(prior_day) {
            let prior = self.raw_stock_price(company, prior_day).max(0.01);
            (price - prior) / prior
        } else {
            0.0
        };

        Ok(PriceSample { price, change_pct_vs_prior_day })
    }

    /// Resolves the unfloor-ed price for a stock at `t`, dispatching to the anchor-bracket,
    /// pre-history, or post-anchor path (§4.3 rules 2-4), honoring any corporate-event override.
    fn raw_stock_price(&self, company: &Company, t: Instant) -> f64 {
        if let Some(fixed) = self.corporate_event_override(&company.meta.symbol, t) {
            return fixed;
        }

        let anchors = &company.anchors;
        let first = anchors.first().expect("every company has at least one anchor");
        let last = anchors.last().expect("every company has at least one anchor");

        if t < first.at {
            return first.price;
        }
        if t >= last.at {
            return self.post_anchor_price(company, t);
        }

        // Anchor exactly at a boundary belongs to the later segment (§4.3.4).
        let idx = anchors
            .iter()
            .rposition(|a| a.at <= t)
            .unwrap_or(0)
            .min(anchors.len() - 2);
        let (a0, a1) = (&anchors[idx], &anchors[idx + 1]);
        self.interpolate_bracket(company, a0.at, a0.price, a1.at, a1.price, t)
    }

    fn interpolate_bracket(
        &self,
        company: &Company,
        t0: Instant,
        p0: f64,
        t1: Instant,
        p1: f64,
        t: Instant,
    ) -> f64 {
        let span = (t1 - t0).num_milliseconds().max(1) as f64;
        let elapsed = (t - t0).num_milliseconds() as f64;
        let t_frac = (elapsed / span).clamp(0.0, 1.0);

        let base_log = p0.ln() + t_frac * (p1.ln() - p0.ln());

        let day = day_index(t);
        let envelope = bridge_envelope(t_frac);
        let noise = keyed_normal(self.global_seed, company.meta.symbol.as_str(), day, Purpose::DailyNoise)
            * DAILY_VOL;
        let crash = self.crash_impact(t, company.meta.sector);
        let is_crash_day = crash.abs() > f64::EPSILON;
        let clamp = if is_crash_day { 0.40 } else { 0.25 };
        let overlay = (noise + crash).clamp(-clamp, clamp) * envelope;

        let era = sector_bias::era_bias(company.meta.sector, t.year()) / 252.0 * envelope;

        (base_log + overlay + era).exp()
    }

    /// Day-by-day compounded forward simulation past the last curated anchor, through the
    /// Market-Average Controls (§4.3.2, §4.4). Memoized per symbol so repeat queries for nearby
    /// instants don't replay the whole post-anchor history; the memo is purely a cache over a
    /// function that is itself deterministic in `(symbol, day_index)`; it never needs external
    /// synchronization with engine mutation order.
    fn post_anchor_price(&self, company: &Company, t: Instant) -> f64 {
        let target_day = day_index(t);
        let mut checkpoints = self.post_anchor.lock();
        let checkpoint = checkpoints.entry(company.meta.symbol.clone()).or_insert_with(|| {
            let last = company.anchors.last().expect("company has an anchor");
            PostAnchorCheckpoint {
                day_index: day_index(last.at),
                log_price: last.price.ln(),
                controls: ControlsState::default(),
            }
        });

        if target_day < checkpoint.day_index {
            let last = company.anchors.last().expect("company has an anchor");
            *checkpoint = PostAnchorCheckpoint {
                day_index: day_index(last.at),
                log_price: last.price.ln(),
                controls: ControlsState::default(),
            };
        }

        while checkpoint.day_index < target_day {
            checkpoint.day_index += 1;
            let t_day = instant_for_day(checkpoint.day_index);
            let annual_rate =
                economic::annual_growth_rate(self.global_seed, t_day, company.meta.sector);
            let daily_rate = annual_rate / 252.0;
            let noise = keyed_normal(
                self.global_seed,
                company.meta.symbol.as_str(),
                checkpoint.day_index,
                Purpose::DailyNoise,
            ) * DAILY_VOL;
            let crash = self.crash_impact(t_day, company.meta.sector);
            let proposed = (daily_rate + noise + crash).clamp(-0.40, 0.40);
            let adjusted = controls::apply_daily(&mut checkpoint.controls, proposed, annual_rate.max(0.0));
            let adjusted = adjusted.clamp(-0.50, 0.50);
            checkpoint.log_price += (1.0 + adjusted).ln();
        }

        checkpoint.log_price.exp()
    }

    fn price_index(&self, symbol: &Symbol, t: Instant) -> Result<PriceSample, PriceError> {
        let fund = self
            .reference
            .indices
            .get(symbol)
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.clone()))?;

        if t < fund.inception {
            return Err(PriceError::Unavailable(symbol.clone()));
        }

        let price = self.raw_index_price(fund, t)?;
        let prior_day = t - chrono::Duration::days(1);
        let change_pct_vs_prior_day = if prior_day >= fund.inception {
            match self.raw_index_price(fund, prior_day) {
                Ok(prior) if prior > 0.0 => (price - prior) / prior,
                _ => 0.0,
            }
        } else {
            0.0
        };

        Ok(PriceSample { price, change_pct_vs_prior_day })
    }

    /// An index's price is its constituents' prices combined per its weighting scheme and scaled
    /// by a fixed per-fund divisor so the level starts at 100 at inception (§3 IndexFund).
    fn raw_index_price(&self, fund: &IndexFund, t: Instant) -> Result<f64, PriceError> {
        let mut samples = Vec::with_capacity(fund.constituents.len());
        for constituent in &fund.constituents {
            if let Ok(sample) = self.price(constituent, t) {
                samples.push(sample.price);
            }
        }
        if samples.is_empty() {
            return Err(PriceError::Unavailable(fund.meta.symbol.clone()));
        }

        let aggregate = match fund.weighting {
            crate::reference::indices::Weighting::EqualWeight
            | crate::reference::indices::Weighting::MarketCap => {
                samples.iter().sum::<f64>() / samples.len() as f64
            }
            crate::reference::indices::Weighting::PriceWeighted => samples.iter().sum::<f64>(),
        };

        let inception_divisor = self.index_inception_divisor(fund);
        Ok((aggregate / inception_divisor) * 100.0)
    }

    fn index_inception_divisor(&self, fund: &IndexFund) -> f64 {
        let mut samples = Vec::with_capacity(fund.constituents.len());
        for constituent in &fund.constituents {
            if let Ok(sample) = self.price(constituent, fund.inception) {
                samples.push(sample.price);
            }
        }
        if samples.is_empty() {
            return 1.0;
        }
        match fund.weighting {
            crate::reference::indices::Weighting::EqualWeight
            | crate::reference::indices::Weighting::MarketCap => {
                samples.iter().sum::<f64>() / samples.len() as f64
            }
            crate::reference::indices::Weighting::PriceWeighted => samples.iter().sum::<f64>(),
        }
    }

    fn price_bond(&self, symbol: &Symbol, t: Instant) -> Result<PriceSample, PriceError> {
        let bond = self
            .reference
            .bonds
            .get(symbol)
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.clone()))?;

        if t < bond.issue || t >= bond.maturity {
            return Err(PriceError::Unavailable(symbol.clone()));
        }

        let price = self.raw_bond_price(bond, t);
        let prior_day = t - chrono::Duration::days(1);
        let change_pct_vs_prior_day = if prior_day >= bond.issue {
            let prior = self.raw_bond_price(bond, prior_day);
            if prior > 0.0 { (price - prior) / prior } else { 0.0 }
        } else {
            0.0
        };

        Ok(PriceSample { price, change_pct_vs_prior_day })
    }

    fn raw_bond_price(&self, bond: &crate::reference::bonds::Bond, t: Instant) -> f64 {
        let periods_remaining = {
            let remaining_days = (bond.maturity - t).num_days().max(0) as f64;
            let period_days = 365.0 / bond.coupon_frequency_per_year as f64;
            (remaining_days / period_days).ceil() as u32
        };
        let yield_annual = yield_curve::prevailing_yield(t, bond.rating);
        yield_curve::present_value(
            bond.face_value_cents,
            bond.coupon_rate,
            bond.coupon_frequency_per_year,
            periods_remaining,
            yield_annual,
        ) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant;

    fn engine() -> PriceEngine {
        PriceEngine::new(Arc::new(ReferenceData::load()), 42)
    }

    #[test]
    fn price_at_first_anchor_matches_anchor_exactly() {
        let engine = engine();
        let ibm = Symbol::new("IBM");
        let sample = engine.price(&ibm, instant(1970, 1, 2, 14, 30, 0)).unwrap();
        assert!((sample.price - 17.50).abs() < 0.01);
    }

    #[test]
    fn price_at_each_anchor_matches_exactly() {
        let engine = engine();
        let aapl = Symbol::new("AAPL");
        let sample = engine.price(&aapl, instant(2014, 6, 9, 14, 30, 0)).unwrap();
        assert!((sample.price - 93.70).abs() < 0.05);
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let engine = engine();
        let aapl = Symbol::new("AAPL");
        let t = instant(1999, 4, 1, 18, 0, 0);
        let a = engine.price(&aapl, t).unwrap();
        let b = engine.price(&aapl, t).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn price_before_listing_is_unavailable() {
        let engine = engine();
        let msft = Symbol::new("MSFT");
        assert_eq!(
            engine.price(&msft, instant(1980, 1, 1, 14, 30, 0)),
            Err(PriceError::Unavailable(msft))
        );
    }

    #[test]
    fn acquisition_cash_override_applies_after_effective_instant() {
        let engine = engine();
        let wfm = Symbol::new("WFM");
        let result = engine.price(&wfm, instant(2017, 6, 16, 20, 0, 0));
        assert!(result.is_err(), "WFM is fully delisted at the acquisition instant");
    }

    #[test]
    fn post_anchor_price_never_exceeds_hard_daily_clamp() {
        let engine = engine();
        let ibm = Symbol::new("IBM");
        let far_future = instant(2035, 1, 2, 14, 30, 0);
        let sample = engine.price(&ibm, far_future).unwrap();
        assert!(sample.price > 0.0);
    }

    #[test]
    fn unknown_symbol_errors() {
        let engine = engine();
        let bogus = Symbol::new("NOPE");
        assert_eq!(engine.price(&bogus, instant(2000, 1, 1, 14, 30, 0)), Err(PriceError::UnknownSymbol(bogus)));
    }

    #[test]
    fn triggering_an_unknown_scenario_is_rejected() {
        let engine = engine();
        assert!(!engine.trigger_crash("no_such_scenario", instant(2024, 1, 1, 14, 30, 0)));
    }

    #[test]
    fn manual_trigger_shows_up_as_active_and_can_be_deactivated() {
        let engine = engine();
        let at = instant(2024, 1, 1, 14, 30, 0);
        assert!(engine.trigger_crash("flash_crash_2010", at));
        assert_eq!(engine.active_manual_crash_ids(), vec!["flash_crash_2010"]);
        assert!(engine.deactivate_crash("flash_crash_2010"));
        assert!(engine.active_manual_crash_ids().is_empty());
        assert!(!engine.deactivate_crash("flash_crash_2010"));
    }
}
