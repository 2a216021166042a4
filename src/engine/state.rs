//! `EngineState`: the single mutable record of simulated progress outside the account itself
//! (§3). Everything here is persisted on every mutation batch and restored verbatim on restart.

use crate::time::{Instant, SpeedMultiplier};
use crate::views::news::DynamicNewsGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-symbol "last processed" boundary for a cash-event category, so a re-run of the same tick
/// never double-applies a dividend, coupon, or fee (§4.7).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CashEventCursors {
    pub last_dividend_quarter: HashMap<String, Instant>,
    pub last_coupon_period: HashMap<String, Instant>,
    pub last_monthly_fee_instant: Option<Instant>,
    pub last_buyback_instant: Option<Instant>,
    pub last_issuance_instant: Option<Instant>,
    pub last_loan_interest_instant: Option<Instant>,
    pub last_margin_interest_instant: Option<Instant>,
    pub last_retention_run: Option<Instant>,
}

/// Running state the Market-Average Controls evolve day by day and persist (§4.4).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlsState {
    pub market_pe: f64,
    pub recent_volatility_ewma: f64,
    /// Most recent trading-day returns, oldest first, capped at 5 — enough to evaluate the
    /// weekly soft circuit breaker without re-deriving it from the price history on every call.
    pub trailing_returns: Vec<f64>,
}

impl Default for ControlsState {
    fn default() -> Self {
        Self { market_pe: 18.0, recent_volatility_ewma: 0.16, trailing_returns: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineState {
    pub current_instant: Instant,
    pub speed_multiplier: SpeedMultiplier,
    pub paused: bool,
    pub cursors: CashEventCursors,
    pub controls: ControlsState,
    pub cumulative_inflation: f64,
    /// Ids of corporate events already applied or skipped, so a replayed tick never reapplies
    /// one (§4.6 at-most-once invariant).
    pub processed_corporate_events: Vec<String>,
    /// Dynamic-news cooldown bookkeeping, persisted so a restart doesn't immediately re-trigger a
    /// move that already fired a headline before the last save.
    pub news_cooldowns: DynamicNewsGenerator,
}

impl EngineState {
    pub fn new(start: Instant) -> Self {
        Self {
            current_instant: start,
            speed_multiplier: SpeedMultiplier::X3600,
            paused: false,
            cursors: CashEventCursors::default(),
            controls: ControlsState::default(),
            cumulative_inflation: 1.0,
            processed_corporate_events: Vec::new(),
            news_cooldowns: DynamicNewsGenerator::new(),
        }
    }

    pub fn has_processed(&self, event_id: &str) -> bool {
        self.processed_corporate_events.iter().any(|id| id == event_id)
    }

    pub fn mark_processed(&mut self, event_id: &str) {
        self.processed_corporate_events.push(event_id.to_string());
    }
}
