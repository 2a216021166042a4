//! Every tunable the engine reads at startup, with defaults baked in. Uses a plain
//! builder-struct-plus-literal-defaults style rather than pulling in a config-file crate: callers
//! can override individual fields or replace the whole struct by deserializing a JSON file with
//! `serde_json`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub global_seed: u64,

    pub mean_reversion_theta: f64,
    pub mean_reversion_mu_annual: f64,
    pub daily_circuit_breaker: f64,
    pub weekly_circuit_breaker: f64,

    pub buyback_sentiment_threshold: f64,
    pub buyback_probability_slope: f64,
    pub issuance_probability_negative_sentiment: f64,
    pub issuance_probability_positive_sentiment: f64,
    pub float_floor_fraction: f64,

    pub short_term_capital_gains_rate: f64,
    pub long_term_capital_gains_rate: f64,
    pub dividend_withholding_rate: f64,
    pub bond_interest_tax_rate: f64,

    pub trade_fee_bps: u32,
    pub limit_order_expiry_days: i64,

    pub loan_cure_window_days_default: i64,

    pub retention_schedule_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_seed: 0x5A17_0BED_BADC_0FFE,
            mean_reversion_theta: crate::controls::REVERSION_THETA,
            mean_reversion_mu_annual: crate::controls::REVERSION_MU_ANNUAL,
            daily_circuit_breaker: 0.10,
            weekly_circuit_breaker: 0.20,
            buyback_sentiment_threshold: 0.3,
            buyback_probability_slope: 0.15,
            issuance_probability_negative_sentiment: 0.05,
            issuance_probability_positive_sentiment: 0.02,
            float_floor_fraction: 0.10,
            short_term_capital_gains_rate: crate::account::tax::SHORT_TERM_CAPITAL_GAINS_RATE,
            long_term_capital_gains_rate: crate::account::tax::LONG_TERM_CAPITAL_GAINS_RATE,
            dividend_withholding_rate: crate::account::tax::DIVIDEND_WITHHOLDING_RATE,
            bond_interest_tax_rate: crate::account::tax::BOND_INTEREST_RATE,
            trade_fee_bps: 10,
            limit_order_expiry_days: 30,
            loan_cure_window_days_default: 7,
            retention_schedule_days: 30,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON override file, falling back field-by-field to defaults for anything the
    /// file omits (`#[serde(default)]` on every field above).
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn trade_fee_rate(&self) -> f64 {
        self.trade_fee_bps as f64 / 10_000.0
    }
}
