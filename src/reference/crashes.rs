//! The dated library of historical crash scenarios, plus the runtime state (active/completed)
//! needed to trigger and deactivate them on demand (§3, §4.3, `/api/crash/*`).

use super::Sector;
use crate::time::{instant, Instant};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a scenario's shock decays/recurs after `start`: a residual multiplier sampled at
/// `delay_days` after the start of the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Cascade {
    pub delay_days: i64,
    pub multiplier: f64,
}

/// The shape of a scenario's return to baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RecoveryShape {
    Immediate,
    V,
    Gradual,
    Slow,
    Prolonged,
    DecadeLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Recovery {
    pub shape: RecoveryShape,
    pub duration_days: i64,
    pub daily_vol_decay: f64,
}

/// A kind-specific tag, informational: drives no behaviour beyond `impacts`/`cascades`, but lets
/// callers and logs talk about "a liquidity crisis" rather than only an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CrashKind {
    MarketCrash,
    SectorCrash,
    LiquidityCrisis,
    Bubble,
    Recession,
}

/// Market-wide and per-sector price impacts of an active scenario.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Impacts {
    pub market_return_shift: f64,
    pub sector_shifts: HashMap<Sector, f64>,
    pub volatility_multiplier: f64,
    pub liquidity_reduction: f64,
    pub sentiment_shift: f64,
}

impl Impacts {
    pub fn for_sector(&self, sector: Sector) -> f64 {
        self.market_return_shift + self.sector_shifts.get(&sector).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CrashScenario {
    pub id: &'static str,
    pub kind: CrashKind,
    pub severity: f64,
    pub start: Instant,
    pub end: Option<Instant>,
    pub impacts: Impacts,
    pub cascades: Vec<Cascade>,
    pub recovery: Recovery,
}

impl CrashScenario {
    /// Days elapsed since this scenario's start, `t` assumed `>= start` by the caller.
    fn days_since_start(&self, t: Instant) -> i64 {
        (t - self.start).num_days()
    }

    pub fn max_cascade_delay(&self) -> i64 {
        self.cascades
            .iter()
            .map(|c| c.delay_days)
            .max()
            .unwrap_or(0)
            .max(self.recovery.duration_days)
    }

    /// True while this scenario's effects can still influence a price query at `t`.
    pub fn is_active_at(&self, t: Instant) -> bool {
        t >= self.start && t <= self.start + chrono::Duration::days(self.max_cascade_delay())
    }

    /// Cascade multiplier in effect `days_since_start` days after the scenario began: the
    /// nearest cascade sample at or before that offset, `1.0` before the first sample.
    fn cascade_multiplier(&self, days_since_start: i64) -> f64 {
        self.cascades
            .iter()
            .filter(|c| c.delay_days <= days_since_start)
            .max_by_key(|c| c.delay_days)
            .map(|c| c.multiplier)
            .unwrap_or(1.0)
    }

    /// Fraction of the shock still unresolved `days_since_start` days in, per the recovery shape.
    fn recovery_residual(&self, days_since_start: i64) -> f64 {
        let d = days_since_start.max(0) as f64;
        let dur = self.recovery.duration_days.max(1) as f64;
        let progress = (d / dur).clamp(0.0, 1.0);
        match self.recovery.shape {
            RecoveryShape::Immediate => 0.0,
            RecoveryShape::V => (1.0 - progress).max(0.0),
            RecoveryShape::Gradual => (1.0 - progress).powf(1.0),
            RecoveryShape::Slow => (1.0 - progress).powf(0.5),
            RecoveryShape::Prolonged => (1.0 - progress).powf(0.3),
            RecoveryShape::DecadeLong => (1.0 - progress).powf(0.2),
        }
    }

    /// The effective daily-return impact of this scenario at `t`, composing its market/sector
    /// impact, cascade residual, and recovery residual (§3).
    pub fn effective_impact(&self, t: Instant, sector: Sector) -> f64 {
        if !self.is_active_at(t) {
            return 0.0;
        }
        let days = self.days_since_start(t);
        self.impacts.for_sector(sector) * self.cascade_multiplier(days) * self.recovery_residual(days)
    }

    /// Same composition as [`Self::effective_impact`], but over `impacts.sentiment_shift` rather
    /// than a sector return shift — feeds the buyback/issuance `market_sentiment` gate (§4.5).
    pub fn effective_sentiment(&self, t: Instant) -> f64 {
        if !self.is_active_at(t) {
            return 0.0;
        }
        let days = self.days_since_start(t);
        self.impacts.sentiment_shift * self.cascade_multiplier(days) * self.recovery_residual(days)
    }
}

#[derive(Debug)]
pub struct CrashCatalog {
    scenarios: Vec<CrashScenario>,
}

impl CrashCatalog {
    pub fn all(&self) -> &[CrashScenario] {
        &self.scenarios
    }

    pub fn get(&self, id: &str) -> Option<&CrashScenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Every scenario whose window covers `t`, composed additively per §4.3.4 tie-break rule
    /// ("if two scenarios impact the same sector on the same day, both apply additively").
    pub fn active_at(&self, t: Instant, sector: Sector) -> f64 {
        self.scenarios
            .iter()
            .map(|s| s.effective_impact(t, sector))
            .sum()
    }

    /// Aggregate sentiment shift (-1..+1, clamped) from every scenario active at `t`.
    pub fn aggregate_sentiment(&self, t: Instant) -> f64 {
        self.scenarios.iter().map(|s| s.effective_sentiment(t)).sum::<f64>().clamp(-1.0, 1.0)
    }

    pub fn seed() -> Self {
        let mut scenarios = Vec::new();

        scenarios.push(CrashScenario {
            id: "black_monday_1987",
            kind: CrashKind::MarketCrash,
            severity: 0.23,
            start: instant(1987, 10, 19, 14, 30, 0),
            end: Some(instant(1987, 12, 31, 21, 0, 0)),
            impacts: Impacts {
                market_return_shift: -0.23,
                sector_shifts: HashMap::from([(Sector::Finance, -0.05)]),
                volatility_multiplier: 3.0,
                liquidity_reduction: 0.4,
                sentiment_shift: -0.8,
            },
            cascades: vec![
                Cascade { delay_days: 0, multiplier: 1.0 },
                Cascade { delay_days: 1, multiplier: 0.4 },
                Cascade { delay_days: 5, multiplier: 0.15 },
                Cascade { delay_days: 20, multiplier: 0.05 },
            ],
            recovery: Recovery { shape: RecoveryShape::V, duration_days: 60, daily_vol_decay: 0.9 },
        });

        scenarios.push(CrashScenario {
            id: "dotcom_crash_2000",
            kind: CrashKind::Bubble,
            severity: 0.78,
            start: instant(2000, 3, 10, 14, 30, 0),
            end: Some(instant(2002, 10, 9, 20, 0, 0)),
            impacts: Impacts {
                market_return_shift: -0.004,
                sector_shifts: HashMap::from([(Sector::Technology, -0.012)]),
                volatility_multiplier: 2.2,
                liquidity_reduction: 0.2,
                sentiment_shift: -0.5,
            },
            cascades: vec![
                Cascade { delay_days: 0, multiplier: 1.0 },
                Cascade { delay_days: 120, multiplier: 0.8 },
                Cascade { delay_days: 365, multiplier: 0.6 },
                Cascade { delay_days: 900, multiplier: 0.3 },
            ],
            recovery: Recovery { shape: RecoveryShape::DecadeLong, duration_days: 365 * 10, daily_vol_decay: 0.98 },
        });

        scenarios.push(CrashScenario {
            id: "global_financial_crisis_2008",
            kind: CrashKind::Recession,
            severity: 0.57,
            start: instant(2008, 9, 15, 14, 30, 0),
            end: Some(instant(2009, 3, 9, 21, 0, 0)),
            impacts: Impacts {
                market_return_shift: -0.02,
                sector_shifts: HashMap::from([
                    (Sector::Finance, -0.05),
                    (Sector::RealEstate, -0.045),
                ]),
                volatility_multiplier: 2.6,
                liquidity_reduction: 0.5,
                sentiment_shift: -0.7,
            },
            cascades: vec![
                Cascade { delay_days: 0, multiplier: 1.0 },
                Cascade { delay_days: 14, multiplier: 0.9 },
                Cascade { delay_days: 90, multiplier: 0.7 },
                Cascade { delay_days: 180, multiplier: 0.4 },
            ],
            recovery: Recovery { shape: RecoveryShape::DecadeLong, duration_days: 365 * 10, daily_vol_decay: 0.97 },
        });

        scenarios.push(CrashScenario {
            id: "flash_crash_2010",
            kind: CrashKind::LiquidityCrisis,
            severity: 0.09,
            start: instant(2010, 5, 6, 18, 45, 0),
            end: Some(instant(2010, 5, 6, 20, 0, 0)),
            impacts: Impacts {
                market_return_shift: -0.09,
                sector_shifts: HashMap::new(),
                volatility_multiplier: 4.0,
                liquidity_reduction: 0.8,
                sentiment_shift: -0.4,
            },
            cascades: vec![
                Cascade { delay_days: 0, multiplier: 1.0 },
                Cascade { delay_days: 1, multiplier: 0.05 },
            ],
            recovery: Recovery { shape: RecoveryShape::Immediate, duration_days: 1, daily_vol_decay: 0.5 },
        });

        scenarios.push(CrashScenario {
            id: "covid_crash_2020",
            kind: CrashKind::MarketCrash,
            severity: 0.34,
            start: instant(2020, 2, 20, 14, 30, 0),
            end: Some(instant(2020, 4, 7, 20, 0, 0)),
            impacts: Impacts {
                market_return_shift: -0.034,
                sector_shifts: HashMap::from([
                    (Sector::Energy, -0.06),
                    (Sector::Healthcare, 0.01),
                ]),
                volatility_multiplier: 3.5,
                liquidity_reduction: 0.3,
                sentiment_shift: -0.6,
            },
            cascades: vec![
                Cascade { delay_days: 0, multiplier: 1.0 },
                Cascade { delay_days: 20, multiplier: 0.6 },
                Cascade { delay_days: 33, multiplier: 0.1 },
            ],
            recovery: Recovery { shape: RecoveryShape::Gradual, duration_days: 150, daily_vol_decay: 0.9 },
        });

        Self { scenarios }
    }
}
