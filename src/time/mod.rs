//! Owns simulated time: the single source of truth for "now" that every other component queries
//! against. Advances at a user-controlled multiplier, decoupled entirely from wall-clock time,
//! and answers market-hours / trading-halt questions.

mod holidays;

pub use holidays::is_nyse_holiday;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A simulated point in time. Millisecond precision, totally ordered, monotonic under advance.
///
/// Modelled as `DateTime<Utc>` with the convention that the wall-clock value actually represents
/// "US Eastern, no DST" — a fixed `UTC-5` offset, per the engine's timezone decision. Keeping the
/// representation `Utc` (rather than a `FixedOffset` zone) means every downstream comparison,
/// serialisation, and duration computation is the plain, total-order `chrono` arithmetic the
/// rest of the stack expects.
pub type Instant = DateTime<Utc>;

/// The fixed reference offset behind every [`Instant`]: US Eastern without DST.
pub const REFERENCE_OFFSET_HOURS: i64 = -5;

/// An opaque security identifier, at most 8 ASCII characters. Namespaced informally by asset
/// class (stock, index, bond) via catalog lookup rather than the symbol's shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Display, From)]
pub struct Symbol(SmolStr);

impl Symbol {
    pub fn new(raw: &str) -> Self {
        debug_assert!(
            raw.len() <= 8 && raw.is_ascii(),
            "Symbol must be <= 8 ASCII chars, got {raw:?}"
        );
        Self(SmolStr::new(raw))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::new(value)
    }
}

/// Asset class a [`Symbol`] belongs to, used to select pricing, tax, and catalog behaviour.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AssetClass {
    Stock,
    Index,
    Bond,
}

/// Speed at which the simulated clock advances relative to wall-clock time, in simulated
/// seconds per wall second. `Paused` freezes `now()` entirely.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SpeedMultiplier {
    Paused,
    X60,
    X3600,
    X86400,
}

impl SpeedMultiplier {
    /// Simulated seconds advanced per wall-clock second, clamping any conceptual "unknown"
    /// multiplier to the nearest supported one (the Clock never fails on bad input).
    pub fn seconds_per_wall_second(self) -> i64 {
        match self {
            SpeedMultiplier::Paused => 0,
            SpeedMultiplier::X60 => 60,
            SpeedMultiplier::X3600 => 3_600,
            SpeedMultiplier::X86400 => 86_400,
        }
    }

    /// Clamp an arbitrary requested multiplier to the nearest supported step.
    pub fn nearest(requested: i64) -> Self {
        const STEPS: [(i64, SpeedMultiplier); 4] = [
            (0, SpeedMultiplier::Paused),
            (60, SpeedMultiplier::X60),
            (3_600, SpeedMultiplier::X3600),
            (86_400, SpeedMultiplier::X86400),
        ];
        STEPS
            .iter()
            .min_by_key(|(secs, _)| (secs - requested).abs())
            .map(|(_, speed)| *speed)
            .unwrap_or(SpeedMultiplier::X60)
    }
}

/// Scope of a trading halt: full market closure, or only the listed symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum HaltScope {
    Full,
    Partial(Vec<Symbol>),
}

/// A scheduled trading halt window, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Halt {
    pub id: &'static str,
    pub start: Instant,
    pub end: Instant,
    pub scope: HaltScope,
}

impl Halt {
    pub fn contains(&self, t: Instant) -> bool {
        t >= self.start && t < self.end
    }

    pub fn blocks(&self, symbol: &Symbol) -> bool {
        match &self.scope {
            HaltScope::Full => true,
            HaltScope::Partial(symbols) => symbols.contains(symbol),
        }
    }
}

/// Owns `current_instant` and the active [`SpeedMultiplier`]; advances on a fixed-period tick and
/// answers market-hours / halt queries. The clock itself never fails: unknown multipliers clamp,
/// and queries outside any data range are answered by the caller (Price Engine, Halt schedule),
/// not by the clock refusing to report a time.
#[derive(Debug)]
pub struct SimClock {
    current_instant: Instant,
    speed: SpeedMultiplier,
    paused: bool,
    halts: Vec<Halt>,
}

impl SimClock {
    pub fn new(start: Instant, halts: Vec<Halt>) -> Self {
        Self {
            current_instant: start,
            speed: SpeedMultiplier::X3600,
            paused: false,
            halts,
        }
    }

    pub fn now(&self) -> Instant {
        self.current_instant
    }

    pub fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn set_multiplier(&mut self, requested_seconds_per_wall_second: i64) {
        self.speed = SpeedMultiplier::nearest(requested_seconds_per_wall_second);
    }

    /// Advance `current_instant` by `dt_wall` of elapsed wall-clock time, scaled by the active
    /// speed multiplier. A no-op while paused.
    pub fn advance_by(&mut self, dt_wall: std::time::Duration) -> Instant {
        if self.paused {
            return self.current_instant;
        }
        let sim_seconds = dt_wall.as_secs_f64() * self.speed.seconds_per_wall_second() as f64;
        self.current_instant += Duration::milliseconds((sim_seconds * 1_000.0) as i64);
        self.current_instant
    }

    /// Jump directly to `instant`. Used for save/restore and test scenario setup; never moves
    /// time backwards in normal operation (the caller is responsible for that invariant).
    pub fn set_now(&mut self, instant: Instant) {
        self.current_instant = instant;
    }

    /// True iff `instant` falls inside NYSE-like trading hours: a weekday, `09:30 <= local <=
    /// 16:00` in the fixed reference timezone, and not a holiday.
    pub fn is_market_open(&self, instant: Instant) -> bool {
        let local = instant + Duration::hours(REFERENCE_OFFSET_HOURS);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        if is_nyse_holiday(local.date_naive()) {
            return false;
        }
        let open = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
        let local_time = local.time();
        local_time >= open && local_time <= close
    }

    /// The halt active at `instant`, if any. Halts are checked in catalog order; the first match
    /// wins (the reference data's halt schedule does not define overlapping halts).
    pub fn active_halt(&self, instant: Instant) -> Option<&Halt> {
        self.halts.iter().find(|halt| halt.contains(instant))
    }

    pub fn halts(&self) -> &[Halt] {
        &self.halts
    }
}

/// Construct an [`Instant`] from a UTC calendar date/time, for catalog and test authoring.
pub fn instant(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Instant {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid calendar date")
}
