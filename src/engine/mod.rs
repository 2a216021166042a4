//! The engine wrapper (§5): the single mutation lock over `{Clock, EngineState, Account,
//! ShareAvailability, PendingOrders}`, and the operations a request handler or the background
//! tick loop drive against it. [`runtime`] hosts the tick loop and command-dispatch task;
//! [`command`] defines the handler-facing surface; this module owns the lock and the batch logic
//! itself.

pub mod command;
pub mod runtime;
pub mod state;

use crate::account::Account;
use crate::availability::ShareAvailabilityBook;
use crate::config::EngineConfig;
use crate::engine::command::{Command, CommandOutcome};
use crate::engine::state::EngineState;
use crate::events::{cash, corporate};
use crate::money::Money;
use crate::persistence::error::PersistenceError;
use crate::persistence::{EngineSnapshot, PersistenceStore};
use crate::price::PriceEngine;
use crate::reference::companies::CompanyDossier;
use crate::reference::news::EmailItem;
use crate::reference::ReferenceData;
use crate::retention;
use crate::rng::{keyed_uniform, Purpose};
use crate::time::{Halt, Instant, SimClock, SpeedMultiplier, Symbol};
use crate::trade::error::TradeError;
use crate::trade::{Order, PendingOrders, TradeGate, TradeOutcome};
use crate::views::news::{self, NewsStreamEntry};
use crate::views::{self, StockSnapshot};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Deterministic initial `total_outstanding` for a freshly listed symbol, drawn once per symbol
/// from the same keyed PRNG contract every other per-symbol draw uses, in `[50M, 2B)` shares.
fn initial_outstanding_shares(global_seed: u64, symbol: &str) -> i64 {
    let roll = keyed_uniform(global_seed, symbol, 0, Purpose::InitialFloat);
    (50_000_000.0 + roll * 1_950_000_000.0) as i64
}

fn restore_clock(state: &EngineState, halts: Vec<Halt>) -> SimClock {
    let mut clock = SimClock::new(state.current_instant, halts);
    clock.set_multiplier(state.speed_multiplier.seconds_per_wall_second());
    if state.paused {
        clock.pause();
    }
    clock
}

fn sync_state_from_clock(state: &mut EngineState, clock: &SimClock) {
    state.current_instant = clock.now();
    state.speed_multiplier = clock.speed();
    state.paused = clock.is_paused();
}

/// The four pieces of state that mutate together, under one lock (§5).
struct EngineInner {
    clock: SimClock,
    state: EngineState,
    account: Account,
    availability: ShareAvailabilityBook,
    pending: PendingOrders,
}

impl EngineInner {
    fn price_of<'a>(prices: &'a PriceEngine, at: Instant) -> impl Fn(&Symbol) -> Option<f64> + 'a {
        move |symbol: &Symbol| prices.price(symbol, at).ok().map(|s| s.price)
    }
}

/// Owns the locked engine state plus the read-only handles (reference data, Price Engine,
/// config, persistence) every operation needs alongside it. Cheap to clone behind an `Arc` for
/// sharing between the tick loop task and command-handling tasks.
pub struct Engine {
    inner: RwLock<EngineInner>,
    reference: Arc<ReferenceData>,
    prices: PriceEngine,
    config: EngineConfig,
    persistence: Mutex<Box<dyn PersistenceStore + Send>>,
}

impl Engine {
    /// Starts a fresh engine: one account seeded with `initial_cash`, share availability seeded
    /// deterministically for every listed company and index fund, clock at `start`.
    pub fn new(
        reference: Arc<ReferenceData>,
        config: EngineConfig,
        persistence: Box<dyn PersistenceStore + Send>,
        initial_cash: Money,
        start: Instant,
    ) -> Self {
        let mut availability = ShareAvailabilityBook::new();
        for company in reference.companies.all() {
            let outstanding = initial_outstanding_shares(config.global_seed, company.meta.symbol.as_str());
            availability.seed(company.meta.symbol.clone(), outstanding);
        }
        for fund in reference.indices.all() {
            let outstanding = initial_outstanding_shares(config.global_seed, fund.meta.symbol.as_str());
            availability.seed(fund.meta.symbol.clone(), outstanding);
        }

        let clock = SimClock::new(start, reference.halts.clone());
        let prices = PriceEngine::new(reference.clone(), config.global_seed);
        Self {
            inner: RwLock::new(EngineInner {
                clock,
                state: EngineState::new(start),
                account: Account::new(initial_cash),
                availability,
                pending: PendingOrders::new(),
            }),
            reference,
            prices,
            config,
            persistence: Mutex::new(persistence),
        }
    }

    /// Resumes from a previously saved snapshot, reconstructing the live [`SimClock`] from its
    /// persisted mirror fields in `engine_state`.
    pub fn from_snapshot(
        reference: Arc<ReferenceData>,
        config: EngineConfig,
        persistence: Box<dyn PersistenceStore + Send>,
        snapshot: EngineSnapshot,
    ) -> Self {
        let clock = restore_clock(&snapshot.engine_state, reference.halts.clone());
        let prices = PriceEngine::new(reference.clone(), config.global_seed);
        Self {
            inner: RwLock::new(EngineInner {
                clock,
                state: snapshot.engine_state,
                account: snapshot.account,
                availability: snapshot.availability,
                pending: snapshot.pending_orders,
            }),
            reference,
            prices,
            config,
            persistence: Mutex::new(persistence),
        }
    }

    /// Loads `slot` from `persistence` and resumes from it.
    pub fn restore(
        reference: Arc<ReferenceData>,
        config: EngineConfig,
        mut persistence: Box<dyn PersistenceStore + Send>,
        slot: &str,
    ) -> Result<Self, PersistenceError> {
        let snapshot = persistence.load(slot)?;
        Ok(Self::from_snapshot(reference, config, persistence, snapshot))
    }

    fn snapshot_locked(inner: &EngineInner) -> EngineSnapshot {
        EngineSnapshot {
            engine_state: inner.state.clone(),
            account: inner.account.clone(),
            availability: inner.availability.clone(),
            pending_orders: inner.pending.clone(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        Self::snapshot_locked(&self.inner.read())
    }

    /// Saves the current state to `slot`, without running a tick batch first.
    pub fn save(&self, slot: &str) -> Result<(), PersistenceError> {
        let snapshot = self.snapshot();
        self.persistence.lock().save(slot, &snapshot)
    }

    // ---- time ----------------------------------------------------------------------------

    pub fn now(&self) -> Instant {
        self.inner.read().clock.now()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.read().clock.is_paused()
    }

    pub fn speed(&self) -> SpeedMultiplier {
        self.inner.read().clock.speed()
    }

    pub fn is_market_open(&self) -> bool {
        let inner = self.inner.read();
        inner.clock.is_market_open(inner.clock.now())
    }

    pub fn pause(&self) {
        self.inner.write().clock.pause();
    }

    pub fn resume(&self) {
        self.inner.write().clock.resume();
    }

    pub fn set_speed(&self, requested_seconds_per_wall_second: i64) {
        self.inner.write().clock.set_multiplier(requested_seconds_per_wall_second);
    }

    /// Advances the clock by `dt_wall` of elapsed wall time and runs the per-tick mutation batch:
    /// corporate events, then cash events (dividends/coupons/maturities/fees/interest/buyback/
    /// issuance), then pending-order re-evaluation, then scheduled retention pruning, in that
    /// order (§4.6-4.7, §5 "one such operation"). Persists the result; on persistence failure the
    /// whole batch is rolled back and retried on the next tick (§7).
    pub fn tick(&self, dt_wall: std::time::Duration) {
        let mut inner = self.inner.write();
        let before = Self::snapshot_locked(&inner);
        let before_clock_instant = inner.clock.now();

        inner.clock.advance_by(dt_wall);
        let now = inner.clock.now();
        sync_state_from_clock(&mut inner.state, &inner.clock);

        if now == before_clock_instant {
            // Paused, or no wall time elapsed: nothing to batch.
            return;
        }

        corporate::apply_due(
            &mut inner.state,
            &mut inner.account,
            &mut inner.availability,
            &self.reference.corporate_events,
            now,
        );
        cash::run_all(
            &mut inner.state,
            &mut inner.account,
            &mut inner.availability,
            &self.reference,
            &self.prices,
            &self.config,
            now,
        );

        let gate = TradeGate::new(&self.reference, &self.prices, &self.config);
        let price_of = EngineInner::price_of(&self.prices, now);
        let filled = gate.re_evaluate_pending(
            &inner.clock,
            &mut inner.account,
            &mut inner.availability,
            &mut inner.pending,
            price_of,
        );
        for txn in &filled {
            info!(?txn.kind, "pending order filled on re-evaluation");
        }

        retention::run_if_due(
            &mut inner.state,
            &mut inner.account,
            now,
            self.config.retention_schedule_days,
            self.config.retention_schedule_days,
        );

        let snapshot = Self::snapshot_locked(&inner);
        if let Err(err) = self.persistence.lock().save("auto", &snapshot) {
            warn!(%err, "tick batch failed to persist, rolling back");
            inner.clock = restore_clock(&before.engine_state, self.reference.halts.clone());
            inner.state = before.engine_state;
            inner.account = before.account;
            inner.availability = before.availability;
            inner.pending = before.pending_orders;
        }
    }

    // ---- trading ---------------------------------------------------------------------------

    pub fn submit_order(&self, order: Order) -> Result<TradeOutcome, TradeError> {
        let mut inner = self.inner.write();
        let gate = TradeGate::new(&self.reference, &self.prices, &self.config);
        let now = inner.clock.now();
        let price_of = EngineInner::price_of(&self.prices, now);
        gate.execute_trade(&inner.clock, &mut inner.account, &mut inner.availability, &mut inner.pending, order, price_of)
    }

    pub fn cancel_order(&self, id: Uuid) -> bool {
        self.inner.write().pending.cancel(id)
    }

    // ---- crash overlay -----------------------------------------------------------------------

    pub fn trigger_crash(&self, scenario_id: &str) -> bool {
        let now = self.now();
        self.prices.trigger_crash(scenario_id, now)
    }

    pub fn deactivate_crash(&self, scenario_id: &str) -> bool {
        self.prices.deactivate_crash(scenario_id)
    }

    pub fn active_manual_crash_ids(&self) -> Vec<&'static str> {
        self.prices.active_manual_crash_ids()
    }

    // ---- retention ---------------------------------------------------------------------------

    /// Forces a retention pass regardless of schedule.
    pub fn prune_now(&self) {
        let mut inner = self.inner.write();
        let now = inner.clock.now();
        retention::prune_transactions(&mut inner.account, now, self.config.retention_schedule_days);
        inner.state.cursors.last_retention_run = Some(now);
    }

    // ---- derived views -----------------------------------------------------------------------

    pub fn account(&self) -> Account {
        self.inner.read().account.clone()
    }

    pub fn stock_snapshot(&self, symbol: &Symbol) -> Result<StockSnapshot, crate::price::PriceError> {
        let inner = self.inner.read();
        let now = inner.clock.now();
        views::stock_snapshot(&self.prices, &inner.availability, &inner.account, symbol, now)
    }

    pub fn all_stock_snapshots(&self) -> Vec<StockSnapshot> {
        let inner = self.inner.read();
        let now = inner.clock.now();
        views::all_stock_snapshots(&self.prices, &inner.availability, &inner.account, &self.reference, now)
    }

    pub fn price_history(&self, symbol: &Symbol, days: i64) -> Vec<(Instant, f64)> {
        let now = self.now();
        views::price_history(&self.prices, symbol, now, days)
    }

    pub fn market_index_history(&self, days: i64) -> Vec<(Instant, f64)> {
        let now = self.now();
        views::market_index_history(&self.prices, &self.reference, now, days)
    }

    pub fn company_at_time(&self, symbol: &Symbol) -> Option<&CompanyDossier> {
        views::company_at_time(&self.reference, symbol, self.now())
    }

    /// Merged static + dynamic news up to `now()`, scanning back from the last scan boundary
    /// recorded in the persisted cooldown state (defaulting to a week before `now()` the first
    /// time this is called, so a genuine move on day one isn't missed by an unprimed cooldown).
    pub fn news_stream(&self) -> Vec<NewsStreamEntry> {
        let mut inner = self.inner.write();
        let now = inner.clock.now();
        let since = now - chrono::Duration::days(7);
        news::news_stream(&mut inner.state.news_cooldowns, &self.prices, &self.reference, since, now)
    }

    pub fn email_stream(&self) -> Vec<&EmailItem> {
        news::email_stream(&self.reference, self.now())
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Dispatches a single [`Command`], returning the matching [`CommandOutcome`].
    pub fn dispatch(&self, command: Command) -> CommandOutcome {
        match command {
            Command::SubmitOrder(order) => CommandOutcome::Trade(self.submit_order(order)),
            Command::CancelOrder(id) => CommandOutcome::Cancelled(self.cancel_order(id)),
            Command::Pause => {
                self.pause();
                CommandOutcome::Ack
            }
            Command::Resume => {
                self.resume();
                CommandOutcome::Ack
            }
            Command::SetSpeed { requested_seconds_per_wall_second } => {
                self.set_speed(requested_seconds_per_wall_second);
                CommandOutcome::Ack
            }
            Command::TriggerCrash { scenario_id } => CommandOutcome::CrashTriggered(self.trigger_crash(&scenario_id)),
            Command::DeactivateCrash { scenario_id } => CommandOutcome::CrashDeactivated(self.deactivate_crash(&scenario_id)),
            Command::PruneNow => {
                self.prune_now();
                CommandOutcome::Ack
            }
            Command::Save { slot } => CommandOutcome::Saved(self.save(&slot)),
        }
    }
}
