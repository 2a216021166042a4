//! The Trade Gate (§4.8): validates and executes `Order`s against the clock, price engine,
//! share availability, and account state, in a fixed fail-fast order.
//! Limit orders that don't cross the current price enqueue into [`PendingOrders`] instead of
//! failing, and are re-evaluated on each price update while the market is open.

pub mod error;

use crate::account::margin::{MarginState, MARGIN_FACTOR};
use crate::account::transaction::Transaction;
use crate::availability::{AvailabilityError, ShareAvailabilityBook};
use crate::config::EngineConfig;
use crate::money::Money;
use crate::price::{PriceEngine, PriceError};
use crate::reference::ReferenceData;
use crate::time::{Instant, SimClock, Symbol};
use crate::trade::error::TradeError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum OrderSide {
    Buy,
    Sell,
    Short,
    Cover,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub enum OrderKind {
    Market,
    Limit { limit_px: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub symbol: Symbol,
    pub side: OrderSide,
    pub qty: i64,
    pub kind: OrderKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PendingOrder {
    pub id: Uuid,
    pub order: Order,
    pub submitted_at: Instant,
    pub expires_at: Instant,
}

/// Queue of resting limit orders, re-evaluated on each price tick while the market is open.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrders {
    orders: Vec<PendingOrder>,
}

impl PendingOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, order: Order, at: Instant, expiry_days: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.orders.push(PendingOrder {
            id,
            order,
            submitted_at: at,
            expires_at: at + chrono::Duration::days(expiry_days),
        });
        id
    }

    /// Cancels a single pending order by id; a single mutation (§5 "Cancellation").
    pub fn cancel(&mut self, id: Uuid) -> bool {
        let before = self.orders.len();
        self.orders.retain(|p| p.id != id);
        self.orders.len() != before
    }

    /// Removes and returns every order whose expiry has elapsed as of `at`.
    pub fn expire_before(&mut self, at: Instant) -> Vec<PendingOrder> {
        let (expired, remaining): (Vec<_>, Vec<_>) = self.orders.drain(..).partition(|p| p.expires_at <= at);
        self.orders = remaining;
        expired
    }

    pub fn all(&self) -> &[PendingOrder] {
        &self.orders
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Filled(Transaction),
    Enqueued(Uuid),
}

pub struct TradeGate<'a> {
    reference: &'a ReferenceData,
    prices: &'a PriceEngine,
    config: &'a EngineConfig,
}

impl<'a> TradeGate<'a> {
    pub fn new(reference: &'a ReferenceData, prices: &'a PriceEngine, config: &'a EngineConfig) -> Self {
        Self { reference, prices, config }
    }

    fn classify_price_error(&self, symbol: &Symbol, now: Instant, err: PriceError) -> TradeError {
        match err {
            PriceError::UnknownSymbol(s) => TradeError::UnknownSymbol(s),
            PriceError::Unavailable(s) => match self.reference.security(symbol) {
                Some(meta) if now < meta.listed_from => TradeError::NotListedYet(s),
                _ => TradeError::Delisted(s),
            },
        }
    }

    fn crosses(order: &Order, market_price: f64) -> bool {
        match order.kind {
            OrderKind::Market => true,
            OrderKind::Limit { limit_px } => match order.side {
                OrderSide::Buy | OrderSide::Cover => market_price <= limit_px,
                OrderSide::Sell | OrderSide::Short => market_price >= limit_px,
            },
        }
    }

    /// Validates and either fills immediately or enqueues `order`, per §4.8's fixed validation
    /// order. `price_of` is used only for the concentration/leverage checks against the rest of
    /// the portfolio.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_trade(
        &self,
        clock: &SimClock,
        account: &mut crate::account::Account,
        availability: &mut ShareAvailabilityBook,
        pending: &mut PendingOrders,
        order: Order,
        price_of: impl Fn(&Symbol) -> Option<f64>,
    ) -> Result<TradeOutcome, TradeError> {
        let now = clock.now();

        // 1. Clock: market open, no active full halt, no matching partial halt.
        if !clock.is_market_open(now) {
            return Err(TradeError::MarketClosed);
        }
        if let Some(halt) = clock.active_halt(now) {
            if halt.blocks(&order.symbol) {
                return Err(TradeError::TradingHalted { halt_id: halt.id });
            }
        }

        // 2. Price engine: symbol tradable at now().
        let sample = self
            .prices
            .price(&order.symbol, now)
            .map_err(|e| self.classify_price_error(&order.symbol, now, e))?;

        if !Self::crosses(&order, sample.price) {
            if matches!(order.kind, OrderKind::Limit { .. }) {
                let id = pending.enqueue(order, now, self.config.limit_order_expiry_days);
                return Ok(TradeOutcome::Enqueued(id));
            }
            return Err(TradeError::LimitNotCrossed);
        }

        self.fill(account, availability, &order, sample.price, now, &price_of)
            .map(TradeOutcome::Filled)
    }

    /// Re-evaluates every pending limit order against the current price, filling any that now
    /// cross. Orders that fail non-price validation at fill time (insufficient cash/shares/float)
    /// are left pending rather than dropped — they may become fillable again later.
    pub fn re_evaluate_pending(
        &self,
        clock: &SimClock,
        account: &mut crate::account::Account,
        availability: &mut ShareAvailabilityBook,
        pending: &mut PendingOrders,
        price_of: impl Fn(&Symbol) -> Option<f64>,
    ) -> Vec<Transaction> {
        let now = clock.now();
        if !clock.is_market_open(now) {
            return Vec::new();
        }
        pending.expire_before(now);

        let mut filled = Vec::new();
        let mut still_pending = Vec::new();
        for resting in pending.orders.drain(..) {
            let Ok(sample) = self.prices.price(&resting.order.symbol, now) else {
                still_pending.push(resting);
                continue;
            };
            if !Self::crosses(&resting.order, sample.price) {
                still_pending.push(resting);
                continue;
            }
            match self.fill(account, availability, &resting.order, sample.price, now, &price_of) {
                Ok(txn) => filled.push(txn),
                Err(_) => still_pending.push(resting),
            }
        }
        pending.orders = still_pending;
        filled
    }

    fn fill(
        &self,
        account: &mut crate::account::Account,
        availability: &mut ShareAvailabilityBook,
        order: &Order,
        price: f64,
        now: Instant,
        price_of: &impl Fn(&Symbol) -> Option<f64>,
    ) -> Result<Transaction, TradeError> {
        let qty = order.qty;
        let notional = Money::from_dollars_f64(qty as f64 * price);
        let fees = notional.scale(self.config.trade_fee_rate());

        // 3. Availability: can_purchase for buys; sufficient player_owned for sells; sufficient
        //    float for shorts (shorting borrows against the float, same ledger as a purchase).
        match order.side {
            OrderSide::Buy | OrderSide::Short => {
                availability.can_purchase(&order.symbol, qty).map_err(map_availability_err)?;
            }
            OrderSide::Sell => {
                let owned = account.shares_owned(&order.symbol);
                if owned < qty {
                    return Err(TradeError::InsufficientShares { needed: qty as u64, available: owned.max(0) as u64 });
                }
            }
            OrderSide::Cover => {
                let shorted = account.shares_short(&order.symbol);
                if shorted < qty {
                    return Err(TradeError::InsufficientShares { needed: qty as u64, available: shorted.max(0) as u64 });
                }
            }
        }

        // 4. Account: sufficient cash (or margin buying power) for buys; margin for shorts;
        //    concentration and leverage.
        let mut margin_draw = Money::ZERO;
        match order.side {
            OrderSide::Buy => {
                let total_cost = notional + fees;
                let shortfall = (total_cost - account.cash).max(Money::ZERO);
                if shortfall > Money::ZERO {
                    // Reg-T initial margin: at most half the notional may be borrowed against the
                    // shares being bought, the rest (plus all fees) must already be in cash.
                    let max_marginable = notional.scale(MARGIN_FACTOR);
                    if shortfall > max_marginable {
                        return Err(TradeError::InsufficientCash { needed: total_cost, available: account.cash });
                    }
                    margin_draw = shortfall;
                }
                let existing = account.long_position_value(&order.symbol, price);
                let total_value = account.total_long_value(price_of);
                if !MarginState::within_concentration_limit(existing, notional, total_value) {
                    return Err(TradeError::ConcentrationExceeded(order.symbol.clone()));
                }
                let equity = account.net_equity(price_of);
                let exposure = total_value;
                if !MarginState::within_leverage_limit(exposure, notional, equity) {
                    return Err(TradeError::LeverageExceeded);
                }
            }
            OrderSide::Short => {
                let collateral = MarginState::collateral_required_for_short(notional);
                let buying_power = account.margin_state.buying_power(account.cash, account.total_long_value(price_of));
                if buying_power < collateral {
                    return Err(TradeError::InsufficientCash { needed: collateral, available: buying_power });
                }
                let equity = account.net_equity(price_of);
                let exposure = account.total_short_liability(price_of);
                if !MarginState::within_leverage_limit(exposure, notional, equity) {
                    return Err(TradeError::LeverageExceeded);
                }
            }
            OrderSide::Sell | OrderSide::Cover => {}
        }

        // 5 & 6. Fees/taxes computed inside `Account::record_*`; mutate atomically.
        let txn = match order.side {
            OrderSide::Buy => {
                availability.reserve_purchase(&order.symbol, qty).map_err(map_availability_err)?;
                let txn = account.record_buy(order.symbol.clone(), qty, price, fees, now).clone();
                if margin_draw.as_cents() > 0 {
                    account.margin_state.margin_drawn += margin_draw;
                    account.cash += margin_draw;
                }
                txn
            }
            OrderSide::Sell => {
                availability.reserve_sale(&order.symbol, qty).map_err(map_availability_err)?;
                account.record_sell(order.symbol.clone(), qty, price, fees, now).0.clone()
            }
            OrderSide::Short => {
                availability.reserve_purchase(&order.symbol, qty).map_err(map_availability_err)?;
                account.record_short(order.symbol.clone(), qty, price, fees, now).clone()
            }
            OrderSide::Cover => {
                availability.reserve_sale(&order.symbol, qty).map_err(map_availability_err)?;
                account.record_cover(order.symbol.clone(), qty, price, fees, now).clone()
            }
        };
        Ok(txn)
    }
}

fn map_availability_err(err: AvailabilityError) -> TradeError {
    match err {
        AvailabilityError::InsufficientFloat { available, requested, .. } => {
            TradeError::InsufficientFloat { needed: requested.max(0) as u64, available: available.max(0) as u64 }
        }
        AvailabilityError::UnknownSymbol(s) => TradeError::UnknownSymbol(s),
    }
}
