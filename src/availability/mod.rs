//! Share Availability (§4.5): per-symbol outstanding/float/available/player-owned counters, split
//! propagation, and the monthly buyback / quarterly issuance cycles.

use crate::rng::{keyed_uniform, Purpose};
use crate::time::{Instant, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AvailabilityError {
    #[error("{symbol} has only {available} shares available, {requested} requested")]
    InsufficientFloat { symbol: Symbol, available: i64, requested: i64 },
    #[error("unknown symbol {0}")]
    UnknownSymbol(Symbol),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Availability {
    pub total_outstanding: i64,
    pub public_float: i64,
    pub available_for_trading: i64,
    pub player_owned: i64,
}

impl Availability {
    pub fn new(total_outstanding: i64) -> Self {
        Self {
            total_outstanding,
            public_float: total_outstanding,
            available_for_trading: total_outstanding,
            player_owned: 0,
        }
    }

    fn invariant_ok(&self) -> bool {
        self.available_for_trading >= 0
            && self.available_for_trading <= self.public_float
            && self.public_float <= self.total_outstanding
            && self.player_owned <= self.public_float
    }

    fn floor(&self) -> i64 {
        (self.total_outstanding as f64 * 0.10).ceil() as i64
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareAvailabilityBook {
    by_symbol: HashMap<Symbol, Availability>,
}

impl ShareAvailabilityBook {
    pub fn new() -> Self {
        Self { by_symbol: HashMap::new() }
    }

    pub fn seed(&mut self, symbol: Symbol, outstanding: i64) {
        self.by_symbol.insert(symbol, Availability::new(outstanding));
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Availability> {
        self.by_symbol.get(symbol)
    }

    pub fn can_purchase(&self, symbol: &Symbol, qty: i64) -> Result<(), AvailabilityError> {
        let entry = self
            .by_symbol
            .get(symbol)
            .ok_or_else(|| AvailabilityError::UnknownSymbol(symbol.clone()))?;
        if entry.available_for_trading < qty {
            return Err(AvailabilityError::InsufficientFloat {
                symbol: symbol.clone(),
                available: entry.available_for_trading,
                requested: qty,
            });
        }
        Ok(())
    }

    pub fn reserve_purchase(&mut self, symbol: &Symbol, qty: i64) -> Result<(), AvailabilityError> {
        self.can_purchase(symbol, qty)?;
        let entry = self.by_symbol.get_mut(symbol).expect("checked above");
        entry.available_for_trading -= qty;
        entry.player_owned += qty;
        debug_assert!(entry.invariant_ok());
        Ok(())
    }

    pub fn reserve_sale(&mut self, symbol: &Symbol, qty: i64) -> Result<(), AvailabilityError> {
        let entry = self
            .by_symbol
            .get_mut(symbol)
            .ok_or_else(|| AvailabilityError::UnknownSymbol(symbol.clone()))?;
        entry.available_for_trading += qty;
        entry.player_owned -= qty;
        debug_assert!(entry.invariant_ok());
        Ok(())
    }

    /// Multiplies all four counters by `ratio`, rounding to the nearest whole share (§3, §4.6).
    pub fn apply_split(&mut self, symbol: &Symbol, ratio: f64) {
        if let Some(entry) = self.by_symbol.get_mut(symbol) {
            entry.total_outstanding = (entry.total_outstanding as f64 * ratio).round() as i64;
            entry.public_float = (entry.public_float as f64 * ratio).round() as i64;
            entry.available_for_trading = (entry.available_for_trading as f64 * ratio).round() as i64;
            entry.player_owned = (entry.player_owned as f64 * ratio).round() as i64;
        }
    }

    /// Removes a symbol's availability entry entirely: used when a corporate event retires it
    /// (bankruptcy, acquisition, delisting) so it no longer appears in any derived view.
    pub fn retire(&mut self, symbol: &Symbol) {
        self.by_symbol.remove(symbol);
    }

    /// Monthly buyback cycle (§4.5): only runs when `market_sentiment > 0.3`; per symbol, with
    /// probability `max(0, (sentiment-0.3) * 0.15)`, buys back 0.5%-2% of `public_float`, deterministically
    /// seeded by `day_index` and the symbol's hash. Never breaches the 10% floor.
    pub fn run_buyback_cycle(&mut self, global_seed: u64, at: Instant, market_sentiment: f64) {
        if market_sentiment <= 0.3 {
            return;
        }
        let day = at.timestamp() / 86_400;
        let probability = ((market_sentiment - 0.3) * 0.15).max(0.0);
        for (symbol, entry) in self.by_symbol.iter_mut() {
            let roll = keyed_uniform(global_seed, symbol.as_str(), day, Purpose::Buyback);
            if roll >= probability {
                continue;
            }
            let fraction = 0.005 + keyed_uniform(global_seed, symbol.as_str(), day + 1, Purpose::Buyback) * 0.015;
            let mut amount = (entry.public_float as f64 * fraction).round() as i64;
            let floor = entry.floor();
            amount = amount.min((entry.available_for_trading - floor).max(0));
            amount = amount.min(entry.total_outstanding - floor).max(0);
            entry.total_outstanding -= amount;
            entry.public_float -= amount;
            entry.available_for_trading -= amount;
        }
    }

    /// Quarterly issuance cycle (§4.5): probability 5% when sentiment < 0, else 2%; issues 1%-5%
    /// of outstanding shares into the float and available pool.
    pub fn run_issuance_cycle(&mut self, global_seed: u64, at: Instant, market_sentiment: f64) {
        let day = at.timestamp() / 86_400;
        let probability = if market_sentiment < 0.0 { 0.05 } else { 0.02 };
        for (symbol, entry) in self.by_symbol.iter_mut() {
            let roll = keyed_uniform(global_seed, symbol.as_str(), day, Purpose::Issuance);
            if roll >= probability {
                continue;
            }
            let fraction = 0.01 + keyed_uniform(global_seed, symbol.as_str(), day + 1, Purpose::Issuance) * 0.04;
            let amount = (entry.total_outstanding as f64 * fraction).round() as i64;
            entry.total_outstanding += amount;
            entry.public_float += amount;
            entry.available_for_trading += amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant;

    fn book() -> ShareAvailabilityBook {
        let mut book = ShareAvailabilityBook::new();
        book.seed(Symbol::new("IBM"), 1_000_000);
        book
    }

    #[test]
    fn reserve_purchase_and_sale_round_trip() {
        let mut book = book();
        let ibm = Symbol::new("IBM");
        book.reserve_purchase(&ibm, 100).unwrap();
        assert_eq!(book.get(&ibm).unwrap().player_owned, 100);
        book.reserve_sale(&ibm, 100).unwrap();
        assert_eq!(book.get(&ibm).unwrap().player_owned, 0);
        assert_eq!(book.get(&ibm).unwrap().available_for_trading, 1_000_000);
    }

    #[test]
    fn purchase_beyond_availability_is_rejected() {
        let mut book = book();
        let ibm = Symbol::new("IBM");
        assert!(book.reserve_purchase(&ibm, 2_000_000).is_err());
    }

    #[test]
    fn split_multiplies_all_four_counters() {
        let mut book = book();
        let ibm = Symbol::new("IBM");
        book.reserve_purchase(&ibm, 100).unwrap();
        book.apply_split(&ibm, 2.0);
        let a = book.get(&ibm).unwrap();
        assert_eq!(a.total_outstanding, 2_000_000);
        assert_eq!(a.player_owned, 200);
    }

    #[test]
    fn buyback_never_breaches_floor() {
        let mut book = book();
        let ibm = Symbol::new("IBM");
        for day in 0..500 {
            book.run_buyback_cycle(1, instant(2000, 1, 1, 0, 0, 0) + chrono::Duration::days(day), 0.9);
        }
        let a = book.get(&ibm).unwrap();
        assert!(a.total_outstanding >= a.floor());
    }
}
