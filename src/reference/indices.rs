//! The catalog of tradeable index funds: a fixed constituent list, weighting scheme, and expense
//! ratio (§3, §4.2). Index fund price is derived from constituent prices by the Price Engine, not
//! stored here.

use super::{AssetClass, Sector, SecurityMeta};
use crate::time::{instant, Instant, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Weighting {
    MarketCap,
    EqualWeight,
    PriceWeighted,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IndexFund {
    pub meta: SecurityMeta,
    pub constituents: Vec<Symbol>,
    pub weighting: Weighting,
    pub expense_ratio: f64,
    pub inception: Instant,
}

#[derive(Debug)]
pub struct IndexCatalog {
    indices: Vec<IndexFund>,
}

impl IndexCatalog {
    pub fn all(&self) -> &[IndexFund] {
        &self.indices
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&IndexFund> {
        self.indices.iter().find(|i| &i.meta.symbol == symbol)
    }

    pub fn meta(&self, symbol: &Symbol) -> Option<&SecurityMeta> {
        self.get(symbol).map(|i| &i.meta)
    }

    pub fn seed() -> Self {
        let meta = |symbol: &str, display_name: &'static str, inception: Instant| SecurityMeta {
            symbol: Symbol::new(symbol),
            display_name,
            sector: Sector::Market,
            asset_class: AssetClass::Index,
            listed_from: inception,
            retired_at: None,
        };

        Self {
            indices: vec![
                IndexFund {
                    meta: meta("BROADIDX", "Broad Market Composite Index", instant(1970, 1, 2, 14, 30, 0)),
                    constituents: vec![
                        Symbol::new("IBM"),
                        Symbol::new("XOM"),
                        Symbol::new("JPM"),
                        Symbol::new("GE"),
                        Symbol::new("PFE"),
                    ],
                    weighting: Weighting::MarketCap,
                    expense_ratio: 0.0009,
                    inception: instant(1970, 1, 2, 14, 30, 0),
                },
                IndexFund {
                    meta: meta("TECHIDX", "Technology Sector Index", instant(1986, 3, 13, 14, 30, 0)),
                    constituents: vec![
                        Symbol::new("IBM"),
                        Symbol::new("MSFT"),
                        Symbol::new("AAPL"),
                    ],
                    weighting: Weighting::MarketCap,
                    expense_ratio: 0.002,
                    inception: instant(1986, 3, 13, 14, 30, 0),
                },
                IndexFund {
                    meta: meta("GROWTHIDX", "Consumer Growth Equal-Weight Index", instant(1997, 5, 15, 14, 30, 0)),
                    constituents: vec![
                        Symbol::new("AMZN"),
                        Symbol::new("WFM"),
                    ],
                    weighting: Weighting::EqualWeight,
                    expense_ratio: 0.0015,
                    inception: instant(1997, 5, 15, 14, 30, 0),
                },
            ],
        }
    }
}
