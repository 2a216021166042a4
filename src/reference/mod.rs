//! Static catalogs loaded once at startup and read-only at steady state: companies, corporate
//! events, crash scenarios, halt windows, loan lenders, bonds, index funds, and news/email decks.
//! No mutation; lookups are constant- or log-time (§4.2).

pub mod bonds;
pub mod companies;
pub mod corporate_events;
pub mod crashes;
pub mod halts;
pub mod indices;
pub mod loans;
pub mod news;

use crate::time::{AssetClass, Instant, Symbol};
use serde::{Deserialize, Serialize};

/// Static per-symbol metadata. A price is defined only on `[listed_from, retired_at)` (§3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SecurityMeta {
    pub symbol: Symbol,
    pub display_name: &'static str,
    pub sector: Sector,
    pub asset_class: AssetClass,
    pub listed_from: Instant,
    pub retired_at: Option<Instant>,
}

impl SecurityMeta {
    pub fn is_listed_at(&self, t: Instant) -> bool {
        t >= self.listed_from && self.retired_at.map(|r| t < r).unwrap_or(true)
    }
}

/// Sector tag, used to select era growth bias and crash sector impacts (§4.3.1).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Sector {
    Technology,
    Finance,
    Energy,
    Healthcare,
    ConsumerDiscretionary,
    Industrials,
    Utilities,
    RealEstate,
    Telecom,
    Market,
}

/// Read-only handle over every static catalog, constructed once at startup.
#[derive(Debug)]
pub struct ReferenceData {
    pub companies: companies::CompanyCatalog,
    pub crashes: crashes::CrashCatalog,
    pub halts: Vec<crate::time::Halt>,
    pub lenders: loans::LenderCatalog,
    pub bonds: bonds::BondCatalog,
    pub indices: indices::IndexCatalog,
    pub news: news::NewsDeck,
    pub corporate_events: corporate_events::CorporateEventCatalog,
}

impl ReferenceData {
    pub fn load() -> Self {
        Self {
            companies: companies::CompanyCatalog::seed(),
            crashes: crashes::CrashCatalog::seed(),
            halts: halts::seed(),
            lenders: loans::LenderCatalog::seed(),
            bonds: bonds::BondCatalog::seed(),
            indices: indices::IndexCatalog::seed(),
            news: news::NewsDeck::seed(),
            corporate_events: corporate_events::CorporateEventCatalog::seed(),
        }
    }

    pub fn security(&self, symbol: &Symbol) -> Option<&SecurityMeta> {
        self.companies
            .meta(symbol)
            .or_else(|| self.indices.meta(symbol))
            .or_else(|| self.bonds.meta(symbol))
    }
}
