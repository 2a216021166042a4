//! The dated library of corporate actions replayed by the corporate-event processor (§4.6): a
//! chronological, at-most-once tagged union of splits, mergers, acquisitions, bankruptcies, IPOs,
//! and going-private/delisting events.

use crate::time::{instant, Instant, Symbol};
use serde::{Deserialize, Serialize};

/// Kind-specific payload of a corporate event (§4.6).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum CorporateEventKind {
    Split { ratio: f64 },
    AcquisitionCash { price_per_share: f64, acquirer: Option<Symbol> },
    AcquisitionStock { acquirer: Symbol, ratio: f64 },
    Bankruptcy,
    Ipo,
    GoingPrivate { price_per_share: f64 },
    Delisting,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CorporateEvent {
    pub id: &'static str,
    pub symbol: Symbol,
    pub effective_instant: Instant,
    pub kind: CorporateEventKind,
}

/// The static, seeded library. `ReferenceData` is shared behind an `Arc` across the engine and
/// the price engine, so completion is tracked out-of-band in `EngineState::processed_corporate_events`
/// rather than mutated on these entries — `all()` always returns the original seed in chronological
/// order.
#[derive(Debug)]
pub struct CorporateEventCatalog {
    events: Vec<CorporateEvent>,
}

impl CorporateEventCatalog {
    pub fn all(&self) -> &[CorporateEvent] {
        &self.events
    }

    pub fn seed() -> Self {
        Self {
            events: vec![
                CorporateEvent {
                    id: "aapl_split_1987",
                    symbol: Symbol::new("AAPL"),
                    effective_instant: instant(1987, 6, 16, 14, 30, 0),
                    kind: CorporateEventKind::Split { ratio: 2.0 },
                },
                CorporateEvent {
                    id: "aapl_split_2000",
                    symbol: Symbol::new("AAPL"),
                    effective_instant: instant(2000, 6, 21, 14, 30, 0),
                    kind: CorporateEventKind::Split { ratio: 2.0 },
                },
                CorporateEvent {
                    id: "aapl_split_2005",
                    symbol: Symbol::new("AAPL"),
                    effective_instant: instant(2005, 2, 28, 14, 30, 0),
                    kind: CorporateEventKind::Split { ratio: 2.0 },
                },
                CorporateEvent {
                    id: "aapl_split_2014",
                    symbol: Symbol::new("AAPL"),
                    effective_instant: instant(2014, 6, 9, 14, 30, 0),
                    kind: CorporateEventKind::Split { ratio: 7.0 },
                },
                CorporateEvent {
                    id: "msft_split_1999",
                    symbol: Symbol::new("MSFT"),
                    effective_instant: instant(1999, 3, 29, 14, 30, 0),
                    kind: CorporateEventKind::Split { ratio: 2.0 },
                },
                CorporateEvent {
                    id: "enron_bankruptcy",
                    symbol: Symbol::new("ENRN"),
                    effective_instant: instant(2001, 12, 2, 14, 30, 0),
                    kind: CorporateEventKind::Bankruptcy,
                },
                CorporateEvent {
                    id: "wfm_amzn_acquisition",
                    symbol: Symbol::new("WFM"),
                    effective_instant: instant(2017, 6, 16, 20, 0, 0),
                    kind: CorporateEventKind::AcquisitionCash {
                        price_per_share: 42.00,
                        acquirer: Some(Symbol::new("AMZN")),
                    },
                },
                CorporateEvent {
                    id: "pets_delisting",
                    symbol: Symbol::new("PETS"),
                    effective_instant: instant(2000, 11, 7, 14, 30, 0),
                    kind: CorporateEventKind::Delisting,
                },
            ],
        }
    }
}
