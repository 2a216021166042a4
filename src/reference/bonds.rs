//! The catalog of purchasable bonds: treasury, corporate, and municipal, with fixed coupon
//! schedules (§3, §4.2, §6 tax rules).

use super::{AssetClass, Sector, SecurityMeta};
use crate::time::{instant, Instant, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BondKind {
    Treasury,
    Corporate,
    Municipal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CreditRating {
    Aaa,
    Aa,
    A,
    Bbb,
    Bb,
    B,
}

/// A single fixed-income instrument. Interest accrues at `coupon_rate` on `face_value_cents`,
/// paid `coupon_frequency_per_year` times a year until `maturity`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Bond {
    pub meta: SecurityMeta,
    pub kind: BondKind,
    pub rating: CreditRating,
    pub face_value_cents: i64,
    pub coupon_rate: f64,
    pub coupon_frequency_per_year: u32,
    pub issue: Instant,
    pub maturity: Instant,
    pub callable_from: Option<Instant>,
    /// Municipal bond coupon interest is exempt from the tax rules in §6; treasury and corporate
    /// interest is ordinary income.
    pub tax_exempt: bool,
}

impl Bond {
    pub fn is_callable_at(&self, t: Instant) -> bool {
        self.callable_from.map(|c| t >= c).unwrap_or(false)
    }
}

#[derive(Debug)]
pub struct BondCatalog {
    bonds: Vec<Bond>,
}

impl BondCatalog {
    pub fn all(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Bond> {
        self.bonds.iter().find(|b| &b.meta.symbol == symbol)
    }

    pub fn meta(&self, symbol: &Symbol) -> Option<&SecurityMeta> {
        self.get(symbol).map(|b| &b.meta)
    }

    pub fn seed() -> Self {
        let bond = |symbol: &str, display_name: &'static str, issue, maturity| SecurityMeta {
            symbol: Symbol::new(symbol),
            display_name,
            sector: Sector::Finance,
            asset_class: AssetClass::Bond,
            listed_from: issue,
            retired_at: Some(maturity),
        };

        Self {
            bonds: vec![
                Bond {
                    meta: bond(
                        "UST10Y70",
                        "US Treasury 10yr, 1970 issue",
                        instant(1970, 2, 1, 0, 0, 0),
                        instant(1980, 2, 1, 0, 0, 0),
                    ),
                    kind: BondKind::Treasury,
                    rating: CreditRating::Aaa,
                    face_value_cents: 100_000,
                    coupon_rate: 0.072,
                    coupon_frequency_per_year: 2,
                    issue: instant(1970, 2, 1, 0, 0, 0),
                    maturity: instant(1980, 2, 1, 0, 0, 0),
                    callable_from: None,
                    tax_exempt: false,
                },
                Bond {
                    meta: bond(
                        "UST30Y82",
                        "US Treasury 30yr, 1982 issue",
                        instant(1982, 5, 15, 0, 0, 0),
                        instant(2012, 5, 15, 0, 0, 0),
                    ),
                    kind: BondKind::Treasury,
                    rating: CreditRating::Aaa,
                    face_value_cents: 100_000,
                    coupon_rate: 0.1375,
                    coupon_frequency_per_year: 2,
                    issue: instant(1982, 5, 15, 0, 0, 0),
                    maturity: instant(2012, 5, 15, 0, 0, 0),
                    callable_from: None,
                    tax_exempt: false,
                },
                Bond {
                    meta: bond(
                        "IBMCORP5",
                        "IBM Corp 10yr note",
                        instant(1995, 6, 1, 0, 0, 0),
                        instant(2005, 6, 1, 0, 0, 0),
                    ),
                    kind: BondKind::Corporate,
                    rating: CreditRating::Aaa,
                    face_value_cents: 100_000,
                    coupon_rate: 0.065,
                    coupon_frequency_per_year: 2,
                    issue: instant(1995, 6, 1, 0, 0, 0),
                    maturity: instant(2005, 6, 1, 0, 0, 0),
                    callable_from: Some(instant(2000, 6, 1, 0, 0, 0)),
                    tax_exempt: false,
                },
                Bond {
                    meta: bond(
                        "NYCMUNI9",
                        "New York City General Obligation bond",
                        instant(1990, 9, 1, 0, 0, 0),
                        instant(2010, 9, 1, 0, 0, 0),
                    ),
                    kind: BondKind::Municipal,
                    rating: CreditRating::A,
                    face_value_cents: 50_000,
                    coupon_rate: 0.048,
                    coupon_frequency_per_year: 2,
                    issue: instant(1990, 9, 1, 0, 0, 0),
                    maturity: instant(2010, 9, 1, 0, 0, 0),
                    callable_from: None,
                    tax_exempt: true,
                },
                Bond {
                    meta: bond(
                        "UST10Y20",
                        "US Treasury 10yr, 2020 issue",
                        instant(2020, 8, 15, 0, 0, 0),
                        instant(2030, 8, 15, 0, 0, 0),
                    ),
                    kind: BondKind::Treasury,
                    rating: CreditRating::Aaa,
                    face_value_cents: 100_000,
                    coupon_rate: 0.0125,
                    coupon_frequency_per_year: 2,
                    issue: instant(2020, 8, 15, 0, 0, 0),
                    maturity: instant(2030, 8, 15, 0, 0, 0),
                    callable_from: None,
                    tax_exempt: false,
                },
            ],
        }
    }
}
