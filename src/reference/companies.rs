//! Company roster: per-symbol identity, anchor price history, and dated dossiers (product, IP,
//! financials, employee snapshots) keyed by anchor year. Lookup returns the snapshot for the
//! largest key `<= current year` (§4.2).

use super::{Sector, SecurityMeta};
use crate::time::{instant, AssetClass, Instant, Symbol};
use chrono::Datelike;
use std::collections::BTreeMap;

/// A curated (date, price) milestone pinning the synthesized price path (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub at: Instant,
    pub price: f64,
}

/// A dated dossier entry: product line, notable IP, headline financials, employee count.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDossier {
    pub product: &'static str,
    pub notable_ip: &'static str,
    pub annual_revenue_musd: f64,
    pub employees: u64,
}

#[derive(Debug, Clone)]
pub struct Company {
    pub meta: SecurityMeta,
    pub anchors: Vec<Anchor>,
    pub dossier_by_year: BTreeMap<i32, CompanyDossier>,
    pub dividend_yield_by_year: BTreeMap<i32, f64>,
}

impl Company {
    /// The dossier in effect at `t`: the entry with the largest year `<= t`'s year.
    pub fn dossier_at(&self, t: Instant) -> Option<&CompanyDossier> {
        self.dossier_by_year
            .range(..=t.year())
            .next_back()
            .map(|(_, d)| d)
    }

    /// Annualised dividend yield in effect at `t`'s calendar year (0.0 if non-paying that year).
    pub fn dividend_yield_at(&self, t: Instant) -> f64 {
        self.dividend_yield_by_year
            .range(..=t.year())
            .next_back()
            .map(|(_, y)| *y)
            .unwrap_or(0.0)
    }
}

#[derive(Debug)]
pub struct CompanyCatalog {
    companies: Vec<Company>,
}

impl CompanyCatalog {
    pub fn get(&self, symbol: &Symbol) -> Option<&Company> {
        self.companies.iter().find(|c| &c.meta.symbol == symbol)
    }

    pub fn meta(&self, symbol: &Symbol) -> Option<&SecurityMeta> {
        self.get(symbol).map(|c| &c.meta)
    }

    pub fn all(&self) -> impl Iterator<Item = &Company> {
        self.companies.iter()
    }

    pub fn seed() -> Self {
        let epoch = instant(1970, 1, 2, 14, 30, 0);
        let never = None;

        let mut companies = Vec::new();

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("IBM"),
                display_name: "International Business Machines",
                sector: Sector::Technology,
                asset_class: AssetClass::Stock,
                listed_from: epoch,
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: epoch, price: 17.50 },
                Anchor { at: instant(1980, 1, 2, 14, 30, 0), price: 26.00 },
                Anchor { at: instant(1987, 10, 16, 21, 0, 0), price: 41.00 },
                Anchor { at: instant(1993, 1, 4, 14, 30, 0), price: 10.50 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 58.00 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 119.00 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 135.00 },
            ],
            dossier_by_year: BTreeMap::from([
                (1970, CompanyDossier { product: "Mainframes", notable_ip: "System/360", annual_revenue_musd: 7_500.0, employees: 269_000 }),
                (1993, CompanyDossier { product: "Hardware & Services", notable_ip: "RS/6000", annual_revenue_musd: 62_700.0, employees: 256_000 }),
                (2012, CompanyDossier { product: "Enterprise Software & Cloud", notable_ip: "Watson", annual_revenue_musd: 104_500.0, employees: 434_000 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(1970, 0.03), (2000, 0.02), (2012, 0.035)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("MSFT"),
                display_name: "Microsoft Corporation",
                sector: Sector::Technology,
                asset_class: AssetClass::Stock,
                listed_from: instant(1986, 3, 13, 14, 30, 0),
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: instant(1986, 3, 13, 14, 30, 0), price: 0.10 },
                Anchor { at: instant(1995, 8, 24, 14, 30, 0), price: 2.50 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 58.38 },
                Anchor { at: instant(2000, 12, 29, 21, 0, 0), price: 21.88 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 27.00 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 160.62 },
            ],
            dossier_by_year: BTreeMap::from([
                (1986, CompanyDossier { product: "MS-DOS & Windows", notable_ip: "Windows", annual_revenue_musd: 197.0, employees: 1_153 }),
                (1998, CompanyDossier { product: "Windows & Office", notable_ip: "Office Suite", annual_revenue_musd: 15_260.0, employees: 27_320 }),
                (2014, CompanyDossier { product: "Cloud & Productivity", notable_ip: "Azure", annual_revenue_musd: 86_830.0, employees: 128_000 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(2003, 0.01), (2014, 0.028)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("AAPL"),
                display_name: "Apple Inc.",
                sector: Sector::Technology,
                asset_class: AssetClass::Stock,
                listed_from: instant(1980, 12, 12, 14, 30, 0),
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: instant(1980, 12, 12, 14, 30, 0), price: 0.10 },
                Anchor { at: instant(1997, 8, 6, 14, 30, 0), price: 0.85 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 3.50 },
                Anchor { at: instant(2007, 1, 9, 19, 0, 0), price: 11.97 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 22.80 },
                Anchor { at: instant(2014, 6, 9, 14, 30, 0), price: 93.70 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 75.09 },
            ],
            dossier_by_year: BTreeMap::from([
                (1980, CompanyDossier { product: "Apple II / III", notable_ip: "Apple II", annual_revenue_musd: 117.0, employees: 1_000 }),
                (2001, CompanyDossier { product: "Macintosh & iPod", notable_ip: "iPod", annual_revenue_musd: 5_360.0, employees: 8_568 }),
                (2007, CompanyDossier { product: "iPhone", notable_ip: "iPhone", annual_revenue_musd: 24_580.0, employees: 21_600 }),
                (2014, CompanyDossier { product: "iPhone/iPad/Mac", notable_ip: "iOS ecosystem", annual_revenue_musd: 182_800.0, employees: 98_000 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(2012, 0.018), (2014, 0.021)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("AMZN"),
                display_name: "Amazon.com, Inc.",
                sector: Sector::ConsumerDiscretionary,
                asset_class: AssetClass::Stock,
                listed_from: instant(1997, 5, 15, 14, 30, 0),
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: instant(1997, 5, 15, 14, 30, 0), price: 1.96 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 89.38 },
                Anchor { at: instant(2001, 9, 28, 20, 0, 0), price: 5.97 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 80.30 },
                Anchor { at: instant(2017, 6, 16, 20, 0, 0), price: 968.00 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 1898.01 },
            ],
            dossier_by_year: BTreeMap::from([
                (1997, CompanyDossier { product: "Online bookstore", notable_ip: "1-Click ordering", annual_revenue_musd: 147.8, employees: 614 }),
                (2006, CompanyDossier { product: "E-commerce & AWS", notable_ip: "AWS", annual_revenue_musd: 10_711.0, employees: 17_000 }),
                (2017, CompanyDossier { product: "E-commerce, AWS, Whole Foods", notable_ip: "Alexa", annual_revenue_musd: 177_900.0, employees: 341_400 }),
            ]),
            dividend_yield_by_year: BTreeMap::new(),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("WFM"),
                display_name: "Whole Foods Market, Inc.",
                sector: Sector::ConsumerDiscretionary,
                asset_class: AssetClass::Stock,
                listed_from: instant(1992, 1, 23, 14, 30, 0),
                retired_at: Some(instant(2017, 8, 28, 20, 0, 0)),
            },
            anchors: vec![
                Anchor { at: instant(1992, 1, 23, 14, 30, 0), price: 1.25 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 13.00 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 13.60 },
                Anchor { at: instant(2013, 10, 1, 14, 30, 0), price: 65.00 },
                Anchor { at: instant(2017, 6, 15, 20, 0, 0), price: 33.06 },
            ],
            dossier_by_year: BTreeMap::from([
                (1992, CompanyDossier { product: "Natural foods grocer", notable_ip: "n/a", annual_revenue_musd: 92.0, employees: 2_350 }),
                (2013, CompanyDossier { product: "Natural & organic grocery", notable_ip: "365 Everyday Value", annual_revenue_musd: 12_917.0, employees: 73_200 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(2013, 0.012)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("ENRN"),
                display_name: "Enron Corporation",
                sector: Sector::Energy,
                asset_class: AssetClass::Stock,
                listed_from: epoch,
                retired_at: Some(instant(2001, 12, 2, 14, 30, 0)),
            },
            anchors: vec![
                Anchor { at: epoch, price: 5.00 },
                Anchor { at: instant(2000, 8, 23, 14, 30, 0), price: 90.56 },
                Anchor { at: instant(2001, 10, 16, 14, 30, 0), price: 33.84 },
                Anchor { at: instant(2001, 11, 28, 14, 30, 0), price: 0.61 },
            ],
            dossier_by_year: BTreeMap::from([
                (1985, CompanyDossier { product: "Natural gas pipelines", notable_ip: "n/a", annual_revenue_musd: 4_300.0, employees: 7_000 }),
                (2000, CompanyDossier { product: "Energy trading", notable_ip: "EnronOnline", annual_revenue_musd: 100_789.0, employees: 20_600 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(1990, 0.02)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("XOM"),
                display_name: "Exxon Mobil Corporation",
                sector: Sector::Energy,
                asset_class: AssetClass::Stock,
                listed_from: epoch,
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: epoch, price: 2.30 },
                Anchor { at: instant(1987, 10, 16, 21, 0, 0), price: 10.40 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 20.19 },
                Anchor { at: instant(2008, 7, 14, 14, 30, 0), price: 94.42 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 69.78 },
            ],
            dossier_by_year: BTreeMap::from([
                (1970, CompanyDossier { product: "Oil & gas", notable_ip: "n/a", annual_revenue_musd: 16_550.0, employees: 143_000 }),
                (2008, CompanyDossier { product: "Integrated oil & gas", notable_ip: "n/a", annual_revenue_musd: 477_400.0, employees: 79_900 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(1970, 0.045), (2000, 0.025), (2008, 0.018)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("JPM"),
                display_name: "JPMorgan Chase & Co.",
                sector: Sector::Finance,
                asset_class: AssetClass::Stock,
                listed_from: epoch,
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: epoch, price: 8.80 },
                Anchor { at: instant(1987, 10, 19, 21, 0, 0), price: 14.70 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 49.06 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 42.73 },
                Anchor { at: instant(2009, 3, 6, 14, 30, 0), price: 15.90 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 138.89 },
            ],
            dossier_by_year: BTreeMap::from([
                (1970, CompanyDossier { product: "Commercial banking", notable_ip: "n/a", annual_revenue_musd: 1_100.0, employees: 36_000 }),
                (2008, CompanyDossier { product: "Universal banking", notable_ip: "n/a", annual_revenue_musd: 67_300.0, employees: 224_000 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(1970, 0.04), (2009, 0.005), (2015, 0.027)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("PETS"),
                display_name: "Pets.com, Inc.",
                sector: Sector::ConsumerDiscretionary,
                asset_class: AssetClass::Stock,
                listed_from: instant(2000, 2, 11, 14, 30, 0),
                retired_at: Some(instant(2000, 11, 7, 14, 30, 0)),
            },
            anchors: vec![
                Anchor { at: instant(2000, 2, 11, 14, 30, 0), price: 11.00 },
                Anchor { at: instant(2000, 6, 1, 14, 30, 0), price: 3.00 },
                Anchor { at: instant(2000, 11, 6, 14, 30, 0), price: 0.19 },
            ],
            dossier_by_year: BTreeMap::from([(2000, CompanyDossier { product: "Online pet supplies", notable_ip: "Sock Puppet mascot", annual_revenue_musd: 5.8, employees: 230 })]),
            dividend_yield_by_year: BTreeMap::new(),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("GE"),
                display_name: "General Electric Company",
                sector: Sector::Industrials,
                asset_class: AssetClass::Stock,
                listed_from: epoch,
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: epoch, price: 1.30 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 50.85 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 25.00 },
                Anchor { at: instant(2009, 3, 6, 14, 30, 0), price: 6.66 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 11.17 },
            ],
            dossier_by_year: BTreeMap::from([
                (1970, CompanyDossier { product: "Diversified industrials", notable_ip: "n/a", annual_revenue_musd: 8_700.0, employees: 400_000 }),
                (2008, CompanyDossier { product: "Industrials & finance", notable_ip: "n/a", annual_revenue_musd: 182_500.0, employees: 323_000 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(1970, 0.04), (2000, 0.02), (2009, 0.01)]),
        });

        companies.push(Company {
            meta: SecurityMeta {
                symbol: Symbol::new("PFE"),
                display_name: "Pfizer Inc.",
                sector: Sector::Healthcare,
                asset_class: AssetClass::Stock,
                listed_from: epoch,
                retired_at: never,
            },
            anchors: vec![
                Anchor { at: epoch, price: 4.50 },
                Anchor { at: instant(2000, 1, 3, 14, 30, 0), price: 32.00 },
                Anchor { at: instant(2008, 9, 12, 20, 0, 0), price: 16.70 },
                Anchor { at: instant(2020, 1, 2, 14, 30, 0), price: 39.07 },
            ],
            dossier_by_year: BTreeMap::from([
                (1970, CompanyDossier { product: "Pharmaceuticals", notable_ip: "n/a", annual_revenue_musd: 850.0, employees: 39_000 }),
                (2020, CompanyDossier { product: "Pharmaceuticals & vaccines", notable_ip: "Comirnaty (2021+)", annual_revenue_musd: 41_900.0, employees: 88_300 }),
            ]),
            dividend_yield_by_year: BTreeMap::from([(1970, 0.03), (2000, 0.02), (2020, 0.039)]),
        });

        Self { companies }
    }
}
