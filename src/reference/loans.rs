//! The catalog of margin lenders available to an account, keyed by credit tier (§4.2, §6 margin
//! rules).

use crate::time::{instant, Instant};
use serde::{Deserialize, Serialize};

/// Credit tier a borrower must meet or exceed to draw from a given [`Lender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum CreditTier {
    Subprime,
    Standard,
    Prime,
    SuperPrime,
}

/// What happens to an overdue loan once its cure window elapses (§6.4).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PenaltyRule {
    pub cure_window_days: i64,
    pub late_fee_cents: i64,
    pub penalty_apr_bump: f64,
    pub forced_liquidation_after_days: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Lender {
    pub id: &'static str,
    pub display_name: &'static str,
    pub min_tier: CreditTier,
    pub base_apr: f64,
    pub origination_fee_bps: u32,
    pub max_term_days: i64,
    pub available_from: Instant,
    pub penalty: PenaltyRule,
}

#[derive(Debug)]
pub struct LenderCatalog {
    lenders: Vec<Lender>,
}

impl LenderCatalog {
    pub fn all(&self) -> &[Lender] {
        &self.lenders
    }

    pub fn get(&self, id: &str) -> Option<&Lender> {
        self.lenders.iter().find(|l| l.id == id)
    }

    /// Lenders a borrower at `tier`, at `t`, is eligible to draw from.
    pub fn eligible(&self, tier: CreditTier, t: Instant) -> impl Iterator<Item = &Lender> {
        self.lenders
            .iter()
            .filter(move |l| l.min_tier <= tier && l.available_from <= t)
    }

    pub fn seed() -> Self {
        Self {
            lenders: vec![
                Lender {
                    id: "corner_street_credit",
                    display_name: "Corner Street Credit Union",
                    min_tier: CreditTier::Subprime,
                    base_apr: 0.14,
                    origination_fee_bps: 150,
                    max_term_days: 90,
                    available_from: instant(1970, 1, 1, 0, 0, 0),
                    penalty: PenaltyRule {
                        cure_window_days: 5,
                        late_fee_cents: 2_500,
                        penalty_apr_bump: 0.06,
                        forced_liquidation_after_days: 30,
                    },
                },
                Lender {
                    id: "continental_margin_trust",
                    display_name: "Continental Margin Trust",
                    min_tier: CreditTier::Standard,
                    base_apr: 0.085,
                    origination_fee_bps: 75,
                    max_term_days: 180,
                    available_from: instant(1970, 1, 1, 0, 0, 0),
                    penalty: PenaltyRule {
                        cure_window_days: 7,
                        late_fee_cents: 5_000,
                        penalty_apr_bump: 0.04,
                        forced_liquidation_after_days: 45,
                    },
                },
                Lender {
                    id: "harbor_prime_lending",
                    display_name: "Harbor Prime Lending",
                    min_tier: CreditTier::Prime,
                    base_apr: 0.055,
                    origination_fee_bps: 35,
                    max_term_days: 365,
                    available_from: instant(1975, 1, 1, 0, 0, 0),
                    penalty: PenaltyRule {
                        cure_window_days: 10,
                        late_fee_cents: 7_500,
                        penalty_apr_bump: 0.025,
                        forced_liquidation_after_days: 60,
                    },
                },
                Lender {
                    id: "meridian_superprime_capital",
                    display_name: "Meridian SuperPrime Capital",
                    min_tier: CreditTier::SuperPrime,
                    base_apr: 0.035,
                    origination_fee_bps: 15,
                    max_term_days: 365,
                    available_from: instant(1980, 1, 1, 0, 0, 0),
                    penalty: PenaltyRule {
                        cure_window_days: 14,
                        late_fee_cents: 10_000,
                        penalty_apr_bump: 0.015,
                        forced_liquidation_after_days: 90,
                    },
                },
            ],
        }
    }
}
