//! Margin loans: drawing against a catalog [`Lender`](crate::reference::loans::Lender), monthly
//! interest accrual, the cure-window escalation path on a missed payment, and the credit-score
//! model that gates eligibility (§4.2, §4.7, §7 `CreditTooLow`/`LoanUnavailable`).

use crate::money::Money;
use crate::reference::loans::{CreditTier, Lender};
use crate::time::Instant;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LoanStatus {
    Current,
    Overdue,
    Escalated,
    PaidOff,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Loan {
    pub lender_id: &'static str,
    pub principal: Money,
    pub balance: Money,
    pub apr: f64,
    pub origination_fee: Money,
    pub drawn_at: Instant,
    pub due_at: Instant,
    pub status: LoanStatus,
    pub last_interest_accrual: Instant,
    pub missed_payment_since: Option<Instant>,
}

impl Loan {
    pub fn draw(lender: &Lender, principal: Money, at: Instant) -> Self {
        let origination_fee = principal.scale(lender.origination_fee_bps as f64 / 10_000.0);
        Self {
            lender_id: lender.id,
            principal,
            balance: principal + origination_fee,
            apr: lender.base_apr,
            origination_fee,
            drawn_at: at,
            due_at: at + chrono::Duration::days(lender.max_term_days),
            status: LoanStatus::Current,
            last_interest_accrual: at,
            missed_payment_since: None,
        }
    }

    /// Accrues one month of simple interest onto the outstanding balance (§4.7 "Loan interest —
    /// monthly, added to loan balance").
    pub fn accrue_monthly_interest(&mut self, at: Instant) -> Money {
        let interest = self.balance.scale(self.apr / 12.0);
        self.balance += interest;
        self.last_interest_accrual = at;
        interest
    }

    /// A payment due at `due_at` that has not been made by `at` moves the loan to `Overdue` and
    /// starts the cure-window clock.
    pub fn mark_overdue_if_due(&mut self, at: Instant) {
        if self.status == LoanStatus::Current && at > self.due_at && self.missed_payment_since.is_none() {
            self.status = LoanStatus::Overdue;
            self.missed_payment_since = Some(at);
        }
    }

    /// Applies the lender's penalty once the cure window elapses: a flat late fee and an APR
    /// bump, escalating to forced liquidation eligibility after `forced_liquidation_after_days`.
    pub fn apply_penalty_if_cure_expired(&mut self, lender: &Lender, at: Instant) -> Option<(Money, bool)> {
        let missed_since = self.missed_payment_since?;
        let days_overdue = (at - missed_since).num_days();
        if days_overdue < lender.penalty.cure_window_days {
            return None;
        }
        if self.status != LoanStatus::Escalated {
            self.status = LoanStatus::Escalated;
            self.balance += Money::cents(lender.penalty.late_fee_cents);
            self.apr += lender.penalty.penalty_apr_bump;
        }
        let force_liquidation = days_overdue >= lender.penalty.forced_liquidation_after_days;
        Some((Money::cents(lender.penalty.late_fee_cents), force_liquidation))
    }

    pub fn pay(&mut self, amount: Money) {
        self.balance -= amount;
        if self.balance.as_cents() <= 0 {
            self.balance = Money::ZERO;
            self.status = LoanStatus::PaidOff;
            self.missed_payment_since = None;
        } else if self.status == LoanStatus::Overdue || self.status == LoanStatus::Escalated {
            self.status = LoanStatus::Current;
            self.missed_payment_since = None;
        }
    }
}

/// Maps a numeric credit score (300-850, FICO-like scale) to a [`CreditTier`] used to gate
/// lender eligibility (§4.2 `min_tier`).
pub fn tier_for_score(score: u32) -> CreditTier {
    match score {
        0..=579 => CreditTier::Subprime,
        580..=669 => CreditTier::Standard,
        670..=739 => CreditTier::Prime,
        _ => CreditTier::SuperPrime,
    }
}

/// Credit-score deltas from loan behavior: a missed payment costs more than an on-time payment
/// gains, mirroring real scoring asymmetry.
pub fn score_delta_for_payment(on_time: bool) -> i32 {
    if on_time {
        2
    } else {
        -35
    }
}

pub fn apply_score_delta(score: u32, delta: i32) -> u32 {
    (score as i32 + delta).clamp(300, 850) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant;

    fn lender() -> Lender {
        Lender {
            id: "test_lender",
            display_name: "Test Lender",
            min_tier: CreditTier::Standard,
            base_apr: 0.08,
            origination_fee_bps: 100,
            max_term_days: 90,
            available_from: instant(1970, 1, 1, 0, 0, 0),
            penalty: crate::reference::loans::PenaltyRule {
                cure_window_days: 5,
                late_fee_cents: 5_000,
                penalty_apr_bump: 0.05,
                forced_liquidation_after_days: 30,
            },
        }
    }

    #[test]
    fn draw_includes_origination_fee_in_balance() {
        let loan = Loan::draw(&lender(), Money::cents(100_000), instant(2020, 1, 1, 0, 0, 0));
        assert_eq!(loan.balance, Money::cents(101_000));
    }

    #[test]
    fn overdue_then_cure_expiry_escalates_with_penalty() {
        let lender = lender();
        let mut loan = Loan::draw(&lender, Money::cents(100_000), instant(2020, 1, 1, 0, 0, 0));
        loan.mark_overdue_if_due(loan.due_at + chrono::Duration::days(1));
        let result = loan.apply_penalty_if_cure_expired(&lender, loan.due_at + chrono::Duration::days(1));
        assert!(result.is_none(), "still within cure window");

        let result = loan.apply_penalty_if_cure_expired(&lender, loan.due_at + chrono::Duration::days(10));
        assert!(result.is_some());
        assert_eq!(loan.status, LoanStatus::Escalated);
    }

    #[test]
    fn credit_tiers_map_score_ranges() {
        assert_eq!(tier_for_score(550), CreditTier::Subprime);
        assert_eq!(tier_for_score(650), CreditTier::Standard);
        assert_eq!(tier_for_score(700), CreditTier::Prime);
        assert_eq!(tier_for_score(800), CreditTier::SuperPrime);
    }

    #[test]
    fn score_delta_is_clamped() {
        assert_eq!(apply_score_delta(310, -50), 300);
        assert_eq!(apply_score_delta(845, 20), 850);
    }
}
