//! Data-retention pruning (§5): on a configurable schedule (default monthly,
//! `EngineConfig::retention_schedule_days`), trims the account's append-only transaction log,
//! discarding fully-settled history while preserving business-critical records — the account's
//! starting transaction, unsettled taxes, and anything tied to a loan that hasn't been paid off —
//! regardless of age.

use crate::account::loan::LoanStatus;
use crate::account::transaction::{Transaction, TransactionKind};
use crate::account::Account;
use crate::engine::state::EngineState;
use crate::time::Instant;
use chrono::Duration;

fn is_business_critical(account: &Account, is_first: bool, tx: &Transaction) -> bool {
    if is_first {
        return true;
    }
    match tx.kind {
        TransactionKind::Tax => true,
        TransactionKind::LoanDraw | TransactionKind::LoanPayment | TransactionKind::LoanPenalty => {
            account.loans.iter().any(|l| l.status != LoanStatus::PaidOff)
        }
        _ => false,
    }
}

/// Drops transactions older than `retention_window_days` unless they're business-critical.
/// Idempotent: pruning twice with the same `now` removes nothing the second time.
pub fn prune_transactions(account: &mut Account, now: Instant, retention_window_days: i64) {
    let cutoff = now - Duration::days(retention_window_days);
    let kept: Vec<Transaction> = account
        .transactions
        .iter()
        .enumerate()
        .filter(|(idx, tx)| tx.at >= cutoff || is_business_critical(account, *idx == 0, tx))
        .map(|(_, tx)| tx.clone())
        .collect();
    account.transactions = kept;
}

/// Runs pruning if the configured schedule has elapsed since the last run, updating the cursor.
/// A no-op (and leaves the cursor untouched) if the schedule hasn't elapsed yet.
pub fn run_if_due(state: &mut EngineState, account: &mut Account, now: Instant, schedule_days: i64, window_days: i64) {
    let due = state
        .cursors
        .last_retention_run
        .map(|last| now - last >= Duration::days(schedule_days))
        .unwrap_or(true);
    if !due {
        return;
    }
    prune_transactions(account, now, window_days);
    state.cursors.last_retention_run = Some(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::loan::Loan;
    use crate::money::Money;
    use crate::reference::loans::LenderCatalog;
    use crate::time::instant;

    fn tx(kind: TransactionKind, at: Instant) -> Transaction {
        Transaction::new(at, kind, None, None, None, Money::ZERO, Money::ZERO, Money::ZERO, "test")
    }

    #[test]
    fn prunes_stale_routine_transactions_but_keeps_the_first() {
        let mut account = Account::new(Money::cents(10_000_00));
        account.transactions.push(tx(TransactionKind::Fee, instant(2000, 1, 1, 0, 0, 0)));
        account.transactions.push(tx(TransactionKind::Fee, instant(2020, 1, 1, 0, 0, 0)));
        prune_transactions(&mut account, instant(2020, 2, 1, 0, 0, 0), 30);
        assert_eq!(account.transactions.len(), 2);
        assert_eq!(account.transactions[0].at, instant(2000, 1, 1, 0, 0, 0));
    }

    #[test]
    fn drops_old_routine_transaction_once_window_passes() {
        let mut account = Account::new(Money::cents(10_000_00));
        account.transactions.push(tx(TransactionKind::Fee, instant(2000, 1, 1, 0, 0, 0)));
        account.transactions.push(tx(TransactionKind::Fee, instant(2000, 6, 1, 0, 0, 0)));
        account.transactions.push(tx(TransactionKind::Fee, instant(2020, 1, 1, 0, 0, 0)));
        prune_transactions(&mut account, instant(2020, 2, 1, 0, 0, 0), 30);
        assert_eq!(account.transactions.len(), 2);
        assert!(account.transactions.iter().any(|t| t.at == instant(2000, 1, 1, 0, 0, 0)));
        assert!(account.transactions.iter().any(|t| t.at == instant(2020, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn keeps_loan_transactions_while_loan_is_open() {
        let mut account = Account::new(Money::cents(10_000_00));
        account.transactions.push(tx(TransactionKind::Fee, instant(1999, 1, 1, 0, 0, 0)));
        account.transactions.push(tx(TransactionKind::LoanDraw, instant(2000, 1, 1, 0, 0, 0)));
        let lenders = LenderCatalog::seed();
        let lender = lenders.all().first().expect("at least one seeded lender");
        account.loans.push(Loan::draw(lender, Money::cents(1_000_00), instant(2000, 1, 1, 0, 0, 0)));
        prune_transactions(&mut account, instant(2020, 1, 1, 0, 0, 0), 30);
        assert!(account.transactions.iter().any(|t| t.kind == TransactionKind::LoanDraw));
    }

    #[test]
    fn run_if_due_is_idempotent_within_schedule() {
        let mut state = EngineState::new(instant(2020, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(10_000_00));
        account.transactions.push(tx(TransactionKind::Fee, instant(2019, 1, 1, 0, 0, 0)));
        run_if_due(&mut state, &mut account, instant(2020, 1, 1, 0, 0, 0), 30, 30);
        assert!(account.transactions.is_empty());
        account.transactions.push(tx(TransactionKind::Fee, instant(2018, 1, 1, 0, 0, 0)));
        run_if_due(&mut state, &mut account, instant(2020, 1, 5, 0, 0, 0), 30, 30);
        assert_eq!(account.transactions.len(), 1);
    }
}
