//! Corporate-Event Processor (§4.6): replays dated splits, mergers, acquisitions, bankruptcies,
//! IPOs, and delistings into the account and share-availability state, exactly once per event id.

use crate::account::Account;
use crate::availability::ShareAvailabilityBook;
use crate::engine::state::EngineState;
use crate::reference::corporate_events::{CorporateEvent, CorporateEventCatalog, CorporateEventKind};
use crate::time::Instant;
use tracing::info;

/// Applies every catalog event with `effective_instant <= up_to` not already in
/// `state.processed_corporate_events`, in chronological order. Safe to call repeatedly with the
/// same or a later `up_to` — already-applied events are skipped.
pub fn apply_due(
    state: &mut EngineState,
    account: &mut Account,
    availability: &mut ShareAvailabilityBook,
    catalog: &CorporateEventCatalog,
    up_to: Instant,
) {
    let mut due: Vec<&CorporateEvent> = catalog.all().iter().filter(|e| e.effective_instant <= up_to).collect();
    due.sort_by_key(|e| e.effective_instant);
    for event in due {
        if state.has_processed(event.id) {
            continue;
        }
        apply_one(account, availability, event);
        state.mark_processed(event.id);
        info!(event_id = event.id, symbol = %event.symbol, "applied corporate event");
    }
}

fn apply_one(account: &mut Account, availability: &mut ShareAvailabilityBook, event: &CorporateEvent) {
    match &event.kind {
        CorporateEventKind::Split { ratio } => {
            availability.apply_split(&event.symbol, *ratio);
            account.apply_split(&event.symbol, *ratio);
        }
        CorporateEventKind::AcquisitionCash { price_per_share, .. } => {
            account.liquidate_position(event.symbol.clone(), *price_per_share, event.effective_instant, "cash acquisition");
            availability.retire(&event.symbol);
        }
        CorporateEventKind::AcquisitionStock { acquirer, ratio } => {
            account.convert_position(&event.symbol, acquirer.clone(), *ratio, event.effective_instant);
            availability.retire(&event.symbol);
        }
        CorporateEventKind::Bankruptcy => {
            account.liquidate_position(event.symbol.clone(), 0.0, event.effective_instant, "bankruptcy");
            availability.retire(&event.symbol);
        }
        CorporateEventKind::GoingPrivate { price_per_share } => {
            account.liquidate_position(event.symbol.clone(), *price_per_share, event.effective_instant, "going private");
            availability.retire(&event.symbol);
        }
        CorporateEventKind::Delisting => {
            account.liquidate_position(event.symbol.clone(), 0.0, event.effective_instant, "delisting");
            availability.retire(&event.symbol);
        }
        CorporateEventKind::Ipo => {
            // The symbol becomes tradable from `listed_from` in the reference catalog; no account
            // or availability mutation is needed here.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::time::{instant, Symbol};

    fn catalog() -> CorporateEventCatalog {
        CorporateEventCatalog::seed()
    }

    #[test]
    fn split_event_scales_position_and_availability() {
        let mut state = EngineState::new(instant(2014, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(1_000_000_00));
        let mut availability = ShareAvailabilityBook::new();
        let aapl = Symbol::new("AAPL");
        availability.seed(aapl.clone(), 1_000_000);
        account.record_buy(aapl.clone(), 10, 100.0, Money::ZERO, instant(2014, 1, 1, 0, 0, 0));

        apply_due(&mut state, &mut account, &mut availability, &catalog(), instant(2014, 12, 31, 0, 0, 0));

        assert_eq!(account.shares_owned(&aapl), 70);
        assert_eq!(availability.get(&aapl).unwrap().total_outstanding, 7_000_000);
        assert!(state.has_processed("aapl_split_2014"));
    }

    #[test]
    fn cash_acquisition_liquidates_position_and_retires_symbol() {
        let mut state = EngineState::new(instant(2017, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(0));
        let mut availability = ShareAvailabilityBook::new();
        let wfm = Symbol::new("WFM");
        availability.seed(wfm.clone(), 1_000_000);
        account.record_buy(wfm.clone(), 100, 30.0, Money::ZERO, instant(2017, 1, 1, 0, 0, 0));

        apply_due(&mut state, &mut account, &mut availability, &catalog(), instant(2017, 12, 31, 0, 0, 0));

        assert_eq!(account.shares_owned(&wfm), 0);
        assert!(account.cash.as_cents() > 0);
        assert!(availability.get(&wfm).is_none());
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut state = EngineState::new(instant(2014, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(1_000_000_00));
        let mut availability = ShareAvailabilityBook::new();
        let aapl = Symbol::new("AAPL");
        availability.seed(aapl.clone(), 1_000_000);
        account.record_buy(aapl.clone(), 10, 100.0, Money::ZERO, instant(2014, 1, 1, 0, 0, 0));

        let up_to = instant(2014, 12, 31, 0, 0, 0);
        apply_due(&mut state, &mut account, &mut availability, &catalog(), up_to);
        let shares_after_first = account.shares_owned(&aapl);
        apply_due(&mut state, &mut account, &mut availability, &catalog(), up_to);
        assert_eq!(account.shares_owned(&aapl), shares_after_first);
    }
}
