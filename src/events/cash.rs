//! Cash-Event Scheduler (§4.7): quarterly dividends, semi-annual bond coupons and maturities,
//! daily index expense-ratio drag, monthly account fees, and monthly loan/margin interest.
//! Ordering within a tick: corporate events, then dividends, then coupons, then fees, then
//! interest — callers are expected to run [`crate::events::corporate::apply_due`] first.

use crate::account::loan::{apply_score_delta, score_delta_for_payment, LoanStatus};
use crate::account::tax::{tax_on_bond_interest, withhold_dividend};
use crate::account::Account;
use crate::availability::ShareAvailabilityBook;
use crate::config::EngineConfig;
use crate::engine::state::EngineState;
use crate::money::Money;
use crate::price::PriceEngine;
use crate::reference::ReferenceData;
use crate::time::{Instant, Symbol};
use chrono::Months;
use tracing::{info, warn};

/// Cap on how many missed periods a single catch-up call will replay for one symbol, so a
/// long-idle save can't spin through thousands of quarters in one tick.
const MAX_CATCHUP_PERIODS: u32 = 40;

const MONTHLY_ACCOUNT_FEE_CENTS: i64 = 500;

/// Runs every due cash event category in spec order, advancing `state.cursors` as it goes.
#[allow(clippy::too_many_arguments)]
pub fn run_all(
    state: &mut EngineState,
    account: &mut Account,
    availability: &mut ShareAvailabilityBook,
    reference: &ReferenceData,
    prices: &PriceEngine,
    config: &EngineConfig,
    up_to: Instant,
) {
    run_dividends(state, account, reference, prices, up_to);
    run_bond_coupons(state, account, reference, up_to);
    run_bond_maturities(account, reference, up_to);
    run_index_expense(state, account, reference, prices, up_to);
    run_monthly_fees(state, account, up_to);
    run_loan_interest(state, account, reference, prices, config, up_to);
    run_margin_interest(state, account, up_to);
    run_buyback(state, availability, reference, prices, config, up_to);
    run_issuance(state, availability, reference, prices, config, up_to);
}

/// Market-wide sentiment (-1..+1): today's average cross-sectional return (normalized against a
/// typical 1% move) plus any active crash scenarios' sentiment shift (§4.5's `market_sentiment`
/// gate for buyback/issuance, reusing the same price samples the Derived Views market index
/// already draws on rather than re-deriving a separate sentiment series.
fn market_sentiment(reference: &ReferenceData, prices: &PriceEngine, t: Instant) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for company in reference.companies.all() {
        if !company.meta.is_listed_at(t) {
            continue;
        }
        if let Ok(sample) = prices.price(&company.meta.symbol, t) {
            sum += sample.change_pct_vs_prior_day;
            count += 1;
        }
    }
    let momentum = if count == 0 { 0.0 } else { (sum / count as f64) / 0.01 };
    (momentum + reference.crashes.aggregate_sentiment(t)).clamp(-1.0, 1.0)
}

/// Monthly buyback cycle, gated on `market_sentiment > 0.3` (§4.5).
fn run_buyback(
    state: &mut EngineState,
    availability: &mut ShareAvailabilityBook,
    reference: &ReferenceData,
    prices: &PriceEngine,
    config: &EngineConfig,
    up_to: Instant,
) {
    let due = state
        .cursors
        .last_buyback_instant
        .map(|l| next_month(l) <= up_to)
        .unwrap_or(true);
    if !due {
        return;
    }
    let sentiment = market_sentiment(reference, prices, up_to);
    availability.run_buyback_cycle(config.global_seed, up_to, sentiment);
    state.cursors.last_buyback_instant = Some(up_to);
}

/// Quarterly issuance cycle (§4.5).
fn run_issuance(
    state: &mut EngineState,
    availability: &mut ShareAvailabilityBook,
    reference: &ReferenceData,
    prices: &PriceEngine,
    config: &EngineConfig,
    up_to: Instant,
) {
    let due = state
        .cursors
        .last_issuance_instant
        .map(|l| next_quarter(l) <= up_to)
        .unwrap_or(true);
    if !due {
        return;
    }
    let sentiment = market_sentiment(reference, prices, up_to);
    availability.run_issuance_cycle(config.global_seed, up_to, sentiment);
    state.cursors.last_issuance_instant = Some(up_to);
}

fn next_quarter(from: Instant) -> Instant {
    from.checked_add_months(Months::new(3)).unwrap_or(from)
}

fn next_half_year(from: Instant) -> Instant {
    from.checked_add_months(Months::new(6)).unwrap_or(from)
}

fn next_month(from: Instant) -> Instant {
    from.checked_add_months(Months::new(1)).unwrap_or(from)
}

/// Quarterly dividends: `company.dividend_yield_at(t) / 4 * position_value`, withheld at 15% and
/// deposited net (§4.7, §6).
fn run_dividends(state: &mut EngineState, account: &mut Account, reference: &ReferenceData, prices: &PriceEngine, up_to: Instant) {
    let symbols: Vec<_> = account.long_symbols().collect();
    for symbol in symbols {
        let Some(company) = reference.companies.get(&symbol) else { continue };
        let shares = account.shares_owned(&symbol);
        if shares <= 0 {
            continue;
        }
        let mut cursor = *state
            .cursors
            .last_dividend_quarter
            .get(symbol.as_str())
            .unwrap_or(&company.meta.listed_from);
        let mut periods = 0;
        while periods < MAX_CATCHUP_PERIODS {
            let due_at = next_quarter(cursor);
            if due_at > up_to {
                break;
            }
            let yield_annual = company.dividend_yield_at(due_at);
            if yield_annual > 0.0 {
                let Ok(sample) = prices.price(&symbol, due_at) else {
                    warn!(symbol = %symbol, "skipping dividend: price unavailable");
                    cursor = due_at;
                    periods += 1;
                    continue;
                };
                let position_value = Money::from_dollars_f64(shares as f64 * sample.price);
                let gross = position_value.scale(yield_annual / 4.0);
                let (net, tax) = withhold_dividend(gross);
                account.record_dividend(symbol.clone(), net, tax, due_at);
                info!(symbol = %symbol, ?net, "dividend paid");
            }
            cursor = due_at;
            periods += 1;
        }
        state.cursors.last_dividend_quarter.insert(symbol.as_str().to_string(), cursor);
    }
}

/// Semi-annual bond coupons: `face_value * coupon_rate / 2`, taxed per bond kind (§4.7, §6).
fn run_bond_coupons(state: &mut EngineState, account: &mut Account, reference: &ReferenceData, up_to: Instant) {
    let symbols: Vec<_> = account.bond_symbols().collect();
    for symbol in symbols {
        let Some(bond) = reference.bonds.get(&symbol) else { continue };
        let units = account.bonds_held(&symbol);
        if units == 0 {
            continue;
        }
        let mut cursor = *state.cursors.last_coupon_period.get(symbol.as_str()).unwrap_or(&bond.issue);
        let mut periods = 0;
        while periods < MAX_CATCHUP_PERIODS {
            let due_at = next_half_year(cursor);
            if due_at > up_to || due_at > bond.maturity {
                break;
            }
            let gross = Money::cents(bond.face_value_cents).scale(bond.coupon_rate / 2.0).scale(units as f64);
            let (net, tax) = tax_on_bond_interest(gross, bond.kind, bond.tax_exempt);
            account.record_bond_coupon(symbol.clone(), net, tax, due_at);
            cursor = due_at;
            periods += 1;
        }
        state.cursors.last_coupon_period.insert(symbol.as_str().to_string(), cursor);
    }
}

/// Matured bonds refund face value and remove the holding (§4.7).
fn run_bond_maturities(account: &mut Account, reference: &ReferenceData, up_to: Instant) {
    let symbols: Vec<_> = account.bond_symbols().collect();
    for symbol in symbols {
        let Some(bond) = reference.bonds.get(&symbol) else { continue };
        let units = account.bonds_held(&symbol);
        if units == 0 || bond.maturity > up_to {
            continue;
        }
        let face_value = Money::cents(bond.face_value_cents).scale(units as f64);
        account.record_bond_maturity(symbol, face_value, bond.maturity);
    }
}

/// Index funds accrue their expense ratio daily, deducted directly from cash as a drag on the
/// holder rather than the fund's quoted price (§4.7).
fn run_index_expense(state: &mut EngineState, account: &mut Account, reference: &ReferenceData, prices: &PriceEngine, up_to: Instant) {
    let symbols: Vec<_> = account.long_symbols().collect();
    for symbol in symbols {
        let Some(fund) = reference.indices.get(&symbol) else { continue };
        let shares = account.shares_owned(&symbol);
        if shares <= 0 {
            continue;
        }
        let Ok(sample) = prices.price(&symbol, up_to) else { continue };
        let last = state.cursors.last_dividend_quarter.get(&format!("idx:{}", symbol.as_str())).copied();
        let days = last.map(|l| (up_to - l).num_days().max(0)).unwrap_or(1).min(MAX_CATCHUP_PERIODS as i64 * 30);
        if days <= 0 {
            continue;
        }
        let daily_rate = fund.expense_ratio / 365.0;
        let position_value = Money::from_dollars_f64(shares as f64 * sample.price);
        let drag = position_value.scale(daily_rate * days as f64);
        account.cash -= drag;
        state.cursors.last_dividend_quarter.insert(format!("idx:{}", symbol.as_str()), up_to);
    }
}

fn run_monthly_fees(state: &mut EngineState, account: &mut Account, up_to: Instant) {
    let mut cursor = state.cursors.last_monthly_fee_instant.unwrap_or(up_to);
    if state.cursors.last_monthly_fee_instant.is_none() {
        state.cursors.last_monthly_fee_instant = Some(up_to);
        return;
    }
    let mut periods = 0;
    while periods < MAX_CATCHUP_PERIODS {
        let due_at = next_month(cursor);
        if due_at > up_to {
            break;
        }
        account.cash -= Money::cents(MONTHLY_ACCOUNT_FEE_CENTS);
        account.push_fee_transaction(Money::cents(MONTHLY_ACCOUNT_FEE_CENTS), due_at);
        cursor = due_at;
        periods += 1;
    }
    state.cursors.last_monthly_fee_instant = Some(cursor);
}

/// Monthly loan interest, overdue/cure-window escalation, credit-score updates, and the forced
/// sale of collateral once a loan's cure window lapses.
fn run_loan_interest(
    state: &mut EngineState,
    account: &mut Account,
    reference: &ReferenceData,
    prices: &PriceEngine,
    config: &EngineConfig,
    up_to: Instant,
) {
    let due = state
        .cursors
        .last_loan_interest_instant
        .map(|l| next_month(l) <= up_to)
        .unwrap_or(true);
    if !due {
        return;
    }
    for i in 0..account.loans.len() {
        if account.loans[i].status == LoanStatus::PaidOff {
            continue;
        }
        account.loans[i].accrue_monthly_interest(up_to);
        account.loans[i].mark_overdue_if_due(up_to);
        let Some(lender) = reference.lenders.get(account.loans[i].lender_id) else {
            let _ = config.loan_cure_window_days_default;
            continue;
        };
        let Some((_, force_liquidation)) = account.loans[i].apply_penalty_if_cure_expired(lender, up_to) else {
            continue;
        };
        account.credit_score = apply_score_delta(account.credit_score, score_delta_for_payment(false));
        if !force_liquidation {
            continue;
        }
        let outstanding = account.loans[i].balance;
        match largest_non_index_holding(account, reference, prices, up_to) {
            Some((symbol, price)) => {
                let txn = account
                    .liquidate_position(symbol.clone(), price, up_to, format!("forced liquidation for {} loan", lender.display_name))
                    .expect("largest_non_index_holding only returns symbols the account holds");
                let payment = txn.cash_delta.min(outstanding);
                account.pay_loan(i, payment, up_to);
                warn!(lender = lender.display_name, symbol = %symbol, "forced-liquidated position after cure window expired");
            }
            None => {
                warn!(lender = lender.display_name, "loan eligible for forced liquidation but account holds no non-index position to sell");
            }
        }
    }
    state.cursors.last_loan_interest_instant = Some(up_to);
}

/// The account's largest non-index long holding by current market value, for forced liquidation.
/// Index funds are excluded so a forced sale doesn't unwind a passive core holding.
fn largest_non_index_holding(account: &Account, reference: &ReferenceData, prices: &PriceEngine, at: Instant) -> Option<(Symbol, f64)> {
    account
        .long_symbols()
        .filter(|symbol| reference.indices.get(symbol).is_none())
        .filter_map(|symbol| {
            let shares = account.shares_owned(&symbol);
            if shares <= 0 {
                return None;
            }
            let sample = prices.price(&symbol, at).ok()?;
            Some((symbol, sample.price, shares as f64 * sample.price))
        })
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(symbol, price, _)| (symbol, price))
}

/// Monthly interest on drawn margin balance (distinct from a catalog loan).
fn run_margin_interest(state: &mut EngineState, account: &mut Account, up_to: Instant) {
    const MARGIN_APR: f64 = 0.09;
    let due = state
        .cursors
        .last_margin_interest_instant
        .map(|l| next_month(l) <= up_to)
        .unwrap_or(true);
    if !due {
        return;
    }
    if account.margin_state.margin_drawn.as_cents() != 0 {
        let interest = account.margin_state.margin_drawn.scale(MARGIN_APR / 12.0);
        account.margin_state.margin_drawn += interest;
        account.cash -= interest;
        account.push_margin_interest_transaction(interest, up_to);
    }
    state.cursors.last_margin_interest_instant = Some(up_to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;
    use crate::time::{instant, Symbol};
    use std::sync::Arc;

    #[test]
    fn dividend_catch_up_is_capped_at_max_periods() {
        let reference = ReferenceData::load();
        let prices = PriceEngine::new(Arc::new(ReferenceData::load()), 7);
        let config = EngineConfig::default();
        let mut state = EngineState::new(instant(1970, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(1_000_000_00));
        let mut availability = ShareAvailabilityBook::new();
        let ibm = Symbol::new("IBM");
        account.record_buy(ibm.clone(), 10, 100.0, Money::ZERO, instant(1970, 1, 1, 0, 0, 0));

        run_all(&mut state, &mut account, &mut availability, &reference, &prices, &config, instant(2020, 1, 1, 0, 0, 0));

        let periods = *state.cursors.last_dividend_quarter.get("IBM").unwrap();
        assert!(periods <= instant(2020, 1, 1, 0, 0, 0));
    }

    #[test]
    fn monthly_fee_charges_once_per_month() {
        let reference = ReferenceData::load();
        let prices = PriceEngine::new(Arc::new(ReferenceData::load()), 7);
        let config = EngineConfig::default();
        let mut state = EngineState::new(instant(2020, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(1_000_00));
        let mut availability = ShareAvailabilityBook::new();
        run_all(&mut state, &mut account, &mut availability, &reference, &prices, &config, instant(2020, 1, 1, 0, 0, 0));
        let cash_after_first = account.cash;
        run_all(&mut state, &mut account, &mut availability, &reference, &prices, &config, instant(2020, 2, 5, 0, 0, 0));
        assert_eq!(account.cash, cash_after_first - Money::cents(MONTHLY_ACCOUNT_FEE_CENTS));
    }

    #[test]
    fn buyback_cycle_runs_monthly_and_respects_sentiment_gate() {
        let reference = ReferenceData::load();
        let prices = PriceEngine::new(Arc::new(ReferenceData::load()), 7);
        let config = EngineConfig::default();
        let mut state = EngineState::new(instant(2020, 1, 1, 0, 0, 0));
        let mut account = Account::new(Money::cents(1_000_00));
        let mut availability = ShareAvailabilityBook::new();
        availability.seed(Symbol::new("IBM"), 1_000_000);
        run_all(&mut state, &mut account, &mut availability, &reference, &prices, &config, instant(2020, 1, 1, 0, 0, 0));
        assert!(state.cursors.last_buyback_instant.is_some());
        assert!(state.cursors.last_issuance_instant.is_some());
        let entry = availability.get(&Symbol::new("IBM")).unwrap();
        assert!(entry.total_outstanding <= 1_000_000);
    }

    #[test]
    fn loan_past_its_cure_window_force_sells_the_largest_non_index_holding() {
        let reference = ReferenceData::load();
        let prices = PriceEngine::new(Arc::new(ReferenceData::load()), 3);
        let config = EngineConfig::default();
        let lender = reference.lenders.all().first().cloned().expect("at least one seeded lender");
        let drawn_at = instant(2000, 1, 1, 0, 0, 0);
        let mut state = EngineState::new(drawn_at);
        let mut account = Account::new(Money::cents(0));
        let ibm = Symbol::new("IBM");
        account.record_buy(ibm.clone(), 100, 80.0, Money::ZERO, drawn_at);

        account.loans.push(crate::account::loan::Loan::draw(&lender, Money::cents(500_00), drawn_at));
        let due_at = account.loans[0].due_at;
        account.loans[0].mark_overdue_if_due(due_at + chrono::Duration::days(1));

        let way_past_cure = due_at + chrono::Duration::days(lender.penalty.forced_liquidation_after_days + 5);
        run_loan_interest(&mut state, &mut account, &reference, &prices, &config, way_past_cure);

        assert!(account.shares_owned(&ibm) < 100, "the cure-expired loan should have force-sold IBM shares");
        assert!(account.loans[0].balance < account.loans[0].principal, "proceeds should have paid down the loan");
        assert!(account.transactions.iter().any(|t| t.kind == crate::account::transaction::TransactionKind::LoanPayment));
    }
}
