//! The player's account: cash, long and short positions, bond and index holdings, margin loans,
//! cost-basis lots, and the append-only transaction log (§3 `Account`, §4.8, §6).

pub mod loan;
pub mod lots;
pub mod margin;
pub mod tax;
pub mod transaction;

use crate::account::loan::Loan;
use crate::account::lots::{close_fifo, ClosedLot, PurchaseLot};
use crate::account::margin::MarginState;
use crate::account::transaction::{Transaction, TransactionKind};
use crate::money::Money;
use crate::time::{Instant, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Starting credit score for a freshly opened account, roughly "fair" on a 300-850 scale.
pub const DEFAULT_CREDIT_SCORE: u32 = 650;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub cash: Money,
    pub credit_score: u32,
    long_positions: HashMap<Symbol, i64>,
    short_positions: HashMap<Symbol, i64>,
    bond_holdings: HashMap<Symbol, u32>,
    pub purchase_lots: Vec<PurchaseLot>,
    pub loans: Vec<Loan>,
    pub margin_state: MarginState,
    pub transactions: Vec<Transaction>,
    pub last_trade_time: Option<Instant>,
}

impl Account {
    pub fn new(initial_cash: Money) -> Self {
        Self {
            cash: initial_cash,
            credit_score: DEFAULT_CREDIT_SCORE,
            long_positions: HashMap::new(),
            short_positions: HashMap::new(),
            bond_holdings: HashMap::new(),
            purchase_lots: Vec::new(),
            loans: Vec::new(),
            margin_state: MarginState::default(),
            transactions: Vec::new(),
            last_trade_time: None,
        }
    }

    pub fn shares_owned(&self, symbol: &Symbol) -> i64 {
        *self.long_positions.get(symbol).unwrap_or(&0)
    }

    pub fn shares_short(&self, symbol: &Symbol) -> i64 {
        *self.short_positions.get(symbol).unwrap_or(&0)
    }

    pub fn bonds_held(&self, symbol: &Symbol) -> u32 {
        *self.bond_holdings.get(symbol).unwrap_or(&0)
    }

    /// Symbols with a nonzero long position, for cash-event sweeps (dividends, index expense).
    pub fn long_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.long_positions.iter().filter(|(_, shares)| **shares > 0).map(|(s, _)| s.clone())
    }

    /// Symbols with a nonzero bond holding, for coupon/maturity sweeps.
    pub fn bond_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.bond_holdings.iter().filter(|(_, units)| **units > 0).map(|(s, _)| s.clone())
    }

    pub fn push_fee_transaction(&mut self, fee: Money, at: Instant) -> &Transaction {
        self.push_transaction(Transaction::new(at, TransactionKind::Fee, None, None, None, -fee, fee, Money::ZERO, "monthly account fee"))
    }

    pub fn push_margin_interest_transaction(&mut self, interest: Money, at: Instant) -> &Transaction {
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::MarginInterest,
            None,
            None,
            None,
            -interest,
            Money::ZERO,
            Money::ZERO,
            "margin interest",
        ))
    }

    pub fn long_position_value(&self, symbol: &Symbol, price_per_share: f64) -> Money {
        Money::from_dollars_f64(self.shares_owned(symbol) as f64 * price_per_share)
    }

    /// Total market value of every long position, given a price lookup (typically backed by the
    /// price engine). Symbols the lookup can't price are skipped rather than failing the whole
    /// valuation (§4.9 snapshot tolerance).
    pub fn total_long_value(&self, price_of: impl Fn(&Symbol) -> Option<f64>) -> Money {
        self.long_positions
            .iter()
            .filter_map(|(symbol, shares)| price_of(symbol).map(|p| Money::from_dollars_f64(*shares as f64 * p)))
            .sum()
    }

    pub fn total_short_liability(&self, price_of: impl Fn(&Symbol) -> Option<f64>) -> Money {
        self.short_positions
            .iter()
            .filter_map(|(symbol, shares)| price_of(symbol).map(|p| Money::from_dollars_f64(*shares as f64 * p)))
            .sum()
    }

    pub fn outstanding_loan_balance(&self) -> Money {
        self.loans.iter().map(|l| l.balance).sum()
    }

    pub fn net_equity(&self, price_of: impl Fn(&Symbol) -> Option<f64>) -> Money {
        self.cash + self.total_long_value(&price_of) - self.total_short_liability(&price_of) - self.outstanding_loan_balance()
    }

    /// Records a buy: debits cash and fees, opens a new purchase lot, and appends the transaction.
    pub fn record_buy(
        &mut self,
        symbol: Symbol,
        qty: i64,
        price_per_share: f64,
        fees: Money,
        at: Instant,
    ) -> &Transaction {
        let cost = Money::from_dollars_f64(qty as f64 * price_per_share);
        self.cash -= cost + fees;
        *self.long_positions.entry(symbol.clone()).or_insert(0) += qty;
        self.purchase_lots.push(PurchaseLot {
            symbol: symbol.clone(),
            shares: qty,
            cost_basis_per_share: Money::from_dollars_f64(price_per_share),
            acquired_at: at,
        });
        self.last_trade_time = Some(at);
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::Buy,
            Some(symbol),
            Some(qty),
            Some(price_per_share),
            -(cost + fees),
            fees,
            Money::ZERO,
            "buy",
        ))
    }

    /// Records a sell: closes FIFO lots, computes tax via `tax::tax_on_closed_lots`, credits the
    /// net proceeds, and appends the transaction.
    pub fn record_sell(
        &mut self,
        symbol: Symbol,
        qty: i64,
        price_per_share: f64,
        fees: Money,
        at: Instant,
    ) -> (&Transaction, Vec<ClosedLot>) {
        let proceeds_per_share = Money::from_dollars_f64(price_per_share);
        let closed = close_fifo(&mut self.purchase_lots, qty, at, proceeds_per_share);
        let tax = tax::tax_on_closed_lots(&closed);
        let gross = proceeds_per_share.scale(qty as f64);
        *self.long_positions.entry(symbol.clone()).or_insert(0) -= qty;
        self.cash += gross - fees - tax;
        self.last_trade_time = Some(at);
        let txn = self.push_transaction(Transaction::new(
            at,
            TransactionKind::Sell,
            Some(symbol),
            Some(qty),
            Some(price_per_share),
            gross - fees - tax,
            fees,
            tax,
            "sell",
        ));
        (txn, closed)
    }

    /// Opens or extends a short position: credits sale proceeds but locks an equal multiple as
    /// collateral (§6 margin rules).
    pub fn record_short(&mut self, symbol: Symbol, qty: i64, price_per_share: f64, fees: Money, at: Instant) -> &Transaction {
        let proceeds = Money::from_dollars_f64(qty as f64 * price_per_share);
        let collateral = MarginState::collateral_required_for_short(proceeds);
        self.margin_state.short_collateral_held += collateral;
        self.cash += proceeds - fees;
        *self.short_positions.entry(symbol.clone()).or_insert(0) += qty;
        self.last_trade_time = Some(at);
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::Short,
            Some(symbol),
            Some(qty),
            Some(price_per_share),
            proceeds - fees,
            fees,
            Money::ZERO,
            "short",
        ))
    }

    /// Closes (covers) a short position at the prevailing price, releasing a proportional share
    /// of the collateral held.
    pub fn record_cover(&mut self, symbol: Symbol, qty: i64, price_per_share: f64, fees: Money, at: Instant) -> &Transaction {
        let cost = Money::from_dollars_f64(qty as f64 * price_per_share);
        let held = self.shares_short(&symbol).max(1);
        let released = self.margin_state.short_collateral_held.scale(qty as f64 / held as f64);
        self.margin_state.short_collateral_held -= released;
        self.cash -= cost + fees;
        *self.short_positions.entry(symbol.clone()).or_insert(0) -= qty;
        self.last_trade_time = Some(at);
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::Cover,
            Some(symbol),
            Some(qty),
            Some(price_per_share),
            -(cost + fees),
            fees,
            Money::ZERO,
            "cover",
        ))
    }

    /// Applies a stock split to both position counts and every open lot of `symbol`.
    pub fn apply_split(&mut self, symbol: &Symbol, ratio: f64) {
        if let Some(shares) = self.long_positions.get_mut(symbol) {
            *shares = (*shares as f64 * ratio).round() as i64;
        }
        if let Some(shares) = self.short_positions.get_mut(symbol) {
            *shares = (*shares as f64 * ratio).round() as i64;
        }
        lots::apply_split(&mut self.purchase_lots, symbol, ratio);
    }

    pub fn record_dividend(&mut self, symbol: Symbol, net: Money, tax: Money, at: Instant) -> &Transaction {
        self.cash += net;
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::Dividend,
            Some(symbol),
            None,
            None,
            net,
            Money::ZERO,
            tax,
            "dividend",
        ))
    }

    pub fn record_bond_coupon(&mut self, symbol: Symbol, net: Money, tax: Money, at: Instant) -> &Transaction {
        self.cash += net;
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::BondCoupon,
            Some(symbol),
            None,
            None,
            net,
            Money::ZERO,
            tax,
            "bond coupon",
        ))
    }

    pub fn record_bond_maturity(&mut self, symbol: Symbol, face_value: Money, at: Instant) -> &Transaction {
        self.cash += face_value;
        self.bond_holdings.remove(&symbol);
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::BondMaturity,
            Some(symbol),
            None,
            None,
            face_value,
            Money::ZERO,
            Money::ZERO,
            "bond maturity",
        ))
    }

    pub fn buy_bond(&mut self, symbol: Symbol, units: u32, price: Money, at: Instant) -> &Transaction {
        self.cash -= price;
        *self.bond_holdings.entry(symbol.clone()).or_insert(0) += units;
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::Buy,
            Some(symbol),
            Some(units as i64),
            None,
            -price,
            Money::ZERO,
            Money::ZERO,
            "buy bond",
        ))
    }

    /// Closes the entire long position in `symbol` at `proceeds_per_share` (0.0 for a bankruptcy
    /// or uncompensated delisting), realizing capital-gains tax on the way out. Returns `None` if
    /// the account holds nothing to liquidate.
    pub fn liquidate_position(
        &mut self,
        symbol: Symbol,
        proceeds_per_share: f64,
        at: Instant,
        note: impl Into<String>,
    ) -> Option<Transaction> {
        let qty = self.shares_owned(&symbol);
        if qty <= 0 {
            return None;
        }
        let proceeds = Money::from_dollars_f64(proceeds_per_share);
        let closed = close_fifo(&mut self.purchase_lots, qty, at, proceeds);
        let tax = tax::tax_on_closed_lots(&closed);
        let gross = proceeds.scale(qty as f64);
        self.long_positions.insert(symbol.clone(), 0);
        self.cash += gross - tax;
        Some(
            self.push_transaction(Transaction::new(
                at,
                TransactionKind::CorporateEvent,
                Some(symbol),
                Some(qty),
                Some(proceeds_per_share),
                gross - tax,
                Money::ZERO,
                tax,
                note,
            ))
            .clone(),
        )
    }

    /// Converts a stock-for-stock acquisition: every share of `from_symbol` becomes `ratio` shares
    /// of `to_symbol`, carrying cost basis across (§4.6 `acquisition-stock`).
    pub fn convert_position(&mut self, from_symbol: &Symbol, to_symbol: Symbol, ratio: f64, at: Instant) -> Option<Transaction> {
        let qty = self.shares_owned(from_symbol);
        if qty <= 0 {
            return None;
        }
        let new_qty = (qty as f64 * ratio).round() as i64;
        self.long_positions.insert(from_symbol.clone(), 0);
        *self.long_positions.entry(to_symbol.clone()).or_insert(0) += new_qty;
        for lot in self.purchase_lots.iter_mut().filter(|l| &l.symbol == from_symbol) {
            lot.symbol = to_symbol.clone();
            lot.shares = (lot.shares as f64 * ratio).round() as i64;
            lot.cost_basis_per_share = lot.cost_basis_per_share.scale(1.0 / ratio);
        }
        Some(
            self.push_transaction(Transaction::new(
                at,
                TransactionKind::CorporateEvent,
                Some(to_symbol),
                Some(new_qty),
                None,
                Money::ZERO,
                Money::ZERO,
                Money::ZERO,
                "stock-for-stock acquisition",
            ))
            .clone(),
        )
    }

    /// Applies `amount` against `self.loans[loan_index]`'s balance, debiting cash for the payment.
    pub fn pay_loan(&mut self, loan_index: usize, amount: Money, at: Instant) -> &Transaction {
        self.cash -= amount;
        self.loans[loan_index].pay(amount);
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::LoanPayment,
            None,
            None,
            None,
            -amount,
            Money::ZERO,
            Money::ZERO,
            "loan payment",
        ))
    }

    pub fn draw_loan(&mut self, lender: &crate::reference::loans::Lender, principal: Money, at: Instant) -> &Transaction {
        let loan = Loan::draw(lender, principal, at);
        self.cash += principal;
        self.loans.push(loan);
        self.push_transaction(Transaction::new(
            at,
            TransactionKind::LoanDraw,
            None,
            None,
            None,
            principal,
            Money::ZERO,
            Money::ZERO,
            format!("loan draw from {}", lender.display_name),
        ))
    }

    fn push_transaction(&mut self, txn: Transaction) -> &Transaction {
        self.transactions.push(txn);
        self.transactions.last().expect("just pushed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant;

    #[test]
    fn buy_then_sell_conserves_cash_minus_fees_and_tax() {
        let mut account = Account::new(Money::cents(100_000_00));
        let aapl = Symbol::new("AAPL");
        account.record_buy(aapl.clone(), 10, 100.0, Money::cents(100), instant(2020, 1, 1, 0, 0, 0));
        assert_eq!(account.shares_owned(&aapl), 10);
        assert_eq!(account.cash, Money::cents(100_000_00) - Money::cents(1_000_00) - Money::cents(100));

        let (_, closed) = account.record_sell(aapl.clone(), 10, 120.0, Money::cents(100), instant(2020, 2, 1, 0, 0, 0));
        assert_eq!(closed.len(), 1);
        assert_eq!(account.shares_owned(&aapl), 0);
    }

    #[test]
    fn short_then_cover_releases_collateral() {
        let mut account = Account::new(Money::cents(100_000_00));
        let ibm = Symbol::new("IBM");
        account.record_short(ibm.clone(), 10, 50.0, Money::cents(50), instant(2020, 1, 1, 0, 0, 0));
        assert_eq!(account.shares_short(&ibm), 10);
        assert!(account.margin_state.short_collateral_held.as_cents() > 0);

        account.record_cover(ibm.clone(), 10, 40.0, Money::cents(50), instant(2020, 2, 1, 0, 0, 0));
        assert_eq!(account.shares_short(&ibm), 0);
        assert_eq!(account.margin_state.short_collateral_held, Money::ZERO);
    }

    #[test]
    fn split_scales_position_and_lots_together() {
        let mut account = Account::new(Money::cents(100_000_00));
        let aapl = Symbol::new("AAPL");
        account.record_buy(aapl.clone(), 10, 100.0, Money::ZERO, instant(2014, 1, 1, 0, 0, 0));
        account.apply_split(&aapl, 7.0);
        assert_eq!(account.shares_owned(&aapl), 70);
        assert_eq!(account.purchase_lots[0].shares, 70);
    }
}
