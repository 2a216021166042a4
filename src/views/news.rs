//! Merged static + dynamic news (§4.9): static headlines come straight from the reference deck;
//! "significant move" items are synthesized from the price series itself. Detection state
//! (per-symbol and per-sector cooldowns) lives in [`DynamicNewsGenerator`], persisted as part of
//! `EngineState` so a restart doesn't immediately re-fire a move that already triggered a headline
//! on the previous save.

use crate::price::PriceEngine;
use crate::reference::news::{EmailItem, NewsSeverity};
use crate::reference::{ReferenceData, Sector};
use crate::time::{Instant, Symbol};
use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SYMBOL_COOLDOWN_DAYS: i64 = 7;
const SECTOR_COOLDOWN_DAYS: i64 = 3;
const SIGNIFICANT_MOVE_THRESHOLD: f64 = 0.08;
const BREAKING_MOVE_THRESHOLD: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct NewsStreamEntry {
    pub at: Instant,
    pub headline: String,
    pub body: String,
    pub related_symbols: Vec<Symbol>,
    pub severity: NewsSeverity,
}

fn day_index(t: Instant) -> i64 {
    t.date_naive().num_days_from_ce() as i64
}

/// Rescans the price series day by day, looking for moves past the significance threshold and
/// emitting a news item once per cooldown window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicNewsGenerator {
    last_symbol_trigger_day: HashMap<Symbol, i64>,
    last_sector_trigger_day: HashMap<Sector, i64>,
}

impl DynamicNewsGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one entry per symbol/sector move that clears its cooldown, over `[since, up_to]`.
    /// `since` should generally be no later than `up_to - 7 days` so a genuine move isn't missed
    /// because its cooldown tracker hadn't been primed yet.
    pub fn scan(&mut self, prices: &PriceEngine, reference: &ReferenceData, since: Instant, up_to: Instant) -> Vec<NewsStreamEntry> {
        let mut out = Vec::new();
        let start_day = day_index(since);
        let end_day = day_index(up_to);

        for day in start_day..=end_day {
            let t = since + Duration::days(day - start_day);
            let mut sector_changes: HashMap<Sector, Vec<f64>> = HashMap::new();

            for company in reference.companies.all() {
                if !company.meta.is_listed_at(t) {
                    continue;
                }
                let Ok(sample) = prices.price(&company.meta.symbol, t) else { continue };
                let change = sample.change_pct_vs_prior_day;
                sector_changes.entry(company.meta.sector).or_default().push(change);

                if change.abs() < SIGNIFICANT_MOVE_THRESHOLD {
                    continue;
                }
                let ready = self
                    .last_symbol_trigger_day
                    .get(&company.meta.symbol)
                    .map(|last| day - last >= SYMBOL_COOLDOWN_DAYS)
                    .unwrap_or(true);
                if !ready {
                    continue;
                }
                self.last_symbol_trigger_day.insert(company.meta.symbol.clone(), day);
                out.push(symbol_move_entry(&company.meta.symbol, t, change));
            }

            for (sector, changes) in sector_changes {
                if changes.len() < 2 {
                    continue;
                }
                let avg = changes.iter().sum::<f64>() / changes.len() as f64;
                if avg.abs() < SIGNIFICANT_MOVE_THRESHOLD {
                    continue;
                }
                let ready = self
                    .last_sector_trigger_day
                    .get(&sector)
                    .map(|last| day - last >= SECTOR_COOLDOWN_DAYS)
                    .unwrap_or(true);
                if !ready {
                    continue;
                }
                self.last_sector_trigger_day.insert(sector, day);
                out.push(sector_move_entry(sector, t, avg));
            }
        }

        out
    }
}

fn symbol_move_entry(symbol: &Symbol, at: Instant, change: f64) -> NewsStreamEntry {
    let direction = if change >= 0.0 { "surges" } else { "slides" };
    NewsStreamEntry {
        at,
        headline: format!("{symbol} {direction} {:.1}% in a single session", change.abs() * 100.0),
        body: format!(
            "Shares of {symbol} moved {:+.1}% against the prior session's close.",
            change * 100.0
        ),
        related_symbols: vec![symbol.clone()],
        severity: severity_for(change),
    }
}

fn sector_move_entry(sector: Sector, at: Instant, avg_change: f64) -> NewsStreamEntry {
    let direction = if avg_change >= 0.0 { "rallies" } else { "retreats" };
    NewsStreamEntry {
        at,
        headline: format!("{sector:?} sector {direction} {:.1}% on average", avg_change.abs() * 100.0),
        body: format!("Listed {sector:?} names moved {:+.1}% on average versus the prior session.", avg_change * 100.0),
        related_symbols: vec![],
        severity: severity_for(avg_change),
    }
}

fn severity_for(change: f64) -> NewsSeverity {
    if change.abs() >= BREAKING_MOVE_THRESHOLD {
        NewsSeverity::Breaking
    } else {
        NewsSeverity::Notable
    }
}

/// Static deck items dated at or before `at`, merged with freshly scanned dynamic items over
/// `[since, at]`, in chronological order.
pub fn news_stream(
    generator: &mut DynamicNewsGenerator,
    prices: &PriceEngine,
    reference: &ReferenceData,
    since: Instant,
    at: Instant,
) -> Vec<NewsStreamEntry> {
    let mut items: Vec<NewsStreamEntry> = reference
        .news
        .news_up_to(at)
        .map(|n| NewsStreamEntry {
            at: n.at,
            headline: n.headline.to_string(),
            body: n.body.to_string(),
            related_symbols: n.related_symbols.clone(),
            severity: n.severity,
        })
        .collect();

    items.extend(generator.scan(prices, reference, since, at));
    items.sort_by_key(|i| i.at);
    items
}

pub fn email_stream(reference: &ReferenceData, at: Instant) -> Vec<&EmailItem> {
    reference.news.emails_up_to(at).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;
    use crate::time::instant;
    use std::sync::Arc;

    #[test]
    fn crash_week_produces_at_least_one_significant_move() {
        let reference = Arc::new(ReferenceData::load());
        let prices = PriceEngine::new(reference.clone(), 42);
        let mut generator = DynamicNewsGenerator::new();

        let since = instant(1987, 10, 12, 14, 30, 0);
        let at = instant(1987, 10, 26, 14, 30, 0);
        let entries = generator.scan(&prices, &reference, since, at);
        assert!(entries.iter().any(|e| e.headline.contains("IBM") || e.headline.contains("sector")));
    }

    #[test]
    fn cooldown_suppresses_immediate_repeat_triggers() {
        let reference = Arc::new(ReferenceData::load());
        let prices = PriceEngine::new(reference.clone(), 7);
        let mut generator = DynamicNewsGenerator::new();

        let since = instant(1987, 10, 12, 14, 30, 0);
        let at = instant(1987, 10, 26, 14, 30, 0);
        let entries = generator.scan(&prices, &reference, since, at);

        let mut last_trigger: HashMap<Symbol, i64> = HashMap::new();
        for entry in entries.iter().filter(|e| e.related_symbols.len() == 1) {
            let symbol = entry.related_symbols[0].clone();
            let day = day_index(entry.at);
            if let Some(prev) = last_trigger.get(&symbol) {
                assert!(day - prev >= SYMBOL_COOLDOWN_DAYS);
            }
            last_trigger.insert(symbol, day);
        }
    }

    #[test]
    fn email_stream_respects_time_filter() {
        let reference = ReferenceData::load();
        let early = instant(1970, 1, 3, 0, 0, 0);
        let emails = email_stream(&reference, early);
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].id, "welcome_email");
    }
}
