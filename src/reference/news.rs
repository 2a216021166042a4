//! The static deck of dated news headlines and emails surfaced by the derived-views layer (§3,
//! §4.2). Cooldown bookkeeping (how often a given item can resurface) lives with the views
//! module, not here; this catalog is read-only content.

use crate::time::{instant, Instant, Symbol};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum NewsSeverity {
    Routine,
    Notable,
    Breaking,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    pub id: &'static str,
    pub at: Instant,
    pub headline: &'static str,
    pub body: &'static str,
    pub related_symbols: Vec<Symbol>,
    pub severity: NewsSeverity,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmailItem {
    pub id: &'static str,
    pub at: Instant,
    pub from: &'static str,
    pub subject: &'static str,
    pub body: &'static str,
    pub related_symbols: Vec<Symbol>,
}

#[derive(Debug)]
pub struct NewsDeck {
    news: Vec<NewsItem>,
    emails: Vec<EmailItem>,
}

impl NewsDeck {
    /// News items dated at or before `t`, in chronological order.
    pub fn news_up_to(&self, t: Instant) -> impl Iterator<Item = &NewsItem> {
        self.news.iter().filter(move |n| n.at <= t)
    }

    pub fn emails_up_to(&self, t: Instant) -> impl Iterator<Item = &EmailItem> {
        self.emails.iter().filter(move |e| e.at <= t)
    }

    pub fn seed() -> Self {
        let news = vec![
            NewsItem {
                id: "black_monday_headline",
                at: instant(1987, 10, 19, 21, 0, 0),
                headline: "Stocks Plunge 23% in Record Wall Street Rout",
                body: "The Dow Jones Industrial Average fell 508 points in the largest single-day percentage decline in its history.",
                related_symbols: vec![],
                severity: NewsSeverity::Breaking,
            },
            NewsItem {
                id: "dotcom_peak",
                at: instant(2000, 3, 10, 21, 0, 0),
                headline: "Nasdaq Closes at All-Time High Amid Dot-Com Frenzy",
                body: "The Nasdaq Composite closed above 5,000 for the first time, led by internet and technology issues.",
                related_symbols: vec![Symbol::new("MSFT"), Symbol::new("AAPL")],
                severity: NewsSeverity::Notable,
            },
            NewsItem {
                id: "enron_bankruptcy",
                at: instant(2001, 12, 2, 14, 30, 0),
                headline: "Enron Files for Chapter 11 Bankruptcy Protection",
                body: "Once the seventh-largest company in America, Enron collapsed amid an accounting fraud scandal.",
                related_symbols: vec![Symbol::new("ENRN")],
                severity: NewsSeverity::Breaking,
            },
            NewsItem {
                id: "lehman_collapse",
                at: instant(2008, 9, 15, 14, 30, 0),
                headline: "Lehman Brothers Collapses, Deepening Financial Crisis",
                body: "The 158-year-old investment bank filed the largest bankruptcy in US history.",
                related_symbols: vec![Symbol::new("JPM"), Symbol::new("GE")],
                severity: NewsSeverity::Breaking,
            },
            NewsItem {
                id: "amazon_whole_foods",
                at: instant(2017, 6, 16, 14, 0, 0),
                headline: "Amazon to Acquire Whole Foods for $13.7 Billion",
                body: "The all-cash deal marks Amazon's largest acquisition and a major push into physical retail.",
                related_symbols: vec![Symbol::new("AMZN"), Symbol::new("WFM")],
                severity: NewsSeverity::Notable,
            },
            NewsItem {
                id: "covid_market_crash",
                at: instant(2020, 3, 16, 14, 0, 0),
                headline: "Markets Post Worst Day Since 1987 as Pandemic Fears Spread",
                body: "Trading was halted twice as the Dow fell nearly 3,000 points.",
                related_symbols: vec![],
                severity: NewsSeverity::Breaking,
            },
        ];

        let emails = vec![
            EmailItem {
                id: "welcome_email",
                at: instant(1970, 1, 2, 14, 30, 0),
                from: "onboarding@chronovest.example",
                subject: "Welcome to your new brokerage account",
                body: "Your account is funded and ready to trade. Good luck out there.",
                related_symbols: vec![],
            },
            EmailItem {
                id: "margin_call_notice",
                at: instant(1987, 10, 20, 10, 0, 0),
                from: "risk@chronovest.example",
                subject: "Margin call on your account",
                body: "Your equity has fallen below the maintenance margin requirement. Please deposit funds or close positions.",
                related_symbols: vec![],
            },
            EmailItem {
                id: "acquisition_notice_wfm",
                at: instant(2017, 6, 16, 20, 0, 0),
                from: "corporate-actions@chronovest.example",
                subject: "Your WFM shares have been acquired for cash",
                body: "Whole Foods Market shares have been converted to cash at $42.00 per share following the Amazon acquisition.",
                related_symbols: vec![Symbol::new("WFM")],
            },
        ];

        Self { news, emails }
    }
}
