// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-source normalization of uploaded batches.
//!
//! Every cell-level failure degrades to [`Cell::Null`] and is logged; nothing
//! here aborts a batch.

use crate::batch::{Batch, Cell};
use crate::error::DealflowError;
use crate::models::Sentiment;
use crate::schema::SourceKind;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Due-diligence risk terms, in report order.
pub const RED_FLAG_TERMS: &[&str] = &[
    "litigation",
    "lawsuit",
    "investigation",
    "fraud",
    "bankruptcy",
    "regulatory action",
    "penalty",
    "fine",
    "violation",
    "compliance",
    "SEC investigation",
    "management turnover",
    "resignation",
    "fired",
    "accounting irregularities",
    "restatement",
    "audit",
    "whistle",
];

/// Deal-event terms, in report order.
pub const DEAL_EVENT_TERMS: &[&str] = &[
    "acquisition",
    "merger",
    "takeover",
    "buyout",
    "investment",
    "strategic partnership",
    "joint venture",
    "divestiture",
    "spin-off",
    "IPO",
    "going private",
    "tender offer",
    "bid",
    "purchase",
];

const POSITIVE_TERMS: &[&str] = &["growth", "expansion", "success", "strong", "positive", "good"];
const NEGATIVE_TERMS: &[&str] = &["decline", "loss", "weak", "negative", "poor", "difficult"];

static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").unwrap());
static MONEY_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$€£¥,\s]").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// How a source's money columns are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoneyStyle {
    Plain,
    /// Accepts `B`/`M` magnitude suffixes.
    Suffixed,
}

struct SourceRules {
    dates: &'static [&'static str],
    money: &'static [&'static str],
    money_style: MoneyStyle,
    scan_content: bool,
    sentiment: bool,
}

fn rules_for(kind: SourceKind) -> SourceRules {
    match kind {
        SourceKind::Mergermarket => SourceRules {
            dates: &["announcement_date", "completion_date", "expected_completion"],
            money: &["deal_value"],
            money_style: MoneyStyle::Plain,
            scan_content: false,
            sentiment: false,
        },
        SourceKind::Preqin => SourceRules {
            dates: &["investment_date", "exit_date", "fund_vintage"],
            money: &["investment_amount", "exit_value", "fund_size"],
            money_style: MoneyStyle::Plain,
            scan_content: false,
            sentiment: false,
        },
        SourceKind::SecFilings => SourceRules {
            dates: &["filing_date"],
            money: &[],
            money_style: MoneyStyle::Plain,
            scan_content: true,
            sentiment: false,
        },
        SourceKind::IndexConstituents => SourceRules {
            dates: &[],
            money: &["market_cap"],
            money_style: MoneyStyle::Suffixed,
            scan_content: false,
            sentiment: false,
        },
        SourceKind::PressReleases => SourceRules {
            dates: &["date"],
            money: &[],
            money_style: MoneyStyle::Plain,
            scan_content: true,
            sentiment: true,
        },
    }
}

/// Lower-cases and folds runs of spaces and hyphens into a single `_`.
pub fn normalize_column_name(name: &str) -> String {
    SEPARATOR_RUN
        .replace_all(name.trim(), "_")
        .to_lowercase()
}

/// Lenient calendar-date parsing; `None` when no known layout fits.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parses `"$1,234.50"`-style strings. With `suffixed`, `2.5B` is
/// 2 500 000 000 and `750M` is 750 000 000.
pub fn parse_money(raw: &str, suffixed: bool) -> Result<f64, DealflowError> {
    let fail = || DealflowError::Parse {
        field: "amount".into(),
        value: raw.to_string(),
    };
    let cleaned = MONEY_NOISE.replace_all(raw.trim(), "");
    let (digits, scale) = match cleaned.chars().last() {
        Some('B' | 'b') if suffixed => (&cleaned[..cleaned.len() - 1], 1_000_000_000i64),
        Some('M' | 'm') if suffixed => (&cleaned[..cleaned.len() - 1], 1_000_000i64),
        _ => (&cleaned[..], 1i64),
    };
    if digits.is_empty() {
        return Err(fail());
    }
    let value = digits
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(digits))
        .map_err(|_| fail())?;
    value
        .checked_mul(Decimal::from(scale))
        .and_then(|v| v.to_f64())
        .ok_or_else(fail)
}

fn matched_terms(text: &str, vocabulary: &[&str]) -> String {
    let hay = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|term| hay.contains(&term.to_lowercase()))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn extract_red_flags(text: &str) -> String {
    matched_terms(text, RED_FLAG_TERMS)
}

pub fn extract_deal_mentions(text: &str) -> String {
    matched_terms(text, DEAL_EVENT_TERMS)
}

pub fn analyze_sentiment(text: &str) -> Sentiment {
    let hay = text.to_lowercase();
    let hits = |terms: &[&str]| terms.iter().filter(|t| hay.contains(*t)).count();
    let positive = hits(POSITIVE_TERMS);
    let negative = hits(NEGATIVE_TERMS);
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

fn date_cell(column: &str, cell: &Cell) -> Cell {
    match cell {
        Cell::Null | Cell::Date(_) => cell.clone(),
        Cell::Timestamp(t) => Cell::Date(t.date()),
        other => match other.as_date() {
            Some(d) => Cell::Date(d),
            None => {
                tracing::debug!(column, value = %other, "unparsable date, storing null");
                Cell::Null
            }
        },
    }
}

fn money_cell(column: &str, cell: &Cell, style: MoneyStyle) -> Cell {
    let parsed = match cell {
        Cell::Null => return Cell::Null,
        Cell::Number(n) => Ok(*n),
        other => parse_money(&other.to_string(), style == MoneyStyle::Suffixed),
    };
    match parsed {
        Ok(v) if column == "deal_value" && v < 0.0 => {
            tracing::debug!(column, value = v, "negative deal value, storing null");
            Cell::Null
        }
        Ok(v) => Cell::Number(v),
        Err(e) => {
            tracing::debug!(column, error = %e, "storing null");
            Cell::Null
        }
    }
}

fn derived_column<F>(batch: &Batch, source_column: &str, f: F) -> Vec<Cell>
where
    F: Fn(&str) -> Cell,
{
    batch
        .column(source_column)
        .unwrap_or_default()
        .into_iter()
        .map(|c| match c.as_text() {
            Some(text) => f(&text),
            None => f(""),
        })
        .collect()
}

/// Brings a raw upload into the canonical shape for `source_name`.
///
/// Unrecognized sources only get their column names normalized.
pub fn normalize(mut batch: Batch, source_name: &str, imported_at: NaiveDateTime) -> Batch {
    batch.rename_columns(normalize_column_name);

    let Some(kind) = SourceKind::from_name(source_name) else {
        tracing::warn!(source = source_name, "unknown source, applying generic normalization only");
        return batch;
    };
    let rules = rules_for(kind);

    for column in rules.dates {
        batch.map_column(column, |c| date_cell(column, c));
    }
    for column in rules.money {
        batch.map_column(column, |c| money_cell(column, c, rules.money_style));
    }

    if rules.scan_content && batch.has_column("content") {
        let red_flags = derived_column(&batch, "content", |t| Cell::text(&extract_red_flags(t)));
        let mentions =
            derived_column(&batch, "content", |t| Cell::text(&extract_deal_mentions(t)));
        batch.set_column("red_flags", red_flags);
        batch.set_column("deal_mentions", mentions);
        if rules.sentiment {
            let sentiment = derived_column(&batch, "content", |t| {
                Cell::Text(analyze_sentiment(t).to_string())
            });
            batch.set_column("sentiment", sentiment);
        }
    }

    let n = batch.len();
    batch.set_column("source", vec![Cell::Text(kind.label().to_string()); n]);
    batch.set_column("import_date", vec![Cell::Timestamp(imported_at); n]);
    tracing::debug!(source = %kind, rows = n, "normalized batch");
    batch
}
