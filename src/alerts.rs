// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Keyword alerts over stored deals.
//!
//! An alert matches a deal when any keyword occurs in the target or acquirer
//! name (ignoring case) and every active filter passes. Evaluation never
//! touches the database; [`run_all_alerts`] does the trigger bookkeeping.

use crate::error::DealflowError;
use crate::models::{Alert, Deal, NewAlert, Notification};
use crate::store::alerts::{load_alert_rows, mark_triggered};
use crate::utils::days_before;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Deal-type keyword groups offered when creating an alert.
pub const DEAL_KEYWORD_PRESETS: &[(&str, &[&str])] = &[
    (
        "acquisition",
        &["acquisition", "acquire", "acquired", "acquiring", "takeover", "buyout"],
    ),
    (
        "merger",
        &["merger", "merge", "merging", "merged", "combination", "consolidation"],
    ),
    (
        "investment",
        &["investment", "invest", "funding", "capital", "round", "financing"],
    ),
    (
        "partnership",
        &["partnership", "strategic alliance", "joint venture", "collaboration"],
    ),
    (
        "divestiture",
        &["divestiture", "divest", "spin-off", "carve-out", "disposal", "sell"],
    ),
    (
        "ipo",
        &["IPO", "initial public offering", "going public", "public listing"],
    ),
    (
        "private_equity",
        &["private equity", "PE", "LBO", "leveraged buyout", "management buyout"],
    ),
    (
        "restructuring",
        &["restructuring", "reorganization", "bankruptcy", "chapter 11", "administration"],
    ),
];

/// Matches listed in a notification body before the "and N more" line.
pub const NOTIFY_PREVIEW: usize = 5;

pub fn preset_keywords(category: &str) -> Option<&'static [&'static str]> {
    let key = category.trim().to_lowercase().replace([' ', '-'], "_");
    DEAL_KEYWORD_PRESETS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, words)| *words)
}

/// Rejects alerts that could never be evaluated meaningfully.
pub fn check_new_alert(a: &NewAlert) -> Result<(), DealflowError> {
    if a.alert_name.trim().is_empty() {
        return Err(DealflowError::InvalidAlert("alert name is empty".into()));
    }
    if a.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(DealflowError::InvalidAlert(
            "at least one keyword is required".into(),
        ));
    }
    let f = &a.filters;
    if f.min_deal_size < 0.0 || f.max_deal_size.is_some_and(|m| m < 0.0) {
        return Err(DealflowError::InvalidAlert(
            "deal size bounds must be non-negative".into(),
        ));
    }
    if let Some(max) = f.max_deal_size {
        if f.min_deal_size > max {
            return Err(DealflowError::InvalidAlert(format!(
                "min deal size {} exceeds max deal size {}",
                f.min_deal_size, max
            )));
        }
    }
    if a.email_notifications
        && f.email_address.as_deref().is_none_or(|e| e.trim().is_empty())
    {
        return Err(DealflowError::InvalidAlert(
            "email notifications need an email address".into(),
        ));
    }
    Ok(())
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

pub fn matches_keywords(alert: &Alert, deal: &Deal) -> bool {
    alert
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| {
            contains_ignore_case(&deal.target_name, &k)
                || contains_ignore_case(&deal.acquirer_name, &k)
        })
}

/// Industry membership and deal-size bounds. A missing value fails any
/// active bound.
pub fn passes_filters(alert: &Alert, deal: &Deal) -> bool {
    let f = &alert.filters;
    if !f.industries.is_empty() {
        let Some(industry) = deal.industry.as_deref() else {
            return false;
        };
        if !f
            .industries
            .iter()
            .any(|i| i.trim().eq_ignore_ascii_case(industry.trim()))
        {
            return false;
        }
    }
    if f.min_deal_size > 0.0 && !deal.deal_value.is_some_and(|v| v >= f.min_deal_size) {
        return false;
    }
    if let Some(max) = f.max_deal_size {
        if !deal.deal_value.is_some_and(|v| v <= max) {
            return false;
        }
    }
    true
}

/// Newest announcement first; undated deals keep their relative order last.
fn newest_first(deals: &mut [Deal]) {
    deals.sort_by(|a, b| match (a.announcement_date, b.announcement_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Every matching deal regardless of age.
pub fn evaluate_all(alert: &Alert, deals: &[Deal]) -> Vec<Deal> {
    let mut out: Vec<Deal> = deals
        .iter()
        .filter(|d| matches_keywords(alert, d) && passes_filters(alert, d))
        .cloned()
        .collect();
    newest_first(&mut out);
    out
}

/// Matching deals announced within `days` days before `today`, inclusive.
/// Undated deals never qualify. A window reaching past the earliest
/// representable date has no lower bound.
pub fn evaluate_recent(alert: &Alert, deals: &[Deal], today: NaiveDate, days: i64) -> Vec<Deal> {
    let cutoff = days_before(today, days);
    let mut out = evaluate_all(alert, deals);
    out.retain(|d| {
        d.announcement_date
            .is_some_and(|a| cutoff.is_none_or(|c| a >= c))
    });
    out
}

fn value_label(deal: &Deal) -> String {
    deal.deal_value
        .map(|v| format!("{}", v))
        .unwrap_or_else(|| "N/A".into())
}

/// Mail-shaped summary of a non-empty match set, or `None` when the alert
/// has no notifications, no address or nothing matched.
pub fn build_notification(alert: &Alert, matches: &[Deal]) -> Option<Notification> {
    if !alert.email_notifications || matches.is_empty() {
        return None;
    }
    let to = alert
        .filters
        .email_address
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())?;

    let mut body = format!(
        "Your alert \"{}\" has found {} new matches:\n\n",
        alert.alert_name,
        matches.len()
    );
    for d in matches.iter().take(NOTIFY_PREVIEW) {
        let target = if d.target_name.is_empty() { "N/A" } else { &d.target_name };
        let acquirer = if d.acquirer_name.is_empty() { "N/A" } else { &d.acquirer_name };
        body.push_str(&format!("• {} - {} (${}M)\n", target, acquirer, value_label(d)));
    }
    if matches.len() > NOTIFY_PREVIEW {
        body.push_str(&format!(
            "\n... and {} more matches.\n",
            matches.len() - NOTIFY_PREVIEW
        ));
    }
    Some(Notification {
        to: to.to_string(),
        subject: format!("Deal Alert: {}", alert.alert_name),
        body,
    })
}

/// Delivery is outside the crate; implementations decide the transport.
pub trait Notifier {
    fn send(&self, notification: &Notification) -> Result<(), DealflowError>;
}

/// Records notifications in the log instead of sending them.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, n: &Notification) -> Result<(), DealflowError> {
        tracing::info!(to = %n.to, subject = %n.subject, "notification ready");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    All,
    Recent { today: NaiveDate, days: i64 },
}

impl RunMode {
    pub fn evaluate(self, alert: &Alert, deals: &[Deal]) -> Vec<Deal> {
        match self {
            RunMode::All => evaluate_all(alert, deals),
            RunMode::Recent { today, days } => evaluate_recent(alert, deals, today, days),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertFailure {
    pub alert_id: i64,
    pub alert_name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMatches {
    pub alert_name: String,
    pub user_id: String,
    pub deals: Vec<Deal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertRun {
    /// Alert id to matches, for every alert that could be evaluated.
    pub matches: BTreeMap<i64, AlertMatches>,
    pub failures: Vec<AlertFailure>,
    pub notifications: Vec<Notification>,
}

impl AlertRun {
    /// Results of every alert called `name`; names repeat across users.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AlertMatches> + 'a {
        self.matches.values().filter(move |m| m.alert_name == name)
    }

    fn fail(&mut self, alert_id: i64, alert_name: &str, error: &DealflowError) {
        tracing::warn!(alert_id, alert = alert_name, error = %error, "alert failed");
        self.failures.push(AlertFailure {
            alert_id,
            alert_name: alert_name.to_string(),
            error: error.to_string(),
        });
    }
}

/// Evaluates every stored alert. One alert failing (undecodable row, trigger
/// update, notifier) never stops the others; failures are collected.
pub fn run_all_alerts(
    conn: &Connection,
    deals: &[Deal],
    mode: RunMode,
    now: NaiveDateTime,
    notifier: &dyn Notifier,
) -> Result<AlertRun, DealflowError> {
    let mut run = AlertRun::default();
    for row in load_alert_rows(conn, None)? {
        let alert = match row.decode() {
            Ok(a) => a,
            Err(e) => {
                run.fail(row.id, &row.alert_name, &e);
                continue;
            }
        };
        let matches = mode.evaluate(&alert, deals);
        if !matches.is_empty() {
            if let Err(e) = mark_triggered(conn, alert.id, now) {
                run.fail(alert.id, &alert.alert_name, &e);
            }
            if let Some(n) = build_notification(&alert, &matches) {
                match notifier.send(&n) {
                    Ok(()) => run.notifications.push(n),
                    Err(e) => run.fail(alert.id, &alert.alert_name, &e),
                }
            }
        }
        run.matches.insert(
            alert.id,
            AlertMatches {
                alert_name: alert.alert_name,
                user_id: alert.user_id,
                deals: matches,
            },
        );
    }
    tracing::info!(
        alerts = run.matches.len(),
        failures = run.failures.len(),
        "alert run finished"
    );
    Ok(run)
}

// Whole-word and case-insensitive, so "PE" skips "Pepsi".
static PRESET_TERMS: Lazy<Vec<(&str, Regex)>> = Lazy::new(|| {
    DEAL_KEYWORD_PRESETS
        .iter()
        .flat_map(|(_, words)| words.iter())
        .map(|w| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w))).unwrap();
            (*w, re)
        })
        .collect()
});

/// Whole-word occurrences of every preset keyword across deal names, most
/// frequent first. Ties keep preset order.
pub fn trending_keywords(deals: &[Deal]) -> Vec<(String, usize)> {
    let text = deals
        .iter()
        .map(|d| format!("{} {}", d.target_name, d.acquirer_name))
        .collect::<Vec<_>>()
        .join("\n");
    let mut counts: Vec<(String, usize)> = PRESET_TERMS
        .iter()
        .filter_map(|(w, re)| {
            let n = re.find_iter(&text).count();
            (n > 0).then(|| (w.to_string(), n))
        })
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
