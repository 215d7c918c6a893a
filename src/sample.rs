// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Deterministic demonstration data.

use crate::error::DealflowError;
use crate::models::{Company, Deal};
use crate::store::companies::{find_companies, insert_company};
use crate::store::deals::insert_deal_if_new;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

const SEED: u64 = 42;
pub const SAMPLE_SOURCE: &str = "Sample Data";

const INDUSTRIES: &[&str] = &[
    "Technology",
    "Healthcare",
    "Finance",
    "Manufacturing",
    "Energy",
    "Retail",
];
const DEAL_TYPES: &[&str] = &["Acquisition", "Merger", "LBO", "IPO"];
const STATUSES: &[&str] = &["Announced", "Pending", "Complete", "Terminated"];
const GEOGRAPHIES: &[&str] = &["North America", "Europe", "Asia Pacific"];

fn pick(rng: &mut StdRng, from: &[&str]) -> Option<String> {
    from.choose(rng).map(|s| s.to_string())
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `n` deals announced evenly over the year ending `today`.
pub fn sample_deals(n: usize, today: NaiveDate, now: NaiveDateTime) -> Vec<Deal> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let span = 365.0 / (n.max(2) - 1) as f64;
    (1..=n)
        .map(|i| {
            let back = (365.0 - span * (i - 1) as f64).round() as i64;
            Deal {
                id: 0,
                deal_id: format!("DEAL-{:04}", i),
                target_name: format!("Target Corp {}", i),
                acquirer_name: format!("Acquirer Inc {}", i),
                deal_value: Some(round1(rng.random_range(10.0..500.0))),
                announcement_date: Some(today - Duration::days(back.max(0))),
                completion_date: None,
                industry: pick(&mut rng, INDUSTRIES),
                sector: None,
                geography: pick(&mut rng, GEOGRAPHIES),
                deal_type: pick(&mut rng, DEAL_TYPES),
                status: pick(&mut rng, STATUSES),
                tags: None,
                notes: None,
                source: SAMPLE_SOURCE.to_string(),
                import_date: now,
            }
        })
        .collect()
}

pub fn sample_companies(n: usize, now: NaiveDateTime) -> Vec<Company> {
    // separate stream so the company set does not shift with the deal count
    let mut rng = StdRng::seed_from_u64(SEED + 1);
    (1..=n)
        .map(|i| Company {
            id: 0,
            company_name: format!("Company {} Ltd", i),
            ticker: Some(format!("C{:03}", i)),
            industry: pick(&mut rng, INDUSTRIES),
            sector: None,
            geography: pick(&mut rng, GEOGRAPHIES),
            market_cap: Some(round1(rng.random_range(100.0..10_000.0))),
            revenue: Some(round1(rng.random_range(50.0..2_000.0))),
            ebitda: None,
            employees: Some(rng.random_range(100..50_000)),
            index_membership: None,
            tags: None,
            watchlist: false,
            last_updated: now,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleSummary {
    pub deals: usize,
    pub companies: usize,
}

/// Stores the sample set. Rows already present are left alone, so loading
/// twice is harmless.
pub fn load_sample(
    conn: &mut Connection,
    deals: usize,
    companies: usize,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<SampleSummary, DealflowError> {
    let mut summary = SampleSummary::default();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for d in sample_deals(deals, today, now) {
        if insert_deal_if_new(&tx, &d)?.is_some() {
            summary.deals += 1;
        }
    }
    for c in sample_companies(companies, now) {
        if find_companies(&tx, &c.company_name)?.is_empty() {
            insert_company(&tx, &c)?;
            summary.companies += 1;
        }
    }
    tx.commit()?;
    tracing::info!(deals = summary.deals, companies = summary.companies, "sample data loaded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_same_data() {
        assert_eq!(sample_deals(10, today(), now()), sample_deals(10, today(), now()));
        assert_eq!(sample_companies(5, now()), sample_companies(5, now()));
    }

    #[test]
    fn deals_span_the_last_year() {
        let deals = sample_deals(50, today(), now());
        assert_eq!(deals.len(), 50);
        assert_eq!(deals[0].announcement_date, Some(today() - Duration::days(365)));
        assert_eq!(deals[49].announcement_date, Some(today()));
        assert!(
            deals
                .iter()
                .all(|d| d.deal_value.is_some_and(|v| (10.0..=500.0).contains(&v)))
        );
    }

    #[test]
    fn loading_twice_adds_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let first = load_sample(&mut conn, 5, 3, today(), now()).unwrap();
        assert_eq!(first, SampleSummary { deals: 5, companies: 3 });
        let second = load_sample(&mut conn, 5, 3, today(), now()).unwrap();
        assert_eq!(second, SampleSummary::default());
    }
}
