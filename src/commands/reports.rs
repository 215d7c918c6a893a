// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::{QueryCache, fingerprint};
use crate::config::Settings;
use crate::error::DealflowError;
use crate::models::{ACTIVE_STATUSES, Deal};
use crate::store::deals::load_deals;
use crate::utils::{fmt_millions, maybe_print_json, output_flags, pretty_table, today};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use serde::{Deserialize, Serialize};

const CACHE_CAPACITY: usize = 64;
/// Every report key starts with this; deal writes invalidate it.
pub const DEALS_PREFIX: &str = "deals.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_deals: i64,
    pub deals_this_month: i64,
    pub avg_deal_size: Option<f64>,
    pub active_deals: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthVolume {
    pub month: String,
    pub deals: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryCount {
    pub industry: String,
    pub deals: i64,
    pub total_value: f64,
}

/// Report queries behind a TTL cache.
pub struct Reports<'a> {
    conn: &'a Connection,
    cache: QueryCache,
}

impl<'a> Reports<'a> {
    pub fn new(conn: &'a Connection, cache: QueryCache) -> Self {
        Reports { conn, cache }
    }

    /// Cache sized by the `cache_mode` setting.
    pub fn from_settings(conn: &'a Connection, settings: &Settings) -> Self {
        Reports::new(
            conn,
            QueryCache::new(settings.cache_mode.ttl(), CACHE_CAPACITY),
        )
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Call after any write to `deals`.
    pub fn deals_changed(&self) {
        self.cache.invalidate(DEALS_PREFIX);
    }

    /// Every stored deal, newest announcement first.
    pub fn deals(&self) -> Result<Vec<Deal>, DealflowError> {
        self.cache
            .get_or_try_insert("deals.all()", || load_deals(self.conn))
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardMetrics, DealflowError> {
        let key = fingerprint("deals.dashboard", &[&today]);
        self.cache.get_or_try_insert(&key, || {
            let month_start = today.with_day(1).unwrap_or(today);
            let (total_deals, deals_this_month, avg_deal_size): (i64, i64, Option<f64>) =
                self.conn.query_row(
                    "SELECT COUNT(*), \
                     COALESCE(SUM(date(announcement_date) >= ?1), 0), \
                     AVG(deal_value) FROM deals",
                    params![month_start.to_string()],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )?;
            let marks = vec!["?"; ACTIVE_STATUSES.len()].join(",");
            let active_deals: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM deals WHERE status IN ({})", marks),
                params_from_iter(ACTIVE_STATUSES.iter()),
                |r| r.get(0),
            )?;
            Ok(DashboardMetrics {
                total_deals,
                deals_this_month,
                avg_deal_size,
                active_deals,
            })
        })
    }

    /// Months with at least one deal among the `months` ending with the
    /// current one, newest first.
    pub fn volume(&self, today: NaiveDate, months: usize) -> Result<Vec<MonthVolume>, DealflowError> {
        let key = fingerprint("deals.volume", &[&today, &months]);
        self.cache.get_or_try_insert(&key, || {
            let back = format!("-{} months", months.saturating_sub(1));
            let mut stmt = self.conn.prepare(
                "SELECT strftime('%Y-%m', announcement_date) AS month, COUNT(*), \
                 COALESCE(SUM(deal_value), 0) FROM deals \
                 WHERE date(announcement_date) >= date(?1, 'start of month', ?2) \
                 AND date(announcement_date) <= date(?1) \
                 GROUP BY month ORDER BY month DESC",
            )?;
            let rows = stmt.query_map(params![today.to_string(), back], |r| {
                Ok(MonthVolume {
                    month: r.get(0)?,
                    deals: r.get(1)?,
                    total_value: r.get(2)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    pub fn industries(&self, top: usize) -> Result<Vec<IndustryCount>, DealflowError> {
        let key = fingerprint("deals.industries", &[&top]);
        self.cache.get_or_try_insert(&key, || {
            let mut stmt = self.conn.prepare(
                "SELECT industry, COUNT(*) AS n, COALESCE(SUM(deal_value), 0) FROM deals \
                 WHERE industry IS NOT NULL AND industry != '' \
                 GROUP BY industry ORDER BY n DESC, industry LIMIT ?1",
            )?;
            let rows = stmt.query_map([Value::Integer(top as i64)], |r| {
                Ok(IndustryCount {
                    industry: r.get(0)?,
                    deals: r.get(1)?,
                    total_value: r.get(2)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let reports = Reports::from_settings(conn, &settings);
    match m.subcommand() {
        Some(("dashboard", sub)) => dashboard(&reports, sub)?,
        Some(("volume", sub)) => volume(&reports, sub)?,
        Some(("industries", sub)) => industries(&reports, sub)?,
        _ => {}
    }
    Ok(())
}

fn dashboard(reports: &Reports, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let metrics = reports.dashboard(today())?;
    if !maybe_print_json(json_flag, jsonl_flag, &metrics)? {
        let rows = vec![
            vec!["Total Deals".into(), metrics.total_deals.to_string()],
            vec!["This Month".into(), metrics.deals_this_month.to_string()],
            vec!["Avg Deal Size".into(), fmt_millions(metrics.avg_deal_size)],
            vec!["Active Deals".into(), metrics.active_deals.to_string()],
        ];
        println!("{}", pretty_table(&["Metric", "Value"], rows));
    }
    Ok(())
}

fn volume(reports: &Reports, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let months = *sub.get_one::<usize>("months").unwrap_or(&12);
    let data = reports.volume(today(), months)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|v| {
                vec![
                    v.month.clone(),
                    v.deals.to_string(),
                    format!("{:.1}", v.total_value),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Deals", "Value ($M)"], rows));
    }
    Ok(())
}

fn industries(reports: &Reports, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let top = *sub.get_one::<usize>("top").unwrap_or(&10);
    let data = reports.industries(top)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|i| {
                vec![
                    i.industry.clone(),
                    i.deals.to_string(),
                    format!("{:.1}", i.total_value),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Industry", "Deals", "Value ($M)"], rows));
    }
    Ok(())
}
