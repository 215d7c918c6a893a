// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dealflow::cache::QueryCache;
use dealflow::commands::doctor::diagnose;
use dealflow::commands::reports::Reports;
use dealflow::db;
use rusqlite::{Connection, params};
use std::time::Duration;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn add(conn: &Connection, id: &str, value: Option<f64>, date: Option<&str>, industry: &str, status: &str) {
    conn.execute(
        "INSERT INTO deals(deal_id,target_name,acquirer_name,deal_value,announcement_date,industry,status,source) \
         VALUES (?1,'T','A',?2,?3,?4,?5,'Manual Entry')",
        params![id, value, date, industry, status],
    )
    .unwrap();
}

fn seed(conn: &Connection) {
    add(conn, "D-1", Some(100.0), Some("2025-06-03"), "Technology", "Announced");
    add(conn, "D-2", Some(300.0), Some("2025-06-10"), "Technology", "Complete");
    add(conn, "D-3", Some(50.0), Some("2025-05-20"), "Healthcare", "Pending");
    add(conn, "D-4", None, Some("2024-01-15"), "Energy", "Rumored");
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

#[test]
fn dashboard_metrics() {
    let conn = base_conn();
    seed(&conn);
    let reports = Reports::new(&conn, QueryCache::disabled());
    let m = reports.dashboard(today()).unwrap();
    assert_eq!(m.total_deals, 4);
    assert_eq!(m.deals_this_month, 2);
    assert_eq!(m.avg_deal_size, Some(150.0));
    assert_eq!(m.active_deals, 2);
}

#[test]
fn empty_dashboard_has_no_average() {
    let conn = base_conn();
    let reports = Reports::new(&conn, QueryCache::disabled());
    let m = reports.dashboard(today()).unwrap();
    assert_eq!(m.total_deals, 0);
    assert_eq!(m.avg_deal_size, None);
}

#[test]
fn cached_reports_refresh_after_deal_writes() {
    let conn = base_conn();
    seed(&conn);
    let reports = Reports::new(&conn, QueryCache::new(Duration::from_secs(300), 8));
    assert_eq!(reports.dashboard(today()).unwrap().total_deals, 4);

    add(&conn, "D-5", Some(10.0), Some("2025-06-12"), "Technology", "Announced");
    assert_eq!(reports.dashboard(today()).unwrap().total_deals, 4);

    reports.deals_changed();
    assert!(reports.cache().is_empty());
    let fresh = reports.dashboard(today()).unwrap();
    assert_eq!(fresh.total_deals, 5);
    assert_eq!(fresh.deals_this_month, 3);
}

#[test]
fn cached_deal_list_is_shared_until_invalidated() {
    let conn = base_conn();
    seed(&conn);
    let reports = Reports::new(&conn, QueryCache::new(Duration::from_secs(300), 8));
    assert_eq!(reports.deals().unwrap().len(), 4);
    reports.dashboard(today()).unwrap();
    assert_eq!(reports.cache().len(), 2);

    add(&conn, "D-5", Some(10.0), Some("2025-06-12"), "Technology", "Announced");
    assert_eq!(reports.deals().unwrap().len(), 4);
    reports.deals_changed();
    let deals = reports.deals().unwrap();
    assert_eq!(deals.len(), 5);
    assert_eq!(deals[0].deal_id, "D-5");
}

#[test]
fn volume_by_month_newest_first() {
    let conn = base_conn();
    seed(&conn);
    let reports = Reports::new(&conn, QueryCache::disabled());
    let months = reports.volume(today(), 12).unwrap();
    let summary: Vec<(&str, i64, f64)> = months
        .iter()
        .map(|m| (m.month.as_str(), m.deals, m.total_value))
        .collect();
    assert_eq!(summary, vec![("2025-06", 2, 400.0), ("2025-05", 1, 50.0)]);

    let this_month = reports.volume(today(), 1).unwrap();
    assert_eq!(this_month.len(), 1);
}

#[test]
fn industries_by_deal_count() {
    let conn = base_conn();
    seed(&conn);
    let reports = Reports::new(&conn, QueryCache::disabled());
    let top = reports.industries(2).unwrap();
    let names: Vec<&str> = top.iter().map(|i| i.industry.as_str()).collect();
    assert_eq!(names, vec!["Technology", "Energy"]);
    assert_eq!(top[0].deals, 2);
    assert_eq!(top[0].total_value, 400.0);
}

#[test]
fn doctor_flags_data_problems() {
    let conn = base_conn();
    seed(&conn);
    add(&conn, "D-9", Some(-3.0), None, "Technology", "Announced");
    conn.execute(
        "INSERT INTO alerts(user_id, alert_name, keywords, filters) VALUES \
         ('u','Broken','[oops','{}'), \
         ('u','Empty','[]','{}'), \
         ('u','Inverted','[\"acme\"]','{\"min_deal_size\":500,\"max_deal_size\":10}')",
        [],
    )
    .unwrap();

    let report = diagnose(&conn).unwrap();
    assert_eq!(report.status.deals, 5);
    assert_eq!(report.status.alerts, 3);
    let issues: Vec<&str> = report.findings.iter().map(|f| f.issue.as_str()).collect();
    assert!(issues.contains(&"negative_deal_value"));
    assert!(issues.contains(&"undated_deals"));
    assert!(issues.contains(&"alert_undecodable"));
    assert!(issues.contains(&"alert_no_keywords"));
    assert!(issues.contains(&"alert_inverted_bounds"));
}

#[test]
fn doctor_is_quiet_on_clean_data() {
    let conn = base_conn();
    seed(&conn);
    let report = diagnose(&conn).unwrap();
    assert!(report.findings.is_empty());
}
