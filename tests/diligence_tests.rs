// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dealflow::commands::diligence::{RECENT_FILINGS, build_report};
use dealflow::db;
use rusqlite::{Connection, params};

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn filing(conn: &Connection, company: &str, date: &str, flags: Option<&str>) {
    conn.execute(
        "INSERT INTO filings(company_name, filing_type, filing_date, red_flags, source) \
         VALUES (?1, '8-K', ?2, ?3, 'SEC EDGAR')",
        params![company, date, flags],
    )
    .unwrap();
}

#[test]
fn report_collects_filings_flags_and_deals() {
    let conn = base_conn();
    filing(&conn, "Acme Corp", "2025-03-01", Some("lawsuit, investigation"));
    filing(&conn, "Acme Corp", "2025-04-01", Some("lawsuit"));
    filing(&conn, "Other Inc", "2025-04-02", Some("fraud"));
    conn.execute(
        "INSERT INTO deals(deal_id,target_name,acquirer_name,deal_value,announcement_date,source) VALUES \
         ('D-1','Acme Corp','Buyer',100.0,'2025-01-01','Manual Entry'), \
         ('D-2','Seller','Acme Corp',NULL,'2025-02-01','Manual Entry')",
        [],
    )
    .unwrap();

    let report = build_report(&conn, "  acme ").unwrap();
    assert_eq!(report.company, "acme");
    assert_eq!(report.filings.len(), 2);
    assert_eq!(report.filings[0].filing_date.unwrap().to_string(), "2025-04-01");
    assert_eq!(report.red_flags, vec!["lawsuit", "investigation"]);
    assert_eq!(report.deals.len(), 2);
    assert_eq!(report.total_deal_value, 100.0);
}

#[test]
fn filings_are_capped() {
    let conn = base_conn();
    for day in 1..=15 {
        filing(&conn, "Acme Corp", &format!("2025-05-{:02}", day), None);
    }
    let report = build_report(&conn, "Acme").unwrap();
    assert_eq!(report.filings.len(), RECENT_FILINGS);
    assert!(report.red_flags.is_empty());
    assert!(report.deals.is_empty());
}
