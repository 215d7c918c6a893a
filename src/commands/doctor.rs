// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::alerts::load_alert_rows;
use crate::store::{DataStatus, data_status};
use crate::utils::{maybe_print_json, output_flags, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub issue: String,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub status: DataStatus,
    pub findings: Vec<Finding>,
}

pub fn diagnose(conn: &Connection) -> Result<DoctorReport> {
    let status = data_status(conn)?;
    let mut findings = Vec::new();
    let mut push = |issue: &str, detail: String| {
        findings.push(Finding {
            issue: issue.to_string(),
            detail,
        })
    };

    // 1) Negative deal values written by other tools
    let mut stmt = conn.prepare("SELECT deal_id FROM deals WHERE deal_value < 0 ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: Option<String> = r.get(0)?;
        push("negative_deal_value", id.unwrap_or_default());
    }

    // 2) Deals no recency alert can ever see
    let undated: i64 = conn.query_row(
        "SELECT COUNT(*) FROM deals WHERE announcement_date IS NULL OR date(announcement_date) IS NULL",
        [],
        |r| r.get(0),
    )?;
    if undated > 0 {
        push("undated_deals", format!("{} deals", undated));
    }

    // 3) Alerts that cannot be decoded or can never match
    for row in load_alert_rows(conn, None)? {
        match row.decode() {
            Err(e) => push("alert_undecodable", format!("{} ({}): {}", row.id, row.alert_name, e)),
            Ok(a) => {
                if a.keywords.iter().all(|k| k.trim().is_empty()) {
                    push("alert_no_keywords", format!("{} ({})", a.id, a.alert_name));
                }
                if a.filters.max_deal_size.is_some_and(|max| a.filters.min_deal_size > max) {
                    push("alert_inverted_bounds", format!("{} ({})", a.id, a.alert_name));
                }
            }
        }
    }

    Ok(DoctorReport { status, findings })
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let report = diagnose(conn)?;
    let (json_flag, jsonl_flag) = output_flags(m);
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }

    let s = &report.status;
    let status_rows = vec![
        vec!["deals".into(), s.deals.to_string()],
        vec!["companies".into(), s.companies.to_string()],
        vec!["filings".into(), s.filings.to_string()],
        vec!["alerts".into(), s.alerts.to_string()],
        vec!["watchlist".into(), s.watchlist.to_string()],
        vec![
            "latest deal import".into(),
            s.latest_deal_import.clone().unwrap_or_else(|| "-".into()),
        ],
        vec![
            "latest company update".into(),
            s.latest_company_update.clone().unwrap_or_else(|| "-".into()),
        ],
    ];
    println!("{}", pretty_table(&["Data", "Status"], status_rows));

    if report.findings.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = report
            .findings
            .into_iter()
            .map(|f| vec![f.issue, f.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
