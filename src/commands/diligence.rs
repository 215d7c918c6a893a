// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::deals::{DEAL_HEADERS, deal_rows};
use crate::models::{Deal, Filing};
use crate::store::deals::company_history;
use crate::store::filings::{filings_for, red_flags_for};
use crate::utils::{fmt_opt, maybe_print_json, output_flags, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

/// Filings shown per company.
pub const RECENT_FILINGS: usize = 10;

#[derive(Debug, Serialize)]
pub struct DiligenceReport {
    pub company: String,
    pub filings: Vec<Filing>,
    pub red_flags: Vec<String>,
    pub deals: Vec<Deal>,
    pub total_deal_value: f64,
}

pub fn build_report(conn: &Connection, company: &str) -> Result<DiligenceReport> {
    let company = company.trim();
    let filings = filings_for(conn, company, RECENT_FILINGS)?;
    let red_flags = red_flags_for(&filings);
    let deals = company_history(conn, company)?;
    let total_deal_value = deals.iter().filter_map(|d| d.deal_value).sum();
    Ok(DiligenceReport {
        company: company.to_string(),
        filings,
        red_flags,
        deals,
        total_deal_value,
    })
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let company = m.get_one::<String>("company").unwrap();
    let report = build_report(conn, company)?;
    let (json_flag, jsonl_flag) = output_flags(m);
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }

    println!("Due diligence: {}", report.company);
    if report.red_flags.is_empty() {
        println!("No red flags in recent filings");
    } else {
        println!("Red flags: {}", report.red_flags.join(", "));
    }
    let rows = report
        .filings
        .iter()
        .map(|f| {
            vec![
                fmt_opt(&f.filing_date),
                f.company_name.clone(),
                fmt_opt(&f.filing_type),
                fmt_opt(&f.red_flags),
                fmt_opt(&f.deal_mentions),
                f.source.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Date", "Company", "Type", "Red Flags", "Deal Mentions", "Source"],
            rows
        )
    );
    println!(
        "{} deals, ${:.1}M total disclosed value",
        report.deals.len(),
        report.total_deal_value
    );
    if !report.deals.is_empty() {
        println!("{}", pretty_table(DEAL_HEADERS, deal_rows(&report.deals)));
    }
    Ok(())
}
