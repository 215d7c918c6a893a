// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Deal, KNOWN_STATUSES};
use crate::store::deals::{
    DealSearch, company_history, delete_deal, generate_deal_id, insert_deal, recent_deals,
    search_deals,
};
use crate::utils::{
    days_before, fmt_millions, fmt_opt, maybe_print_json, now, output_flags, parse_amount,
    parse_date, pretty_table, split_list, today,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub const MANUAL_SOURCE: &str = "Manual Entry";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub),
        Some(("list", sub)) => {
            let limit = *sub.get_one::<usize>("limit").unwrap();
            let deals = search_deals(
                conn,
                &DealSearch {
                    limit: Some(limit),
                    ..DealSearch::default()
                },
            )?;
            print_deals(sub, &deals)
        }
        Some(("search", sub)) => {
            let deals = query_search(conn, sub)?;
            print_deals(sub, &deals)
        }
        Some(("recent", sub)) => {
            let days = *sub.get_one::<i64>("days").unwrap();
            let deals = recent_deals(conn, days_before(today(), days))?;
            print_deals(sub, &deals)
        }
        Some(("history", sub)) => {
            let company = sub.get_one::<String>("company").unwrap();
            let deals = company_history(conn, company)?;
            print_deals(sub, &deals)
        }
        Some(("rm", sub)) => {
            let deal_id = sub.get_one::<String>("deal-id").unwrap().trim();
            delete_deal(conn, deal_id)?;
            println!("Deleted deal {}", deal_id);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let text = |id: &str| {
        sub.get_one::<String>(id)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let target = text("target").ok_or_else(|| anyhow!("Target name is required"))?;
    let acquirer = text("acquirer").ok_or_else(|| anyhow!("Acquirer name is required"))?;
    let deal_value = text("value").map(|v| parse_amount(&v)).transpose()?;
    if deal_value.is_some_and(|v| v < 0.0) {
        return Err(anyhow!("Deal value cannot be negative"));
    }
    let status = text("status");
    if let Some(s) = status.as_deref() {
        if !KNOWN_STATUSES.iter().any(|k| k.eq_ignore_ascii_case(s)) {
            eprintln!("note: '{}' is not one of {}", s, KNOWN_STATUSES.join(", "));
        }
    }
    let at = now();
    let deal = Deal {
        id: 0,
        deal_id: text("deal-id").unwrap_or_else(|| generate_deal_id(MANUAL_SOURCE, at, 0)),
        target_name: target,
        acquirer_name: acquirer,
        deal_value,
        announcement_date: text("date").map(|d| parse_date(&d)).transpose()?,
        completion_date: None,
        industry: text("industry"),
        sector: text("sector"),
        geography: text("geography"),
        deal_type: text("type"),
        status,
        tags: None,
        notes: text("notes"),
        source: MANUAL_SOURCE.to_string(),
        import_date: at,
    };
    let id = insert_deal(conn, &deal)?;
    tracing::info!(id, deal_id = %deal.deal_id, "deal added");
    println!("Added deal {} ({} / {})", deal.deal_id, deal.target_name, deal.acquirer_name);
    Ok(())
}

pub fn query_search(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Deal>> {
    let amount = |id: &str| {
        sub.get_one::<String>(id)
            .map(|s| parse_amount(s))
            .transpose()
    };
    let date = |id: &str| sub.get_one::<String>(id).map(|s| parse_date(s)).transpose();
    let q = DealSearch {
        keywords: split_list(sub.get_one::<String>("keywords")),
        industries: split_list(sub.get_one::<String>("industries")),
        min_value: amount("min-value")?,
        max_value: amount("max-value")?,
        date_from: date("from")?,
        date_to: date("to")?,
        limit: sub.get_one::<usize>("limit").copied(),
    };
    Ok(search_deals(conn, &q)?)
}

pub fn deal_rows(deals: &[Deal]) -> Vec<Vec<String>> {
    deals
        .iter()
        .map(|d| {
            vec![
                d.deal_id.clone(),
                fmt_opt(&d.announcement_date),
                d.target_name.clone(),
                d.acquirer_name.clone(),
                fmt_millions(d.deal_value),
                fmt_opt(&d.industry),
                fmt_opt(&d.status),
                d.source.clone(),
            ]
        })
        .collect()
}

pub const DEAL_HEADERS: &[&str] = &[
    "Deal ID", "Announced", "Target", "Acquirer", "Value", "Industry", "Status", "Source",
];

fn print_deals(sub: &clap::ArgMatches, deals: &[Deal]) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    if !maybe_print_json(json_flag, jsonl_flag, &deals)? {
        println!("{}", pretty_table(DEAL_HEADERS, deal_rows(deals)));
    }
    Ok(())
}
