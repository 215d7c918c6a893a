// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Company;
use crate::store::companies::{
    CompanyScreen, apply_tag, insert_company, list_companies, screen_companies,
};
use crate::utils::{
    fmt_millions, fmt_opt, maybe_print_json, now, output_flags, parse_amount, pretty_table,
    split_list,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub),
        Some(("list", sub)) => {
            let rows = list_companies(conn, *sub.get_one::<usize>("limit").unwrap())?;
            print_companies(sub, &rows)
        }
        Some(("screen", sub)) => {
            let rows = query_screen(conn, sub)?;
            print_companies(sub, &rows)
        }
        Some(("tag", sub)) => tag(conn, sub),
        _ => Ok(()),
    }
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let text = |id: &str| {
        sub.get_one::<String>(id)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let amount = |id: &str| text(id).map(|v| parse_amount(&v)).transpose();
    let company = Company {
        id: 0,
        company_name: text("name").ok_or_else(|| anyhow!("Company name is required"))?,
        ticker: text("ticker").map(|t| t.to_uppercase()),
        industry: text("industry"),
        sector: text("sector"),
        geography: text("geography"),
        market_cap: amount("market-cap")?,
        revenue: amount("revenue")?,
        ebitda: amount("ebitda")?,
        employees: sub.get_one::<i64>("employees").copied(),
        index_membership: text("index"),
        tags: None,
        watchlist: false,
        last_updated: now(),
    };
    insert_company(conn, &company)?;
    println!("Added company {}", company.company_name);
    Ok(())
}

pub fn query_screen(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Company>> {
    let amount = |id: &str| -> Result<f64> {
        Ok(sub
            .get_one::<String>(id)
            .map(|s| parse_amount(s))
            .transpose()?
            .unwrap_or(0.0))
    };
    let q = CompanyScreen {
        industries: split_list(sub.get_one::<String>("industries")),
        min_revenue: amount("min-revenue")?,
        max_revenue: amount("max-revenue")?,
        index_membership: sub.get_one::<String>("index").cloned(),
        watchlist_only: sub.get_flag("watchlist"),
    };
    Ok(screen_companies(conn, &q)?)
}

fn tag(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let tag = sub.get_one::<String>("tag").unwrap();
    let companies = split_list(sub.get_one::<String>("companies"));
    if companies.is_empty() {
        return Err(anyhow!("No company names given"));
    }
    for company in &companies {
        apply_tag(conn, company, tag).with_context(|| format!("Tag '{}'", company))?;
    }
    println!("Tagged {} companies with '{}'", companies.len(), tag.trim());
    Ok(())
}

fn print_companies(sub: &clap::ArgMatches, rows: &[Company]) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    if maybe_print_json(json_flag, jsonl_flag, &rows)? {
        return Ok(());
    }
    let data = rows
        .iter()
        .map(|c| {
            vec![
                c.company_name.clone(),
                fmt_opt(&c.ticker),
                fmt_opt(&c.industry),
                fmt_opt(&c.geography),
                fmt_millions(c.market_cap),
                fmt_millions(c.revenue),
                fmt_opt(&c.index_membership),
                c.tag_list().join(", "),
                if c.watchlist { "yes".into() } else { String::new() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &[
                "Company", "Ticker", "Industry", "Geography", "Market Cap", "Revenue", "Index",
                "Tags", "Watch"
            ],
            data
        )
    );
    Ok(())
}
