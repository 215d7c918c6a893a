// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Dollar amount in millions, as typed by a user ("1,250.5", "$300").
pub fn parse_amount(s: &str) -> Result<f64> {
    crate::normalize::parse_money(s, false).with_context(|| format!("Invalid amount '{}'", s))
}

/// Splits a comma-separated argument, dropping blanks.
pub fn split_list(s: Option<&String>) -> Vec<String> {
    s.map(|raw| crate::models::split_tags(raw))
        .unwrap_or_default()
}

/// Wall clock in UTC; every stored timestamp uses it.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The date `days` days before `today`, or `None` when it falls off the calendar.
pub fn days_before(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(days).and_then(|d| today.checked_sub_signed(d))
}

pub fn fmt_millions(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("${:.1}M", v),
        None => "-".to_string(),
    }
}

pub fn fmt_opt<T: std::fmt::Display>(v: &Option<T>) -> String {
    v.as_ref().map(|x| x.to_string()).unwrap_or_default()
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// `--json` / `--jsonl` switches of a subcommand, absent ones read as off.
pub fn output_flags(m: &clap::ArgMatches) -> (bool, bool) {
    let flag = |id: &str| matches!(m.try_get_one::<bool>(id), Ok(Some(true)));
    (flag("json"), flag("jsonl"))
}
