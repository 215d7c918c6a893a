// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::alerts::{
    AlertRun, DEAL_KEYWORD_PRESETS, LogNotifier, Notifier, RunMode, evaluate_recent,
    preset_keywords, run_all_alerts, trending_keywords,
};
use crate::commands::deals::{DEAL_HEADERS, deal_rows};
use crate::commands::reports::Reports;
use crate::config::Settings;
use crate::db::change_marker;
use crate::models::{Alert, AlertFilters, NewAlert};
use crate::store::alerts::{create_alert, delete_alert, get_alert, list_alerts};
use crate::store::deals::{load_deals, recent_deals};
use crate::utils::{
    days_before, fmt_opt, maybe_print_json, now, output_flags, parse_amount, pretty_table,
    split_list, today,
};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    match m.subcommand() {
        Some(("create", sub)) => {
            let id = create(conn, sub, &settings)?;
            println!("Created alert {}", id);
            Ok(())
        }
        Some(("list", sub)) => {
            let user = user_arg(sub, &settings);
            let alerts = list_alerts(conn, &user)?;
            print_alerts(sub, &alerts)
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_alert(conn, id)?;
            println!("Deleted alert {}", id);
            Ok(())
        }
        Some(("test", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let days = sub
                .get_one::<i64>("days")
                .copied()
                .unwrap_or(settings.alert_recency_days);
            let alert = get_alert(conn, id)?;
            let deals = load_deals(conn)?;
            let matches = evaluate_recent(&alert, &deals, today(), days);
            let (json_flag, jsonl_flag) = output_flags(sub);
            if !maybe_print_json(json_flag, jsonl_flag, &matches)? {
                println!(
                    "Alert '{}': {} matches in the last {} days",
                    alert.alert_name,
                    matches.len(),
                    days
                );
                if !matches.is_empty() {
                    println!("{}", pretty_table(DEAL_HEADERS, deal_rows(&matches)));
                }
            }
            Ok(())
        }
        Some(("run", sub)) => {
            let mode = if sub.get_flag("all") {
                RunMode::All
            } else {
                RunMode::Recent {
                    today: today(),
                    days: settings.alert_recency_days,
                }
            };
            let run = run_once(conn, mode, &LogNotifier)?;
            let (json_flag, jsonl_flag) = output_flags(sub);
            if !maybe_print_json(json_flag, jsonl_flag, &run)? {
                print_run(&run);
            }
            Ok(())
        }
        Some(("watch", sub)) => {
            let interval = sub
                .get_one::<u64>("interval")
                .copied()
                .unwrap_or(settings.watch_interval_secs);
            let iterations = sub.get_one::<u64>("iterations").copied();
            watch(conn, &settings, interval, iterations)
        }
        Some(("trending", sub)) => {
            let days = *sub.get_one::<i64>("days").unwrap();
            let deals = recent_deals(conn, days_before(today(), days))?;
            let trending = trending_keywords(&deals);
            let (json_flag, jsonl_flag) = output_flags(sub);
            if !maybe_print_json(json_flag, jsonl_flag, &trending)? {
                let rows = trending
                    .into_iter()
                    .map(|(k, n)| vec![k, n.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Keyword", "Mentions"], rows));
            }
            Ok(())
        }
        Some(("presets", sub)) => {
            let (json_flag, jsonl_flag) = output_flags(sub);
            let presets: Vec<(&str, &[&str])> = DEAL_KEYWORD_PRESETS.to_vec();
            if !maybe_print_json(json_flag, jsonl_flag, &presets)? {
                let rows = presets
                    .iter()
                    .map(|(name, words)| vec![name.to_string(), words.join(", ")])
                    .collect();
                println!("{}", pretty_table(&["Preset", "Keywords"], rows));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn user_arg(sub: &clap::ArgMatches, settings: &Settings) -> String {
    sub.get_one::<String>("user")
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| settings.user_id.clone())
}

/// Builds the alert from `--keywords` plus expanded `--preset` categories.
pub fn create(conn: &Connection, sub: &clap::ArgMatches, settings: &Settings) -> Result<i64> {
    let mut keywords = split_list(sub.get_one::<String>("keywords"));
    for preset in split_list(sub.get_one::<String>("preset")) {
        let words = preset_keywords(&preset).ok_or_else(|| {
            anyhow!(
                "Unknown preset '{}' (known: {})",
                preset,
                DEAL_KEYWORD_PRESETS
                    .iter()
                    .map(|(n, _)| *n)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        keywords.extend(words.iter().map(|w| w.to_string()));
    }
    let amount = |id: &str| {
        sub.get_one::<String>(id)
            .map(|s| parse_amount(s))
            .transpose()
    };
    let new = NewAlert {
        user_id: user_arg(sub, settings),
        alert_name: sub.get_one::<String>("name").unwrap().trim().to_string(),
        keywords,
        filters: AlertFilters {
            industries: split_list(sub.get_one::<String>("industries")),
            geographies: split_list(sub.get_one::<String>("geographies")),
            min_deal_size: amount("min-size")?.unwrap_or(0.0),
            max_deal_size: amount("max-size")?,
            email_address: sub.get_one::<String>("email").map(|e| e.trim().to_string()),
        },
        email_notifications: sub.get_flag("notify"),
    };
    Ok(create_alert(conn, &new, now())?)
}

/// One pass of every alert over all stored deals.
pub fn run_once(conn: &Connection, mode: RunMode, notifier: &dyn Notifier) -> Result<AlertRun> {
    let deals = load_deals(conn)?;
    Ok(run_all_alerts(conn, &deals, mode, now(), notifier)?)
}

/// Repeated recent-mode passes over one deal cache. The cache sizing follows
/// `cache_mode`; it is dropped whenever the database changed since the last
/// pass.
pub struct Watch<'a> {
    conn: &'a Connection,
    reports: Reports<'a>,
    days: i64,
    seen: Option<(i64, i64)>,
}

impl<'a> Watch<'a> {
    pub fn new(conn: &'a Connection, settings: &Settings) -> Self {
        Watch {
            conn,
            reports: Reports::from_settings(conn, settings),
            days: settings.alert_recency_days,
            seen: None,
        }
    }

    pub fn reports(&self) -> &Reports<'a> {
        &self.reports
    }

    pub fn tick(&mut self, today: NaiveDate, notifier: &dyn Notifier) -> Result<AlertRun> {
        let marker = change_marker(self.conn)?;
        if self.seen.is_some_and(|seen| seen != marker) {
            tracing::debug!("database changed, dropping cached deals");
            self.reports.deals_changed();
        }
        let deals = self.reports.deals()?;
        let mode = RunMode::Recent {
            today,
            days: self.days,
        };
        let run = run_all_alerts(self.conn, &deals, mode, now(), notifier)?;
        // trigger bookkeeping above must not count as a change
        self.seen = Some(change_marker(self.conn)?);
        Ok(run)
    }
}

fn watch(
    conn: &Connection,
    settings: &Settings,
    interval: u64,
    iterations: Option<u64>,
) -> Result<()> {
    let mut watch = Watch::new(conn, settings);
    let mut done = 0u64;
    loop {
        match watch.tick(today(), &LogNotifier) {
            Ok(run) => print_run(&run),
            // a failed pass is retried on the next tick
            Err(e) => tracing::warn!(error = %e, "alert pass failed"),
        }
        done += 1;
        if iterations.is_some_and(|n| done >= n) {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(interval));
    }
}

fn print_run(run: &AlertRun) {
    let rows = run
        .matches
        .iter()
        .map(|(id, m)| {
            vec![
                id.to_string(),
                m.alert_name.clone(),
                m.user_id.clone(),
                m.deals.len().to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["ID", "Alert", "User", "Matches"], rows));
    for f in &run.failures {
        eprintln!("alert {} ({}) failed: {}", f.alert_id, f.alert_name, f.error);
    }
    for n in &run.notifications {
        println!("Notification to {}: {}", n.to, n.subject);
    }
}

fn print_alerts(sub: &clap::ArgMatches, alerts: &[Alert]) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    if maybe_print_json(json_flag, jsonl_flag, &alerts)? {
        return Ok(());
    }
    let rows = alerts
        .iter()
        .map(|a| {
            let f = &a.filters;
            let size = match f.max_deal_size {
                Some(max) => format!("${}M - ${}M", f.min_deal_size, max),
                None => format!("${}M+", f.min_deal_size),
            };
            vec![
                a.id.to_string(),
                a.alert_name.clone(),
                a.keywords.join(", "),
                if f.industries.is_empty() {
                    "All".into()
                } else {
                    f.industries.join(", ")
                },
                size,
                fmt_opt(&a.last_triggered),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Keywords", "Industries", "Deal Size", "Last Triggered"],
            rows
        )
    );
    Ok(())
}
