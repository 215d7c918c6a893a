// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::models::EntityType;
use crate::store::watchlist::{add_entry, list_entries};
use crate::utils::{fmt_opt, maybe_print_json, now, output_flags, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let user = |sub: &clap::ArgMatches| {
        sub.get_one::<String>("user")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| settings.user_id.clone())
    };
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind = sub
                .get_one::<String>("type")
                .unwrap()
                .parse::<EntityType>()
                .map_err(|e| anyhow!(e))?;
            let name = sub.get_one::<String>("name").unwrap();
            let notes = sub.get_one::<String>("notes").map(|s| s.as_str());
            add_entry(conn, &user(sub), kind, name, notes, now())?;
            println!("Watching {} {}", kind, name.trim());
            Ok(())
        }
        Some(("list", sub)) => {
            let entries = list_entries(conn, &user(sub))?;
            let (json_flag, jsonl_flag) = output_flags(sub);
            if !maybe_print_json(json_flag, jsonl_flag, &entries)? {
                let rows = entries
                    .iter()
                    .map(|e| {
                        vec![
                            e.entity_type.to_string(),
                            e.entity_name.clone(),
                            fmt_opt(&e.notes),
                            e.added_date.format("%Y-%m-%d").to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Type", "Name", "Notes", "Added"], rows));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
