// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, Settings};
use crate::utils::{maybe_print_json, output_flags, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let entries = Settings::load(conn)?.entries();
            let (json_flag, jsonl_flag) = output_flags(sub);
            let map: BTreeMap<&str, &String> = entries.iter().map(|(k, v)| (*k, v)).collect();
            if !maybe_print_json(json_flag, jsonl_flag, &map)? {
                let rows = entries
                    .iter()
                    .map(|(k, v)| vec![k.to_string(), v.clone()])
                    .collect();
                println!("{}", pretty_table(&["Setting", "Value"], rows));
            }
        }
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            // fall back to the effective default for known keys
            let value = match config::get(conn, key)? {
                Some(v) => Some(v),
                None => Settings::load(conn)?
                    .entries()
                    .into_iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v),
            };
            match value {
                Some(v) => println!("{}", v),
                None => println!("(unset)"),
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            config::set(conn, key, value)?;
            println!("{} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}
