// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::sample::load_sample;
use crate::utils::{now, today};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("load", sub)) => {
            let deals = *sub.get_one::<usize>("deals").unwrap();
            let companies = *sub.get_one::<usize>("companies").unwrap();
            let s = load_sample(conn, deals, companies, today(), now())?;
            println!(
                "Loaded {} sample deals and {} sample companies",
                s.deals, s.companies
            );
            Ok(())
        }
        _ => Ok(()),
    }
}
