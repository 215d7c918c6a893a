// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use dealflow::{cli, commands, db};

const LOG_ENV: &str = "DEALFLOW_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries --json output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("deal", sub)) => commands::deals::handle(&conn, sub)?,
        Some(("company", sub)) => commands::companies::handle(&conn, sub)?,
        Some(("alerts", sub)) => commands::alerts::handle(&conn, sub)?,
        Some(("watchlist", sub)) => commands::watchlist::handle(&conn, sub)?,
        Some(("diligence", sub)) => commands::diligence::handle(&conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("sample", sub)) => commands::sample::handle(&mut conn, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
