// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::schema::get_template;
use crate::store::deals::load_deals;
use crate::utils::fmt_opt;
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("template", sub)) => export_template(sub),
        Some(("deals", sub)) => export_deals(conn, sub),
        _ => Ok(()),
    }
}

fn export_template(sub: &clap::ArgMatches) -> Result<()> {
    let source = sub.get_one::<String>("source").unwrap();
    let out = sub.get_one::<String>("out").unwrap();
    let template = get_template(source)?;
    let file = std::fs::File::create(out).with_context(|| format!("Create {}", out))?;
    template.write_csv(file)?;
    println!("Wrote {} template to {}", source, out);
    Ok(())
}

fn export_deals(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let deals = load_deals(conn)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "deal_id",
                "target_name",
                "acquirer_name",
                "deal_value",
                "announcement_date",
                "completion_date",
                "industry",
                "sector",
                "geography",
                "deal_type",
                "status",
                "source",
                "tags",
                "notes",
            ])?;
            for d in &deals {
                wtr.write_record([
                    d.deal_id.clone(),
                    d.target_name.clone(),
                    d.acquirer_name.clone(),
                    fmt_opt(&d.deal_value),
                    fmt_opt(&d.announcement_date),
                    fmt_opt(&d.completion_date),
                    fmt_opt(&d.industry),
                    fmt_opt(&d.sector),
                    fmt_opt(&d.geography),
                    fmt_opt(&d.deal_type),
                    fmt_opt(&d.status),
                    d.source.clone(),
                    fmt_opt(&d.tags),
                    fmt_opt(&d.notes),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&deals)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported {} deals to {}", deals.len(), out);
    Ok(())
}
