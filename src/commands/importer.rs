// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::batch::FileFormat;
use crate::error::DealflowError;
use crate::ingest;
use crate::store::import::{ImportSummary, import_batch};
use crate::utils::{maybe_print_json, now, output_flags};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("file", sub)) => import_file(conn, sub).map(|_| ()),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub source: String,
    pub rows: usize,
    pub valid: bool,
    pub issues: Vec<String>,
    /// `None` on a dry run.
    pub stored: Option<ImportSummary>,
}

pub fn import_file(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<ImportOutcome> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let source = sub.get_one::<String>("source").unwrap().trim();
    let format = match sub.get_one::<String>("format") {
        Some(f) => f.parse::<FileFormat>()?,
        None => FileFormat::from_path(path)
            .ok_or_else(|| anyhow!("Cannot tell the format of '{}'; pass --format", path))?,
    };
    let bytes = std::fs::read(path).with_context(|| format!("Read {}", path))?;

    let upload = ingest::upload(&bytes, source, format, now())
        .with_context(|| format!("Process {}", path))?;

    if let Some(out) = sub.get_one::<String>("out") {
        let file = std::fs::File::create(out).with_context(|| format!("Create {}", out))?;
        upload.batch.write_csv(file)?;
    }

    let stored = if sub.get_flag("dry-run") {
        None
    } else {
        let kind = upload
            .kind
            .ok_or_else(|| DealflowError::NoDestination(source.to_string()))?;
        Some(import_batch(conn, &upload.batch, kind, now())?)
    };

    let outcome = ImportOutcome {
        source: source.to_string(),
        rows: upload.batch.len(),
        valid: upload.report.valid,
        issues: upload.report.issues.iter().map(|i| i.to_string()).collect(),
        stored,
    };

    let (json_flag, jsonl_flag) = output_flags(sub);
    if !maybe_print_json(json_flag, jsonl_flag, &outcome)? {
        for issue in &outcome.issues {
            eprintln!("warning: {}", issue);
        }
        match &outcome.stored {
            Some(s) => println!(
                "Imported {} rows into {} from {} ({} duplicates, {} incomplete)",
                s.inserted, s.table, path, s.duplicates, s.incomplete
            ),
            None => println!(
                "Checked {} rows from {}: {}",
                outcome.rows,
                path,
                if outcome.valid { "valid" } else { "has issues" }
            ),
        }
    }
    Ok(outcome)
}
