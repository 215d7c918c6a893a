// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Appends normalized batches to their destination tables.

use super::companies::insert_company;
use super::deals::{generate_deal_id, insert_deal_if_new};
use super::filings::insert_filing;
use crate::batch::{Batch, Cell};
use crate::error::DealflowError;
use crate::models::{Company, Deal, Filing};
use crate::schema::SourceKind;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub table: &'static str,
    pub inserted: usize,
    /// Deals whose `deal_id` was already stored.
    pub duplicates: usize,
    /// Rows without the name column the destination keys on.
    pub incomplete: usize,
}

pub fn destination(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Mergermarket | SourceKind::Preqin => "deals",
        SourceKind::IndexConstituents => "companies",
        SourceKind::SecFilings | SourceKind::PressReleases => "filings",
    }
}

/// Appends every row of an already-normalized batch in one transaction.
/// A storage error rolls the whole batch back.
pub fn import_batch(
    conn: &mut Connection,
    batch: &Batch,
    kind: SourceKind,
    now: NaiveDateTime,
) -> Result<ImportSummary, DealflowError> {
    let mut summary = ImportSummary {
        table: destination(kind),
        ..ImportSummary::default()
    };
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for row in 0..batch.len() {
        let view = RowView { batch, row };
        match kind {
            SourceKind::Mergermarket | SourceKind::Preqin => {
                let Some(deal) = deal_from(&view, kind, now, row) else {
                    summary.incomplete += 1;
                    continue;
                };
                match insert_deal_if_new(&tx, &deal)? {
                    Some(_) => summary.inserted += 1,
                    None => {
                        tracing::debug!(deal_id = %deal.deal_id, "duplicate deal skipped");
                        summary.duplicates += 1;
                    }
                }
            }
            SourceKind::IndexConstituents => {
                let Some(company) = company_from(&view, now) else {
                    summary.incomplete += 1;
                    continue;
                };
                insert_company(&tx, &company)?;
                summary.inserted += 1;
            }
            SourceKind::SecFilings | SourceKind::PressReleases => {
                let Some(filing) = filing_from(&view, kind, now) else {
                    summary.incomplete += 1;
                    continue;
                };
                insert_filing(&tx, &filing)?;
                summary.inserted += 1;
            }
        }
    }
    tx.commit()?;
    tracing::info!(
        source = %kind,
        table = summary.table,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        incomplete = summary.incomplete,
        "batch imported"
    );
    Ok(summary)
}

struct RowView<'a> {
    batch: &'a Batch,
    row: usize,
}

impl RowView<'_> {
    /// First non-null cell among `columns`.
    fn cell(&self, columns: &[&str]) -> Option<&Cell> {
        columns
            .iter()
            .filter_map(|c| self.batch.get(self.row, c))
            .find(|c| !c.is_null())
    }

    fn text(&self, columns: &[&str]) -> Option<String> {
        self.cell(columns).and_then(Cell::as_text)
    }

    fn number(&self, columns: &[&str]) -> Option<f64> {
        self.cell(columns).and_then(Cell::as_number)
    }

    fn date(&self, columns: &[&str]) -> Option<chrono::NaiveDate> {
        self.cell(columns).and_then(Cell::as_date)
    }

    fn timestamp(&self, fallback: NaiveDateTime) -> NaiveDateTime {
        match self.cell(&["import_date"]) {
            Some(Cell::Timestamp(t)) => *t,
            _ => fallback,
        }
    }
}

/// Target, acquirer, value and announcement columns.
const DEAL_COLUMNS: [&[&str]; 4] = [
    &["target_name"],
    &["acquirer_name"],
    &["deal_value"],
    &["announcement_date"],
];
const PREQIN_DEAL_COLUMNS: [&[&str]; 4] = [
    &["target_company"],
    &["fund_name"],
    &["investment_amount"],
    &["investment_date"],
];

fn deal_from(v: &RowView, kind: SourceKind, now: NaiveDateTime, seq: usize) -> Option<Deal> {
    let [target, acquirer, value, announced] = match kind {
        SourceKind::Preqin => PREQIN_DEAL_COLUMNS,
        _ => DEAL_COLUMNS,
    };
    let target_name = v.text(target)?;
    let source = v.text(&["source"]).unwrap_or_else(|| kind.label().to_string());
    let deal_id = v
        .text(&["deal_id"])
        .unwrap_or_else(|| generate_deal_id(kind.label(), now, seq));
    Some(Deal {
        id: 0,
        deal_id,
        target_name,
        acquirer_name: v.text(acquirer).unwrap_or_default(),
        deal_value: v.number(value).filter(|x| *x >= 0.0),
        announcement_date: v.date(announced),
        completion_date: v.date(&["completion_date", "exit_date"]),
        industry: v.text(&["industry"]),
        sector: v.text(&["sector"]),
        geography: v.text(&["geography"]),
        deal_type: v.text(&["deal_type", "fund_type", "stage"]),
        status: v.text(&["status"]),
        tags: v.text(&["tags"]),
        notes: v.text(&["notes"]),
        source,
        import_date: v.timestamp(now),
    })
}

fn company_from(v: &RowView, now: NaiveDateTime) -> Option<Company> {
    Some(Company {
        id: 0,
        company_name: v.text(&["company_name"])?,
        ticker: v.text(&["ticker"]),
        industry: v.text(&["industry"]),
        sector: v.text(&["sector"]),
        geography: v.text(&["geography", "country"]),
        market_cap: v.number(&["market_cap"]),
        revenue: v.number(&["revenue"]),
        ebitda: v.number(&["ebitda"]),
        employees: v.number(&["employees"]).map(|e| e as i64),
        index_membership: v.text(&["index_membership", "index_name"]),
        tags: v.text(&["tags"]),
        watchlist: false,
        last_updated: v.timestamp(now),
    })
}

fn filing_from(v: &RowView, kind: SourceKind, now: NaiveDateTime) -> Option<Filing> {
    let filing_type = match kind {
        SourceKind::PressReleases => Some(kind.label().to_string()),
        _ => v.text(&["filing_type", "form_type"]),
    };
    // press releases carry the outlet in `source`; provenance wins
    Some(Filing {
        id: 0,
        company_name: v.text(&["company_name"])?,
        cik: v.text(&["cik"]),
        ticker: v.text(&["ticker"]),
        filing_type,
        filing_date: v.date(&["filing_date", "date"]),
        content: v.text(&["content"]),
        red_flags: v.text(&["red_flags"]),
        deal_mentions: v.text(&["deal_mentions"]),
        source: kind.label().to_string(),
        url: v.text(&["url"]),
        import_date: v.timestamp(now),
    })
}
