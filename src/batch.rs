// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! In-memory tabular batches and the upload readers that produce them.

use crate::error::DealflowError;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Cell {
    /// Text cells are trimmed; blank text becomes null.
    pub fn text(s: &str) -> Cell {
        let t = s.trim();
        if t.is_empty() {
            Cell::Null
        } else {
            Cell::Text(t.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.to_string()),
            Cell::Timestamp(t) => Some(t.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Timestamp(t) => Some(t.date()),
            Cell::Text(s) => crate::normalize::parse_date(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text().unwrap_or_default())
    }
}

/// Column-named rows; every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Batch {
    pub fn new(columns: Vec<String>) -> Self {
        Batch {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Pads or truncates to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn null_count(&self, name: &str) -> Option<usize> {
        self.column(name)
            .map(|cells| cells.into_iter().filter(|c| c.is_null()).count())
    }

    /// Rewrites an existing column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Adds a column, or replaces it when the name already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Cell::Null);
                }
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    pub fn rename_columns<F>(&mut self, f: F)
    where
        F: Fn(&str) -> String,
    {
        self.columns = self.columns.iter().map(|c| f(c)).collect();
    }

    pub fn read(bytes: &[u8], format: FileFormat) -> Result<Batch, DealflowError> {
        match format {
            FileFormat::Csv => Batch::from_csv(bytes),
            FileFormat::Json => Batch::from_json(bytes),
            FileFormat::Xlsx => Batch::from_xlsx(bytes),
        }
    }

    pub fn from_csv<R: Read>(rdr: R) -> Result<Batch, DealflowError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        let columns = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut batch = Batch::new(columns);
        for result in rdr.records() {
            let rec = result?;
            batch.push_row(rec.iter().map(Cell::text).collect());
        }
        Ok(batch)
    }

    /// Accepts an array of flat objects, or a single object. Columns follow
    /// first appearance.
    pub fn from_json(bytes: &[u8]) -> Result<Batch, DealflowError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let records = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(_) => vec![value],
            _ => {
                return Err(DealflowError::InvalidInput(
                    "JSON upload must be an array of records or a single record".into(),
                ));
            }
        };

        let mut columns: Vec<String> = Vec::new();
        for rec in &records {
            if let Some(obj) = rec.as_object() {
                for key in obj.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut batch = Batch::new(columns);
        for rec in &records {
            let Some(obj) = rec.as_object() else { continue };
            let row = batch
                .columns
                .iter()
                .map(|c| match obj.get(c) {
                    None | Some(serde_json::Value::Null) => Cell::Null,
                    Some(serde_json::Value::String(s)) => Cell::text(s),
                    Some(serde_json::Value::Number(n)) => {
                        n.as_f64().map(Cell::Number).unwrap_or(Cell::Null)
                    }
                    Some(other) => Cell::Text(other.to_string()),
                })
                .collect();
            batch.rows.push(row);
        }
        Ok(batch)
    }

    /// Reads the first worksheet; the first row is the header.
    pub fn from_xlsx(bytes: &[u8]) -> Result<Batch, DealflowError> {
        let mut wb = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| DealflowError::Spreadsheet(e.to_string()))?;
        let range = wb
            .worksheet_range_at(0)
            .ok_or_else(|| DealflowError::Spreadsheet("workbook has no sheets".into()))?
            .map_err(|e| DealflowError::Spreadsheet(e.to_string()))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Batch::default());
        };
        let columns = header
            .iter()
            .map(|c| xlsx_cell(c).as_text().unwrap_or_default())
            .collect();
        let mut batch = Batch::new(columns);
        for row in rows {
            batch.push_row(row.iter().map(xlsx_cell).collect());
        }
        Ok(batch)
    }

    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), DealflowError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn xlsx_cell(c: &Data) -> Cell {
    match c {
        Data::Empty => Cell::Null,
        Data::String(s) | Data::DateTimeIso(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::Timestamp)
            .unwrap_or(Cell::Null),
        other => Cell::text(&other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &str) -> Option<FileFormat> {
        let ext = path.rsplit('.').next()?;
        ext.parse().ok()
    }
}

impl FromStr for FileFormat {
    type Err = DealflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "excel" => Ok(FileFormat::Xlsx),
            "json" => Ok(FileFormat::Json),
            other => Err(DealflowError::UnsupportedFormat(other.to_string())),
        }
    }
}
