// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::batch::Batch;
use crate::schema::SourceKind;
use serde::Serialize;
use std::fmt;

/// Share of null monetary values above which a batch is flagged.
pub const MAX_NULL_VALUE_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    MissingColumns(Vec<String>),
    SparseValues {
        column: String,
        nulls: usize,
        total: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingColumns(cols) => {
                write!(f, "Missing required columns: {}", cols.join(", "))
            }
            ValidationIssue::SparseValues {
                column,
                nulls,
                total,
            } => write!(
                f,
                "High percentage of missing {} values: {}/{}",
                column, nulls, total
            ),
        }
    }
}

/// Advisory outcome; ingestion may proceed regardless.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        ValidationReport {
            valid: issues.is_empty(),
            issues,
        }
    }
}

pub fn validate(batch: &Batch, source_name: &str) -> ValidationReport {
    match SourceKind::from_name(source_name) {
        Some(kind) => validate_kind(batch, kind),
        None => {
            tracing::debug!(source = source_name, "no schema registered, skipping validation");
            ValidationReport::from_issues(Vec::new())
        }
    }
}

pub fn validate_kind(batch: &Batch, kind: SourceKind) -> ValidationReport {
    let mut issues = Vec::new();

    let missing: Vec<String> = kind
        .schema()
        .required
        .iter()
        .filter(|c| !batch.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        issues.push(ValidationIssue::MissingColumns(missing));
    }

    let column = kind.value_column();
    if let Some(nulls) = batch.null_count(column) {
        let total = batch.len();
        if nulls as f64 > total as f64 * MAX_NULL_VALUE_RATIO {
            issues.push(ValidationIssue::SparseValues {
                column: column.to_string(),
                nulls,
                total,
            });
        }
    }

    ValidationReport::from_issues(issues)
}
