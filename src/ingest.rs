// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Upload pipeline: read, normalize, validate. Nothing here persists.

use crate::batch::{Batch, FileFormat};
use crate::error::DealflowError;
use crate::normalize::normalize;
use crate::schema::SourceKind;
use crate::validate::{ValidationReport, validate};
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct Upload {
    pub batch: Batch,
    pub report: ValidationReport,
    /// `None` for sources outside the registry.
    pub kind: Option<SourceKind>,
}

/// Reads `bytes` as `format`, then normalizes and validates them for
/// `source_name`. Only unreadable input is an error; data problems are
/// reported in [`Upload::report`].
pub fn upload(
    bytes: &[u8],
    source_name: &str,
    format: FileFormat,
    now: NaiveDateTime,
) -> Result<Upload, DealflowError> {
    let raw = Batch::read(bytes, format)?;
    let kind = SourceKind::from_name(source_name);
    let rows = raw.len();
    let batch = normalize(raw, source_name, now);
    let report = validate(&batch, source_name);
    tracing::info!(
        source = source_name,
        rows,
        valid = report.valid,
        issues = report.issues.len(),
        "upload processed"
    );
    Ok(Upload {
        batch,
        report,
        kind,
    })
}
