//! Per-record well-formedness checks
//!
//! A record is publishable when its level is one of the five known tiers and
//! both its code and name are non-empty. Malformed records are reported, never
//! fatal. A parent code that does not fit the level only produces a warning.

use crate::core::error::SeedError;
use crate::core::traits::{LocationLevel, LocationRecord};
use tracing::warn;

/// A malformed record found while validating a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    pub code: String,
    pub line: u64,
    pub reason: String,
}

pub struct RecordValidator;

impl RecordValidator {
    /// Check a single record before it is published
    pub fn validate(record: &LocationRecord) -> Result<(), SeedError> {
        let mut reasons = Vec::new();

        if !record.level.is_recognized() {
            reasons.push(format!("unrecognized level '{}'", record.level));
        }
        if record.code.is_empty() {
            reasons.push("empty location code".to_string());
        }
        if record.name.is_empty() {
            reasons.push("empty location name".to_string());
        }

        if reasons.is_empty() {
            if let Some(problem) = Self::parent_mismatch(record) {
                warn!(
                    code = %record.code,
                    level = %record.level,
                    parent = record.parent_code().unwrap_or(""),
                    line = record.line,
                    "{}",
                    problem
                );
            }
            Ok(())
        } else {
            Err(SeedError::MalformedRecord {
                code: Self::display_code(record),
                reason: reasons.join(", "),
            })
        }
    }

    /// Provinces are roots; every other known level needs a parent
    pub fn parent_mismatch(record: &LocationRecord) -> Option<&'static str> {
        match (&record.level, record.parent_code()) {
            (LocationLevel::Province, Some(_)) => Some("Province has a parent code"),
            (LocationLevel::Province, None) | (LocationLevel::Unrecognized(_), _) => None,
            (_, None) => Some("Missing parent code"),
            (_, Some(_)) => None,
        }
    }

    /// Every malformed record in `records`, in batch order
    pub fn validate_batch(records: &[LocationRecord]) -> Vec<RecordIssue> {
        records
            .iter()
            .filter_map(|record| match Self::validate(record) {
                Ok(()) => None,
                Err(SeedError::MalformedRecord { code, reason }) => Some(RecordIssue {
                    code,
                    line: record.line,
                    reason,
                }),
                Err(other) => Some(RecordIssue {
                    code: Self::display_code(record),
                    line: record.line,
                    reason: other.to_string(),
                }),
            })
            .collect()
    }

    /// Code used in logs; falls back to the source line for code-less rows
    pub fn display_code(record: &LocationRecord) -> String {
        if record.code.is_empty() {
            format!("<line {}>", record.line)
        } else {
            record.code.clone()
        }
    }
}
