//! Error handling for location seeding
//!
//! Fatal load and configuration errors abort a run. Per-record errors are
//! recoverable: the publisher records them and moves on to the next record.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for seeding operations
#[derive(Error, Debug)]
pub enum SeedError {
    // Load errors
    #[error("failed to read input file {}: {message}", path.display())]
    InputUnreadable { path: PathBuf, message: String },

    #[error("input file {} is not valid delimited text: {message}", path.display())]
    InputMalformed { path: PathBuf, message: String },

    #[error("input file {} is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    // Record errors
    #[error("[{code}] malformed record: {reason}")]
    MalformedRecord { code: String, reason: String },

    // Publish errors
    #[error("[{code}] registry rejected the location (HTTP {status}): {body}")]
    ServerRejected {
        code: String,
        status: u16,
        body: String,
    },

    #[error("[{code}] no response from registry: {message}")]
    NoResponse { code: String, message: String },

    #[error("[{code}] request could not be sent: {message}")]
    RequestSetupFailed { code: String, message: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    ConfigError(String),

    // Report errors
    #[error("failed to write report {}: {message}", path.display())]
    ReportWriteFailed { path: PathBuf, message: String },
}

impl SeedError {
    /// Location code associated with a per-record error
    pub fn location_code(&self) -> Option<&str> {
        match self {
            Self::MalformedRecord { code, .. }
            | Self::ServerRejected { code, .. }
            | Self::NoResponse { code, .. }
            | Self::RequestSetupFailed { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Per-record errors never abort the batch
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. }
                | Self::ServerRejected { .. }
                | Self::NoResponse { .. }
                | Self::RequestSetupFailed { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::InputUnreadable { .. } => vec![
                "Check that the input path is correct",
                "Check file permissions",
            ],
            Self::InputMalformed { .. } => vec![
                "Make sure the file is UTF-8 comma-separated text",
                "Check for unbalanced quotes",
            ],
            Self::MissingColumn { .. } => vec![
                "The header row must contain Level, LocationCode, LocationName and ParentCode",
                "Column names are case-sensitive",
            ],
            Self::MalformedRecord { .. } => vec![
                "Level must be one of PROVINCE, DISTRICT, SECTOR, CELL, VILLAGE",
                "LocationCode and LocationName must not be empty",
            ],
            Self::ServerRejected { .. } => vec![
                "Inspect the response body for the rejection reason",
                "Check that the parent location was registered",
            ],
            Self::NoResponse { .. } => vec![
                "Check that the registry is reachable",
                "Increase --timeout-secs if the registry is slow",
            ],
            Self::RequestSetupFailed { .. } => vec!["Check the configured base URL"],
            Self::ConfigError(_) => vec![
                "Check .seeder-config.yaml and SEEDER_* environment variables",
            ],
            Self::ReportWriteFailed { .. } => {
                vec!["Check that the report directory is writable"]
            }
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputUnreadable { .. } => "INPUT_UNREADABLE",
            Self::InputMalformed { .. } => "INPUT_MALFORMED",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::MalformedRecord { .. } => "MALFORMED_RECORD",
            Self::ServerRejected { .. } => "SERVER_REJECTED",
            Self::NoResponse { .. } => "NO_RESPONSE",
            Self::RequestSetupFailed { .. } => "REQUEST_SETUP_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ReportWriteFailed { .. } => "REPORT_WRITE_FAILED",
        }
    }
}
