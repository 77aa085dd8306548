//! SeedReport - Outcome of one seeding run
//!
//! Features:
//! - Succeeded, failed and malformed records with reasons
//! - Markdown summary for the terminal
//! - Persistent storage in JSON format

use crate::core::error::SeedError;
use crate::orchestration::seed_pipeline::{EXIT_INCOMPLETE, EXIT_OK};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// A record the registry did not accept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLocation {
    pub code: String,
    /// `SeedError::code()` of the failure
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// A record skipped before publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLocation {
    pub code: String,
    pub line: u64,
    pub reason: String,
}

/// Per-run report returned by the publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub total: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedLocation>,
    pub malformed: Vec<MalformedLocation>,
    pub duration_ms: u64,
}

impl SeedReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            total: 0,
            succeeded: Vec::new(),
            failed: Vec::new(),
            malformed: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_success(&mut self, code: &str) {
        self.total += 1;
        self.succeeded.push(code.to_string());
    }

    pub fn record_failure(&mut self, code: &str, error: &SeedError) {
        self.total += 1;
        let status = match error {
            SeedError::ServerRejected { status, .. } => Some(*status),
            _ => None,
        };
        self.failed.push(FailedLocation {
            code: error.location_code().unwrap_or(code).to_string(),
            error_code: error.code().to_string(),
            message: error.to_string(),
            status,
        });
    }

    pub fn record_malformed(&mut self, code: &str, line: u64, reason: &str) {
        self.total += 1;
        self.malformed.push(MalformedLocation {
            code: code.to_string(),
            line,
            reason: reason.to_string(),
        });
    }

    /// Stamp the finish time and duration
    pub fn finish(&mut self) {
        let finished_at = Utc::now();
        self.duration_ms = (finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self.finished_at = Some(finished_at);
    }

    /// Every record was published
    pub fn success(&self) -> bool {
        self.failed.is_empty() && self.malformed.is_empty()
    }

    /// Exit code for a completed run; only `fail_on_error` makes an
    /// incomplete batch non-zero
    pub fn exit_code(&self, fail_on_error: bool) -> i32 {
        if fail_on_error && !self.success() {
            EXIT_INCOMPLETE
        } else {
            EXIT_OK
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed.len()
    }

    /// Generate markdown summary
    pub fn markdown_summary(&self) -> String {
        let mut md = String::new();

        md.push_str("# Location Seeding Report\n\n");
        md.push_str(&format!("Run: `{}`", self.run_id));
        if self.dry_run {
            md.push_str(" (dry run)");
        }
        md.push_str("\n\n");

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Total Records**: {}\n", self.total));
        md.push_str(&format!("- **Succeeded**: {}\n", self.succeeded_count()));
        md.push_str(&format!("- **Failed**: {}\n", self.failed_count()));
        md.push_str(&format!("- **Malformed**: {}\n", self.malformed_count()));
        md.push_str(&format!("- **Duration**: {}ms\n", self.duration_ms));

        if !self.failed.is_empty() {
            md.push_str("\n## Failed\n\n");
            md.push_str("| Code | Error | Message |\n");
            md.push_str("|------|-------|--------|\n");
            for failure in &self.failed {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    failure.code,
                    failure.error_code,
                    failure.message.replace('|', "\\|")
                ));
            }
        }

        if !self.malformed.is_empty() {
            md.push_str("\n## Malformed\n\n");
            md.push_str("| Code | Line | Reason |\n");
            md.push_str("|------|------|--------|\n");
            for record in &self.malformed {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    record.code, record.line, record.reason
                ));
            }
        }

        md.push_str(&format!(
            "\nOverall Status: {}\n",
            if self.success() { "✅ SUCCESS" } else { "❌ INCOMPLETE" }
        ));

        md
    }

    /// Write the report as pretty JSON, creating parent directories
    pub async fn write_json(&self, path: &Path) -> Result<(), SeedError> {
        let write_error = |message: String| SeedError::ReportWriteFailed {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, json)
            .await
            .map_err(|e| write_error(e.to_string()))
    }
}
