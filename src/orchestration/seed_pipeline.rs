//! Seed Pipeline - Main orchestrator for a seeding run
//!
//! Manages the complete workflow:
//! - Load the input file (fatal on error)
//! - Sequence the batch by hierarchy tier
//! - Publish every record, one at a time
//! - Persist the run report when configured

use crate::core::config::SeederConfig;
use crate::core::error::SeedError;
use crate::core::traits::{LocationRecord, LocationRegistry};
use crate::ingest::record_loader::RecordLoader;
use crate::ingest::record_validator::{RecordIssue, RecordValidator};
use crate::orchestration::hierarchy_sequencer::{HierarchySequencer, LevelCounts};
use crate::orchestration::location_publisher::{LocationPublisher, PublishOptions};
use crate::orchestration::seed_report::SeedReport;
use crate::registry::http_client::HttpRegistryClient;
use tracing::{info, warn};

/// Process exit codes
pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
/// The batch completed with failed or malformed records
pub const EXIT_INCOMPLETE: i32 = 2;

/// Result of checking an input file without publishing it
#[derive(Debug)]
pub struct CheckSummary {
    /// Sequenced records
    pub records: Vec<LocationRecord>,
    pub counts: LevelCounts,
    pub issues: Vec<RecordIssue>,
}

impl CheckSummary {
    pub fn exit_code(&self) -> i32 {
        if self.issues.is_empty() {
            EXIT_OK
        } else {
            EXIT_INCOMPLETE
        }
    }
}

/// Main seeding orchestrator
pub struct SeedPipeline<R: LocationRegistry> {
    config: SeederConfig,
    loader: RecordLoader,
    publisher: LocationPublisher<R>,
}

impl SeedPipeline<HttpRegistryClient> {
    /// Pipeline talking to the configured HTTP registry
    pub fn from_config(config: SeederConfig) -> Result<Self, SeedError> {
        let client = HttpRegistryClient::new(config.base_url.clone(), config.request_timeout())?;
        Self::with_registry(config, client)
    }
}

impl<R: LocationRegistry> SeedPipeline<R> {
    pub fn with_registry(config: SeederConfig, registry: R) -> Result<Self, SeedError> {
        let options = PublishOptions {
            request_delay: config.request_delay(),
            dry_run: config.dry_run,
        };

        Ok(Self {
            loader: RecordLoader::new().with_delimiter(config.delimiter_byte()?),
            publisher: LocationPublisher::new(registry, options),
            config,
        })
    }

    pub fn config(&self) -> &SeederConfig {
        &self.config
    }

    /// Load and sequence the input, without publishing
    pub async fn prepare(&self) -> Result<Vec<LocationRecord>, SeedError> {
        let records = self.loader.load(&self.config.input_path).await?;
        Ok(HierarchySequencer::sequenced(records))
    }

    /// Load, sequence and validate the input; never contacts the registry
    pub async fn check(&self) -> Result<CheckSummary, SeedError> {
        let records = self.prepare().await?;
        let counts = HierarchySequencer::level_counts(&records);
        let issues = RecordValidator::validate_batch(&records);

        Ok(CheckSummary {
            records,
            counts,
            issues,
        })
    }

    /// Run the whole pipeline
    ///
    /// Only load failures are returned as errors. Per-record failures and a
    /// failure to write the report are reflected in logs and the report.
    pub async fn run(&self) -> Result<SeedReport, SeedError> {
        let records = self.prepare().await?;
        info!(records = records.len(), "Batch ready");

        let report = self.publisher.publish_all(&records).await;

        if let Some(path) = &self.config.report_path {
            match report.write_json(path).await {
                Ok(()) => info!(path = %path.display(), "Report written"),
                Err(e) => warn!(error = %e, error_code = e.code(), "Failed to write report"),
            }
        }

        Ok(report)
    }
}
