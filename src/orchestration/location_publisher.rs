//! Location Publisher - Replays a sequenced batch against the registry
//!
//! Features:
//! - Strictly sequential, one awaited call per record
//! - Per-record error isolation (a failure never stops the batch)
//! - Fixed throttle delay after every attempt
//! - Dry-run mode that builds requests without sending them

use crate::core::error::SeedError;
use crate::core::traits::{LocationRecord, LocationRegistry};
use crate::ingest::record_validator::RecordValidator;
use crate::orchestration::seed_report::SeedReport;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Publisher options
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Pause after every attempt, successful or not
    pub request_delay: Duration,

    /// Build and log requests without calling the registry
    pub dry_run: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(crate::core::config::DEFAULT_REQUEST_DELAY_MS),
            dry_run: false,
        }
    }
}

/// Outcome of a single record
#[derive(Debug)]
pub enum PublishOutcome {
    Saved { status: u16 },
    Planned,
    Failed(SeedError),
    Malformed(SeedError),
}

/// LocationPublisher - Sends each record to a `LocationRegistry`
pub struct LocationPublisher<R: LocationRegistry> {
    registry: R,
    options: PublishOptions,
}

impl<R: LocationRegistry> LocationPublisher<R> {
    pub fn new(registry: R, options: PublishOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Publish every record in order
    ///
    /// `records` is expected to be sequenced already. Never fails: each
    /// record's outcome lands in the returned report.
    pub async fn publish_all(&self, records: &[LocationRecord]) -> SeedReport {
        let mut report = SeedReport::new(self.options.dry_run);

        info!(
            registry = self.registry.name(),
            records = records.len(),
            dry_run = self.options.dry_run,
            "Publishing locations"
        );

        for (index, record) in records.iter().enumerate() {
            let code = RecordValidator::display_code(record);

            match self.publish_one(record).await {
                PublishOutcome::Saved { status } => {
                    info!(
                        code = %code,
                        level = %record.level,
                        parent = record.parent_code().unwrap_or(""),
                        status,
                        "Location saved"
                    );
                    report.record_success(&code);
                }
                PublishOutcome::Planned => {
                    report.record_success(&code);
                    continue;
                }
                PublishOutcome::Malformed(e) => {
                    warn!(code = %code, line = record.line, error = %e, "Skipping malformed record");
                    let reason = match e {
                        SeedError::MalformedRecord { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    report.record_malformed(&code, record.line, &reason);
                    continue;
                }
                PublishOutcome::Failed(e) => {
                    Self::log_failure(&code, &e);
                    report.record_failure(&code, &e);
                }
            }

            if index + 1 < records.len() && !self.options.request_delay.is_zero() {
                sleep(self.options.request_delay).await;
            }
        }

        report.finish();

        info!(
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            malformed = report.malformed_count(),
            duration_ms = report.duration_ms,
            "Publishing finished"
        );

        report
    }

    /// Validate, build and (unless dry-run) send one record
    pub async fn publish_one(&self, record: &LocationRecord) -> PublishOutcome {
        if let Err(e) = RecordValidator::validate(record) {
            return PublishOutcome::Malformed(e);
        }

        let request = record.to_request();

        if self.options.dry_run {
            info!(
                code = %request.payload.location_code,
                level = %request.payload.location_type,
                parent = request.parent_code.as_deref().unwrap_or(""),
                "Dry run: would save location"
            );
            return PublishOutcome::Planned;
        }

        debug!(code = %request.payload.location_code, "Saving location");

        match self.registry.save_location(&request).await {
            Ok(response) => PublishOutcome::Saved {
                status: response.status,
            },
            Err(e) => PublishOutcome::Failed(e),
        }
    }

    fn log_failure(code: &str, e: &SeedError) {
        match e {
            SeedError::ServerRejected { status, body, .. } => {
                error!(code, status, body = %body, error_code = e.code(), "Registry rejected location");
            }
            SeedError::NoResponse { message, .. } => {
                error!(code, error = %message, error_code = e.code(), "No response from registry");
            }
            SeedError::RequestSetupFailed { message, .. } => {
                error!(code, error = %message, error_code = e.code(), "Request could not be sent");
            }
            other => {
                error!(code, error = %other, error_code = other.code(), "Failed to save location");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{RegistryResponse, SaveLocationRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Registry double that records calls and fails for chosen codes
    #[derive(Default)]
    struct FakeRegistry {
        calls: Mutex<Vec<SaveLocationRequest>>,
        reject: Vec<&'static str>,
        unreachable: Vec<&'static str>,
    }

    #[async_trait]
    impl LocationRegistry for FakeRegistry {
        fn name(&self) -> &str {
            "fake"
        }

        async fn save_location(
            &self,
            request: &SaveLocationRequest,
        ) -> Result<RegistryResponse, SeedError> {
            self.calls.lock().unwrap().push(request.clone());
            let code = request.payload.location_code.clone();

            if self.reject.iter().any(|c| *c == code) {
                return Err(SeedError::ServerRejected {
                    code,
                    status: 500,
                    body: "internal error".to_string(),
                });
            }
            if self.unreachable.iter().any(|c| *c == code) {
                return Err(SeedError::NoResponse {
                    code,
                    message: "timed out".to_string(),
                });
            }

            Ok(RegistryResponse {
                status: 201,
                body: "{}".to_string(),
            })
        }
    }

    fn no_delay() -> PublishOptions {
        PublishOptions {
            request_delay: Duration::ZERO,
            dry_run: false,
        }
    }

    fn batch() -> Vec<LocationRecord> {
        vec![
            LocationRecord::new("province", "RW01", "Kigali", ""),
            LocationRecord::new("district", "RW0101", "Nyarugenge", "RW01"),
            LocationRecord::new("sector", "RW010101", "Gitega", "RW0101"),
        ]
    }

    fn called_codes(registry: &FakeRegistry) -> Vec<String> {
        registry
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.payload.location_code.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_publishes_in_order() {
        let publisher = LocationPublisher::new(FakeRegistry::default(), no_delay());

        let report = publisher.publish_all(&batch()).await;

        assert!(report.success());
        assert_eq!(report.succeeded, vec!["RW01", "RW0101", "RW010101"]);
        assert_eq!(
            called_codes(publisher.registry()),
            vec!["RW01", "RW0101", "RW010101"]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let registry = FakeRegistry {
            reject: vec!["RW0101"],
            ..Default::default()
        };
        let publisher = LocationPublisher::new(registry, no_delay());

        let report = publisher.publish_all(&batch()).await;

        assert_eq!(called_codes(publisher.registry()).len(), 3);
        assert_eq!(report.succeeded, vec!["RW01", "RW010101"]);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed[0].code, "RW0101");
        assert_eq!(report.failed[0].status, Some(500));
        assert!(!report.success());
    }

    #[tokio::test]
    async fn test_no_response_is_recorded() {
        let registry = FakeRegistry {
            unreachable: vec!["RW01"],
            ..Default::default()
        };
        let publisher = LocationPublisher::new(registry, no_delay());

        let report = publisher.publish_all(&batch()).await;

        assert_eq!(report.failed[0].error_code, "NO_RESPONSE");
        assert_eq!(report.succeeded_count(), 2);
    }

    #[tokio::test]
    async fn test_parent_code_is_passed_separately() {
        let publisher = LocationPublisher::new(FakeRegistry::default(), no_delay());
        publisher.publish_all(&batch()).await;

        let calls = publisher.registry().calls.lock().unwrap();
        assert_eq!(calls[0].parent_code, None);
        assert_eq!(calls[1].parent_code.as_deref(), Some("RW01"));
        assert_eq!(calls[1].payload.location_type, "DISTRICT");
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let publisher = LocationPublisher::new(FakeRegistry::default(), no_delay());
        let mut records = batch();
        records.push(LocationRecord::new("zone", "Z1", "Zone", "").with_line(9));

        let report = publisher.publish_all(&records).await;

        assert_eq!(called_codes(publisher.registry()).len(), 3);
        assert_eq!(report.total, 4);
        assert_eq!(report.malformed_count(), 1);
        assert_eq!(report.malformed[0].line, 9);
        assert_eq!(report.malformed[0].reason, "unrecognized level 'ZONE'");
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let publisher = LocationPublisher::new(
            FakeRegistry::default(),
            PublishOptions {
                request_delay: Duration::from_secs(5),
                dry_run: true,
            },
        );

        let started = Instant::now();
        let report = publisher.publish_all(&batch()).await;

        assert!(called_codes(publisher.registry()).is_empty());
        assert!(report.dry_run);
        assert_eq!(report.succeeded_count(), 3);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_attempts() {
        let registry = FakeRegistry {
            reject: vec!["RW01"],
            ..Default::default()
        };
        let publisher = LocationPublisher::new(
            registry,
            PublishOptions {
                request_delay: Duration::from_millis(200),
                dry_run: false,
            },
        );

        let started = tokio::time::Instant::now();
        publisher.publish_all(&batch()).await;

        // Two pauses between three attempts, including after the failed one
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_millis(600));
    }
}
