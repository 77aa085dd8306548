//! Orchestration layer for location seeding
//!
//! This module orders a loaded batch and drives it, record by record,
//! against a location registry.

pub mod hierarchy_sequencer;
pub mod location_publisher;
pub mod seed_pipeline;
pub mod seed_report;

// Re-export main types for convenience
pub use hierarchy_sequencer::{HierarchySequencer, LevelCounts};
pub use location_publisher::{LocationPublisher, PublishOptions, PublishOutcome};
pub use seed_pipeline::{CheckSummary, EXIT_FATAL, EXIT_INCOMPLETE, EXIT_OK, SeedPipeline};
pub use seed_report::{FailedLocation, MalformedLocation, SeedReport};
