pub mod core;
pub mod ingest;
pub mod orchestration;
pub mod registry;

pub use crate::core::*;
pub use ingest::{RecordIssue, RecordLoader, RecordValidator};
pub use orchestration::{
    CheckSummary, EXIT_FATAL, EXIT_INCOMPLETE, EXIT_OK, HierarchySequencer, LocationPublisher,
    PublishOptions, SeedPipeline, SeedReport,
};
pub use registry::HttpRegistryClient;
