//! Input side of the pipeline: reading and checking location records

pub mod record_loader;
pub mod record_validator;

pub use record_loader::RecordLoader;
pub use record_validator::{RecordIssue, RecordValidator};
