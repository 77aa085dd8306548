//! Configuration structures for location-seeder
//!
//! `SeederConfigFile` is the partial, serde-facing shape used by every
//! configuration source. `SeederConfig` is the resolved configuration handed
//! to the pipeline.

use crate::core::error::SeedError;
use crate::core::logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default registry base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/locations";

/// Default input file
pub const DEFAULT_INPUT_PATH: &str = "locations.csv";

/// Pause between two publish attempts
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Field separator of the input file
pub const DEFAULT_DELIMITER: char = ',';

/// Partial configuration, as read from a YAML file, the environment or CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeederConfigFile {
    /// Registry base URL; `saveLocation` is appended to it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Input file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_path: Option<PathBuf>,

    /// Single ASCII field separator (`,` when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Where to write the JSON run report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Logging section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SeederConfig {
    pub base_url: String,
    pub input_path: PathBuf,
    pub delimiter: char,
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub report_path: Option<PathBuf>,
    pub dry_run: bool,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            delimiter: DEFAULT_DELIMITER,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            report_path: None,
            dry_run: false,
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl SeederConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8, SeedError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(SeedError::ConfigError(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }

    /// Apply every `Some` field of a partial configuration
    pub fn apply(&mut self, source: SeederConfigFile) {
        if let Some(base_url) = source.base_url {
            self.base_url = base_url;
        }
        if let Some(input_path) = source.input_path {
            self.input_path = input_path;
        }
        if let Some(delimiter) = source.delimiter {
            self.delimiter = delimiter;
        }
        if let Some(delay) = source.request_delay_ms {
            self.request_delay_ms = delay;
        }
        if let Some(timeout) = source.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if source.report_path.is_some() {
            self.report_path = source.report_path;
        }
        if let Some(dry_run) = source.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(logging) = source.logging {
            if let Some(level) = logging.level {
                self.log_level = level;
            }
            if let Some(format) = logging.format {
                self.log_format = format;
            }
        }
    }
}
