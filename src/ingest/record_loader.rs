//! Record Loader - Reads location rows from delimited text
//!
//! Features:
//! - Header-based column lookup (extra columns ignored)
//! - Whitespace trimming on every field
//! - Blank lines skipped
//! - Any IO or structural CSV error aborts the whole load

use crate::core::error::SeedError;
use crate::core::traits::LocationRecord;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const LEVEL_COLUMN: &str = "Level";
pub const CODE_COLUMN: &str = "LocationCode";
pub const NAME_COLUMN: &str = "LocationName";
pub const PARENT_COLUMN: &str = "ParentCode";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Positions of the required columns in the header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    level: usize,
    code: usize,
    name: usize,
    parent: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self, SeedError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| SeedError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        Ok(Self {
            level: find(LEVEL_COLUMN)?,
            code: find(CODE_COLUMN)?,
            name: find(NAME_COLUMN)?,
            parent: find(PARENT_COLUMN)?,
        })
    }
}

/// Loads the full batch of location records from a file
#[derive(Debug, Clone)]
pub struct RecordLoader {
    delimiter: u8,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl RecordLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a delimiter other than `,` (e.g. `b'\t'` or `b';'`)
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load every record from `path`, in file order
    pub async fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<LocationRecord>, SeedError> {
        let path = path.as_ref();

        let bytes = fs::read(path)
            .await
            .map_err(|e| SeedError::InputUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let records = self.parse(&bytes, path)?;
        info!(path = %path.display(), records = records.len(), "Loaded location records");

        Ok(records)
    }

    /// Parse already-read file contents. `source` is only used in errors and logs.
    pub fn parse(&self, bytes: &[u8], source: &Path) -> Result<Vec<LocationRecord>, SeedError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(bytes);

        let malformed = |e: csv::Error| SeedError::InputMalformed {
            path: PathBuf::from(source),
            message: e.to_string(),
        };

        let headers = reader.headers().map_err(malformed)?.clone();
        let columns = ColumnIndex::from_headers(&headers, source)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(malformed)?;

            if row.iter().all(str::is_empty) {
                continue;
            }

            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let field = |idx: usize| row.get(idx).unwrap_or("");

            let record = LocationRecord::new(
                field(columns.level),
                field(columns.code),
                field(columns.name),
                field(columns.parent),
            )
            .with_line(line);

            debug!(
                line,
                level = %record.level,
                code = %record.code,
                name = %record.name,
                parent = %record.parent_code,
                "Loaded record"
            );
            records.push(record);
        }

        Ok(records)
    }
}
