//! Core traits and types for location seeding
//!
//! This module defines the location record model, the request payload sent
//! to the registry, and the `LocationRegistry` abstraction the publisher
//! drives.

use crate::core::error::SeedError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Administrative Levels
// ============================================================================

/// Administrative tier of a location record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationLevel {
    Province,
    District,
    Sector,
    Cell,
    Village,
    /// Tag that did not match any known tier (uppercased, as read)
    Unrecognized(String),
}

impl LocationLevel {
    /// All known levels in hierarchy order
    pub const HIERARCHY: [LocationLevel; 5] = [
        LocationLevel::Province,
        LocationLevel::District,
        LocationLevel::Sector,
        LocationLevel::Cell,
        LocationLevel::Village,
    ];

    /// Parse a raw level tag. Never fails; unknown tags are preserved.
    pub fn parse(raw: &str) -> Self {
        let tag = raw.trim().to_uppercase();
        match tag.as_str() {
            "PROVINCE" => Self::Province,
            "DISTRICT" => Self::District,
            "SECTOR" => Self::Sector,
            "CELL" => Self::Cell,
            "VILLAGE" => Self::Village,
            _ => Self::Unrecognized(tag),
        }
    }

    /// Position in the fixed hierarchy (`PROVINCE=0` .. `VILLAGE=4`)
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Province => Some(0),
            Self::District => Some(1),
            Self::Sector => Some(2),
            Self::Cell => Some(3),
            Self::Village => Some(4),
            Self::Unrecognized(_) => None,
        }
    }

    /// Uppercase tag as sent to the registry
    pub fn as_str(&self) -> &str {
        match self {
            Self::Province => "PROVINCE",
            Self::District => "DISTRICT",
            Self::Sector => "SECTOR",
            Self::Cell => "CELL",
            Self::Village => "VILLAGE",
            Self::Unrecognized(tag) => tag,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.rank().is_some()
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// One normalized row of the input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub level: LocationLevel,
    pub code: String,
    pub name: String,
    /// Empty when the record has no parent
    pub parent_code: String,
    /// 1-based line in the source file (0 when not loaded from a file)
    #[serde(default)]
    pub line: u64,
}

impl LocationRecord {
    pub fn new(level: &str, code: &str, name: &str, parent_code: &str) -> Self {
        Self {
            level: LocationLevel::parse(level),
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            parent_code: parent_code.trim().to_string(),
            line: 0,
        }
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = line;
        self
    }

    /// Parent reference, `None` when empty
    pub fn parent_code(&self) -> Option<&str> {
        if self.parent_code.is_empty() {
            None
        } else {
            Some(&self.parent_code)
        }
    }

    /// JSON body for the save-location call
    pub fn to_payload(&self) -> LocationPayload {
        LocationPayload {
            location_code: self.code.clone(),
            location_type: self.level.as_str().to_string(),
            location_name: self.name.clone(),
        }
    }

    /// Full request: payload plus the optional parent addressing parameter
    pub fn to_request(&self) -> SaveLocationRequest {
        SaveLocationRequest {
            payload: self.to_payload(),
            parent_code: self.parent_code().map(str::to_string),
        }
    }
}

// ============================================================================
// Registry Requests
// ============================================================================

/// Request body accepted by the registry's `saveLocation` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub location_code: String,
    pub location_type: String,
    pub location_name: String,
}

/// A single save-location call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveLocationRequest {
    pub payload: LocationPayload,
    /// Sent as the `parentCode` query parameter, never in the body
    pub parent_code: Option<String>,
}

/// Successful (2xx) registry response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: String,
}

/// Remote registry that accepts location create calls
///
/// Implementations classify failures into `SeedError::ServerRejected`,
/// `SeedError::NoResponse` or `SeedError::RequestSetupFailed`.
#[async_trait]
pub trait LocationRegistry: Send + Sync {
    /// Registry identifier used in logs
    fn name(&self) -> &str;

    async fn save_location(
        &self,
        request: &SaveLocationRequest,
    ) -> Result<RegistryResponse, SeedError>;
}
