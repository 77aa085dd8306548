//! Hierarchy Sequencer - Orders a batch so higher tiers are published first
//!
//! Ordering is by level rank only (`PROVINCE` .. `VILLAGE`); parent references
//! are not followed. Records with an unrecognized level sort after every ranked
//! record. The sort is stable, so input order is kept within a tier.

use crate::core::traits::{LocationLevel, LocationRecord};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Sort key used for records whose level has no rank
const UNRANKED: u8 = u8::MAX;

/// Number of records per tier in a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelCounts {
    /// Keyed by rank, so iteration follows the hierarchy
    pub ranked: BTreeMap<u8, usize>,
    pub unrecognized: usize,
}

impl LevelCounts {
    pub fn count(&self, level: &LocationLevel) -> usize {
        match level.rank() {
            Some(rank) => self.ranked.get(&rank).copied().unwrap_or(0),
            None => self.unrecognized,
        }
    }
}

pub struct HierarchySequencer;

impl HierarchySequencer {
    fn sort_key(record: &LocationRecord) -> u8 {
        record.level.rank().unwrap_or(UNRANKED)
    }

    /// Reorder `records` in place
    pub fn sequence(records: &mut [LocationRecord]) {
        for record in records.iter().filter(|r| !r.level.is_recognized()) {
            warn!(
                code = %record.code,
                line = record.line,
                level = %record.level,
                "Unrecognized level, record moved to the end of the batch"
            );
        }

        records.sort_by_key(Self::sort_key);

        debug!(records = records.len(), "Batch sequenced");
    }

    /// Owned variant of [`HierarchySequencer::sequence`]
    pub fn sequenced(mut records: Vec<LocationRecord>) -> Vec<LocationRecord> {
        Self::sequence(&mut records);
        records
    }

    /// True when no record is preceded by one of a lower tier
    pub fn is_ordered(records: &[LocationRecord]) -> bool {
        records
            .windows(2)
            .all(|pair| Self::sort_key(&pair[0]) <= Self::sort_key(&pair[1]))
    }

    /// Per-tier counts
    pub fn level_counts(records: &[LocationRecord]) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for record in records {
            match record.level.rank() {
                Some(rank) => *counts.ranked.entry(rank).or_insert(0) += 1,
                None => counts.unrecognized += 1,
            }
        }
        counts
    }
}
