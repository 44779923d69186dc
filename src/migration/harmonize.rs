//! Region harmonisation of migration records

use serde::{Deserialize, Serialize};

use crate::crosswalk::region::{RegionResolver, ResolutionStats};
use crate::models::{Gender, MigrationRecord};

/// Restricts migration records to a subset of movers
///
/// A bound on age or gender excludes records that do not report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrantFilter {
    pub min_age: Option<u16>,
    pub max_age: Option<u16>,
    pub gender: Option<Gender>,
}

impl MigrantFilter {
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.min_age.is_none() && self.max_age.is_none() && self.gender.is_none()
    }

    #[must_use]
    pub fn accepts(&self, record: &MigrationRecord) -> bool {
        if self.min_age.is_some() || self.max_age.is_some() {
            let Some(age) = record.age else {
                return false;
            };
            if self.min_age.is_some_and(|min| age < min) || self.max_age.is_some_and(|max| age > max)
            {
                return false;
            }
        }
        match self.gender {
            Some(wanted) => record.gender == Some(wanted),
            None => true,
        }
    }
}

/// Counts of what harmonisation kept and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarmonizeStats {
    pub total: usize,
    pub kept: usize,
    pub filtered: usize,
    /// Rows whose mover count was blank, negative or not a number
    pub invalid_persons: usize,
    pub unresolved: usize,
    pub same_region: usize,
}

impl HarmonizeStats {
    pub fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.kept += other.kept;
        self.filtered += other.filtered;
        self.invalid_persons += other.invalid_persons;
        self.unresolved += other.unresolved;
        self.same_region += other.same_region;
    }
}

/// Resolve both ends of a move.
///
/// Returns `None` when the record is excluded by the filter, when either
/// end cannot be resolved, or when both ends resolve to the same region.
pub fn harmonize_record(
    mut record: MigrationRecord,
    resolver: &RegionResolver,
    filter: &MigrantFilter,
    stats: &mut HarmonizeStats,
    regions: &mut ResolutionStats,
) -> Option<MigrationRecord> {
    stats.total += 1;
    if !filter.accepts(&record) {
        stats.filtered += 1;
        return None;
    }

    let origin = resolver.resolve_counted(&record.origin, regions);
    let destination = resolver.resolve_counted(&record.destination, regions);
    let (Some(origin), Some(destination)) = (origin, destination) else {
        stats.unresolved += 1;
        return None;
    };
    if origin == destination {
        stats.same_region += 1;
        return None;
    }

    record.origin = origin;
    record.destination = destination;
    stats.kept += 1;
    Some(record)
}

/// Harmonise a batch of records
pub fn harmonize(
    records: impl IntoIterator<Item = MigrationRecord>,
    resolver: &RegionResolver,
    filter: &MigrantFilter,
) -> (Vec<MigrationRecord>, HarmonizeStats) {
    let mut stats = HarmonizeStats::default();
    let mut regions = ResolutionStats::default();
    let kept = records
        .into_iter()
        .filter_map(|r| harmonize_record(r, resolver, filter, &mut stats, &mut regions))
        .collect();
    (kept, stats)
}
