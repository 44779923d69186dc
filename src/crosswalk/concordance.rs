//! Proportional concordances between classification systems
//!
//! A concordance maps each source code to one or more destination codes
//! with weights summing to one. Applying it splits a record's values over
//! the destinations by weight and then folds rows that land on the same
//! destination code and key, so totals are conserved.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{PanelError, Result};
use crate::utils::io::delimited::{delimiter_for, read_delimited};
use crate::utils::logging::log_drop_summary;

/// Allowed deviation of a source code's weight sum from one
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Destinations of one source code
pub type Fanout = SmallVec<[(String, f64); 4]>;

/// Industry classification revisions handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndustryRevision {
    Isic4,
    Ksic8,
    Ksic9,
    Ksic10,
}

impl IndustryRevision {
    /// KSIC revision an establishment census year is published in
    #[must_use]
    pub fn for_establishment_year(year: i32) -> Self {
        match year {
            ..=2007 => Self::Ksic8,
            2008..=2016 => Self::Ksic9,
            _ => Self::Ksic10,
        }
    }

    /// Following KSIC revision, if any
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Ksic8 => Some(Self::Ksic9),
            Self::Ksic9 => Some(Self::Ksic10),
            Self::Isic4 | Self::Ksic10 => None,
        }
    }
}

impl fmt::Display for IndustryRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Isic4 => "ISIC4",
            Self::Ksic8 => "KSIC8",
            Self::Ksic9 => "KSIC9",
            Self::Ksic10 => "KSIC10",
        };
        f.write_str(name)
    }
}

/// A record whose values can be redistributed across codes
pub trait Reclassify: Sized {
    /// Everything that identifies the record apart from its code
    type Key: Ord + Clone;

    fn code(&self) -> &str;

    fn key(&self) -> Self::Key;

    /// Copy carrying `code`, with every value multiplied by `weight`
    #[must_use]
    fn reclassified(&self, code: &str, weight: f64) -> Self;

    /// Add the values of a row with the same code and key, skipping
    /// missing values
    fn absorb(&mut self, other: Self);
}

/// One row of a concordance file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceRow {
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub target: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub weight: Option<f64>,
}

/// Result of applying a concordance
#[derive(Debug, Clone)]
pub struct Reclassified<R> {
    /// Folded rows, sorted by destination code and key
    pub rows: Vec<R>,
    /// Input records whose code is not in the concordance
    pub unmapped_records: usize,
    /// The distinct codes of those records
    pub unmapped_codes: BTreeSet<String>,
}

/// A weighted many-to-many code mapping
#[derive(Debug, Clone, Default)]
pub struct Concordance {
    name: String,
    map: BTreeMap<String, Fanout>,
}

impl Concordance {
    /// Equal-split concordance: after removing duplicate pairs, each of a
    /// source's `n` destinations gets weight `1 / n`
    pub fn equal_split<I, S>(name: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (source, target) in pairs {
            let source: String = source.into();
            let target: String = target.into();
            grouped
                .entry(source.trim().to_string())
                .or_default()
                .insert(target.trim().to_string());
        }

        #[allow(clippy::cast_precision_loss)]
        let map = grouped
            .into_iter()
            .map(|(source, targets)| {
                let weight = 1.0 / targets.len() as f64;
                let fanout = targets.into_iter().map(|t| (t, weight)).collect();
                (source, fanout)
            })
            .collect();

        Self {
            name: name.to_string(),
            map,
        }
    }

    /// Concordance with explicit weights. Repeated pairs have their
    /// weights added; every source must sum to one.
    pub fn weighted<I, S>(name: &str, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: Into<String>,
    {
        let mut grouped: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (source, target, weight) in rows {
            if !weight.is_finite() || weight < 0.0 {
                return Err(PanelError::crosswalk(name, format!("invalid weight {weight}")));
            }
            let source: String = source.into();
            let target: String = target.into();
            *grouped
                .entry(source.trim().to_string())
                .or_default()
                .entry(target.trim().to_string())
                .or_insert(0.0) += weight;
        }

        let mut map = BTreeMap::new();
        for (source, targets) in grouped {
            let sum: f64 = targets.values().sum();
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(PanelError::crosswalk(
                    name,
                    format!("weights of {source} sum to {sum}, not 1"),
                ));
            }
            map.insert(source, targets.into_iter().collect());
        }

        Ok(Self {
            name: name.to_string(),
            map,
        })
    }

    /// Load a concordance file with `source`, `target` and an optional
    /// `weight` column. Without weights the equal split is used; a file
    /// that weights only some rows is rejected.
    pub fn from_file(name: &str, path: &Path) -> Result<Self> {
        let rows: Vec<ConcordanceRow> = read_delimited(path, delimiter_for(path))?;
        let weighted = rows.iter().filter(|r| r.weight.is_some()).count();
        if weighted == 0 {
            Ok(Self::equal_split(
                name,
                rows.into_iter().map(|r| (r.source, r.target)),
            ))
        } else if weighted == rows.len() {
            Self::weighted(
                name,
                rows.into_iter()
                    .map(|r| (r.source, r.target, r.weight.unwrap_or_default())),
            )
        } else {
            Err(PanelError::crosswalk(
                name,
                format!("{} of {} rows have no weight", rows.len() - weighted, rows.len()),
            ))
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destinations of a source code
    #[must_use]
    pub fn targets(&self, source: &str) -> Option<&[(String, f64)]> {
        self.map.get(source).map(|fanout| fanout.as_slice())
    }

    /// Number of source codes
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Weight sum of every source code
    #[must_use]
    pub fn weight_sums(&self) -> BTreeMap<&str, f64> {
        self.map
            .iter()
            .map(|(source, fanout)| (source.as_str(), fanout.iter().map(|(_, w)| w).sum()))
            .collect()
    }

    /// Compose with the next revision's concordance.
    ///
    /// Weights multiply along each path and add up over intermediate codes,
    /// so applying the result equals applying `self` and then `next`.
    /// Paths through an intermediate code the next table does not know are
    /// dropped, exactly as the record would be dropped by the second pass;
    /// sources with no surviving path are left out. Returns the composed
    /// concordance and the number of intermediate codes that were missing.
    #[must_use]
    pub fn chain(&self, next: &Self) -> (Self, usize) {
        let mut missing: BTreeSet<&str> = BTreeSet::new();
        let mut map = BTreeMap::new();

        for (source, fanout) in &self.map {
            let mut composed: BTreeMap<String, f64> = BTreeMap::new();
            for (middle, w1) in fanout {
                match next.targets(middle) {
                    Some(onward) => {
                        for (target, w2) in onward {
                            *composed.entry(target.clone()).or_insert(0.0) += w1 * w2;
                        }
                    }
                    None => {
                        missing.insert(middle.as_str());
                    }
                }
            }
            if composed.is_empty() {
                continue;
            }
            map.insert(source.clone(), composed.into_iter().collect());
        }

        if !missing.is_empty() {
            log::warn!(
                "Chaining {} with {}: {} intermediate codes have no onward mapping",
                self.name,
                next.name,
                missing.len()
            );
        }

        let chained = Self {
            name: format!("{} > {}", self.name, next.name),
            map,
        };
        (chained, missing.len())
    }

    /// Split one record over its destinations without folding.
    /// Returns `None` for an unmapped code.
    #[must_use]
    pub fn expand<R: Reclassify>(&self, record: &R) -> Option<SmallVec<[R; 4]>> {
        self.targets(record.code()).map(|fanout| {
            fanout
                .iter()
                .map(|(target, weight)| record.reclassified(target, *weight))
                .collect()
        })
    }

    /// Reclassify records and fold rows sharing destination code and key
    ///
    /// # Arguments
    /// * `records` - Records coded in the source classification
    ///
    /// # Returns
    /// The folded records with the count of records whose code had no
    /// mapping
    pub fn apply<R, I>(&self, records: I) -> Reclassified<R>
    where
        R: Reclassify,
        I: IntoIterator<Item = R>,
    {
        let mut folded: BTreeMap<(String, R::Key), R> = BTreeMap::new();
        let mut unmapped_records = 0;
        let mut unmapped_codes = BTreeSet::new();
        let mut total = 0;

        for record in records {
            total += 1;
            let Some(expanded) = self.expand(&record) else {
                unmapped_records += 1;
                unmapped_codes.insert(record.code().to_string());
                continue;
            };
            for row in expanded {
                let slot = (row.code().to_string(), row.key());
                match folded.get_mut(&slot) {
                    Some(existing) => existing.absorb(row),
                    None => {
                        folded.insert(slot, row);
                    }
                }
            }
        }

        log_drop_summary(
            &format!("concordance {}", self.name),
            "source code not in concordance",
            unmapped_records,
            total,
        );

        Reclassified {
            rows: folded.into_values().collect(),
            unmapped_records,
            unmapped_codes,
        }
    }
}
