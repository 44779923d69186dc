//! Region code resolution
//!
//! Raw district codes from every source are mapped to the current
//! 5-digit stat code in four steps:
//!
//! 1. normalise to five digits (codes with a prefix of 40 or more have
//!    their fifth digit zeroed, folding city sub-districts into the city),
//! 2. apply the legacy overrides for districts replaced by newly created
//!    special cities,
//! 3. translate KOSIS codes to stat codes,
//! 4. collapse historical renames and mergers with the stat-code change
//!    table.
//!
//! A lookup that misses keeps the code it was given. Resolution depends on
//! nothing but the code and the tables, so re-runs give identical output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::utils::io::delimited::{delimiter_for, read_delimited};
use crate::utils::logging::log_drop_summary;

/// Width of a canonical stat code
pub const CODE_WIDTH: usize = 5;

/// Prefixes from this value up use the fifth digit for city sub-districts
pub const SUBDISTRICT_PREFIX_FLOOR: u32 = 40;

/// Default file names inside the crosswalk directory
pub const KOSIS_FILE: &str = "kosis_stat.csv";
pub const STAT_CHANGE_FILE: &str = "stat_change.csv";

/// Default legacy overrides: Yeongi-gun into Sejong and Masan into the
/// unified Changwon
#[must_use]
pub fn default_legacy_overrides() -> BTreeMap<String, String> {
    [("34390", "29010"), ("38070", "38110")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Normalise a raw region code to the canonical width.
///
/// Returns `None` for empty input or input containing anything other than
/// ASCII digits.
#[must_use]
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut code: String = trimmed.chars().take(CODE_WIDTH).collect();
    while code.len() < CODE_WIDTH {
        code.push('0');
    }

    let prefix: u32 = code[..2].parse().ok()?;
    if prefix >= SUBDISTRICT_PREFIX_FLOOR {
        code.replace_range(4..5, "0");
    }
    Some(code)
}

/// Validate a code that is already canonical: exactly five ASCII digits
/// after trimming. Unlike [`normalize_code`] nothing is padded or folded.
#[must_use]
pub fn canonical_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    (trimmed.len() == CODE_WIDTH && trimmed.bytes().all(|b| b.is_ascii_digit()))
        .then(|| trimmed.to_string())
}

/// One row of a code lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePair {
    #[serde(alias = "source", alias = "old")]
    pub from: String,
    #[serde(alias = "target", alias = "new")]
    pub to: String,
}

impl CodePair {
    #[must_use]
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// A single-valued code lookup keyed by normalised codes
#[derive(Debug, Clone, Default)]
pub struct CodeLookup {
    name: String,
    entries: FxHashMap<String, String>,
}

impl CodeLookup {
    /// Build a lookup. Source codes are normalised like raw input; target
    /// codes are canonical and kept as given.
    ///
    /// Repeated keys with the same target are merged; a key with two
    /// different targets is an error, so every code resolves to at most
    /// one result.
    pub fn from_pairs(name: &str, pairs: impl IntoIterator<Item = CodePair>) -> Result<Self> {
        let mut entries = FxHashMap::default();
        for pair in pairs {
            let from = normalize_code(&pair.from).ok_or_else(|| {
                PanelError::crosswalk(name, format!("malformed source code `{}`", pair.from))
            })?;
            let to = canonical_code(&pair.to).ok_or_else(|| {
                PanelError::crosswalk(name, format!("malformed target code `{}`", pair.to))
            })?;
            match entries.get(&from) {
                Some(existing) if existing != &to => {
                    return Err(PanelError::crosswalk(
                        name,
                        format!("code {from} maps to both {existing} and {to}"),
                    ));
                }
                Some(_) => {}
                None => {
                    entries.insert(from, to);
                }
            }
        }
        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }

    /// Load a two-column (`from`, `to`) delimited file
    pub fn from_file(name: &str, path: &Path) -> Result<Self> {
        let pairs: Vec<CodePair> = read_delimited(path, delimiter_for(path))?;
        Self::from_pairs(name, pairs)
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn targets(&self) -> impl Iterator<Item = &String> {
        self.entries.values()
    }
}

/// Which steps changed a code on its way to the canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionPath {
    pub overridden: bool,
    pub via_kosis: bool,
    pub via_stat_change: bool,
}

impl ResolutionPath {
    /// Whether any table or override matched
    #[must_use]
    pub fn matched_any(self) -> bool {
        self.overridden || self.via_kosis || self.via_stat_change
    }
}

/// Why a code could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Empty or non-numeric input
    Malformed,
    /// No table matched and, in strict mode, the code is not canonical
    Unknown,
}

/// Outcome of resolving one raw code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { code: String, path: ResolutionPath },
    Unresolved(UnresolvedReason),
}

impl Resolution {
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Resolved { code, .. } => Some(code),
            Self::Unresolved(_) => None,
        }
    }

    #[must_use]
    pub fn into_code(self) -> Option<String> {
        match self {
            Self::Resolved { code, .. } => Some(code),
            Self::Unresolved(_) => None,
        }
    }
}

/// Counters collected while resolving a batch of codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub total: usize,
    pub resolved: usize,
    pub overridden: usize,
    pub passthrough: usize,
    pub malformed: usize,
    pub unknown: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, resolution: &Resolution) {
        self.total += 1;
        match resolution {
            Resolution::Resolved { path, .. } => {
                self.resolved += 1;
                if path.overridden {
                    self.overridden += 1;
                }
                if !path.matched_any() {
                    self.passthrough += 1;
                }
            }
            Resolution::Unresolved(UnresolvedReason::Malformed) => self.malformed += 1,
            Resolution::Unresolved(UnresolvedReason::Unknown) => self.unknown += 1,
        }
    }

    #[must_use]
    pub fn dropped(&self) -> usize {
        self.malformed + self.unknown
    }

    pub fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.resolved += other.resolved;
        self.overridden += other.overridden;
        self.passthrough += other.passthrough;
        self.malformed += other.malformed;
        self.unknown += other.unknown;
    }
}

/// Resolves raw region codes to canonical stat codes
#[derive(Debug, Clone)]
pub struct RegionResolver {
    kosis: CodeLookup,
    stat_change: CodeLookup,
    overrides: FxHashMap<String, String>,
    canonical: BTreeSet<String>,
    strict: bool,
}

impl RegionResolver {
    /// Create a resolver from the two lookup tables and the legacy
    /// override map. Override keys are normalised; values must already be
    /// canonical.
    pub fn new(
        kosis: CodeLookup,
        stat_change: CodeLookup,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut normalized = FxHashMap::default();
        for (from, to) in overrides {
            let (Some(from), Some(to)) = (normalize_code(from), canonical_code(to)) else {
                return Err(PanelError::crosswalk(
                    "region overrides",
                    format!("malformed override {from} -> {to}"),
                ));
            };
            normalized.insert(from, to);
        }

        let canonical = stat_change
            .targets()
            .chain(kosis.targets())
            .chain(normalized.values())
            .cloned()
            .collect();

        Ok(Self {
            kosis,
            stat_change,
            overrides: normalized,
            canonical,
            strict: false,
        })
    }

    /// Load both lookup tables from the crosswalk directory
    pub fn from_dir(dir: &Path, overrides: &BTreeMap<String, String>) -> Result<Self> {
        let kosis = CodeLookup::from_file("kosis", &dir.join(KOSIS_FILE))?;
        let stat_change = CodeLookup::from_file("stat change", &dir.join(STAT_CHANGE_FILE))?;
        Self::new(kosis, stat_change, overrides)
    }

    /// Treat codes no table knows about as unresolved
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register additional codes that are canonical as they stand
    #[must_use]
    pub fn with_canonical(mut self, codes: impl IntoIterator<Item = String>) -> Self {
        self.canonical.extend(codes.into_iter().filter_map(|c| normalize_code(&c)));
        self
    }

    /// Resolve one raw code
    ///
    /// # Arguments
    /// * `raw` - Region code as written in the source file
    ///
    /// # Returns
    /// The canonical code with the steps that changed it, or the reason
    /// the code could not be resolved
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Resolution {
        let Some(mut code) = normalize_code(raw) else {
            return Resolution::Unresolved(UnresolvedReason::Malformed);
        };
        let mut path = ResolutionPath::default();

        if let Some(target) = self.overrides.get(&code) {
            code.clone_from(target);
            path.overridden = true;
        }
        if let Some(target) = self.kosis.get(&code) {
            code = target.to_string();
            path.via_kosis = true;
        }
        if let Some(target) = self.stat_change.get(&code) {
            code = target.to_string();
            path.via_stat_change = true;
        }

        if self.strict && !path.matched_any() && !self.canonical.contains(&code) {
            return Resolution::Unresolved(UnresolvedReason::Unknown);
        }
        Resolution::Resolved { code, path }
    }

    /// Resolve a code and record the outcome
    pub fn resolve_counted(&self, raw: &str, stats: &mut ResolutionStats) -> Option<String> {
        let resolution = self.resolve(raw);
        stats.record(&resolution);
        resolution.into_code()
    }

    /// Resolve a batch of raw codes, keeping `(raw, canonical)` for every
    /// code that resolves. The drop count is logged under `step`.
    pub fn resolve_all<I, S>(&self, step: &str, codes: I) -> (Vec<(String, String)>, ResolutionStats)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stats = ResolutionStats::default();
        let resolved = codes
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref();
                self.resolve_counted(raw, &mut stats)
                    .map(|code| (raw.to_string(), code))
            })
            .collect();
        log_drop_summary(step, "unresolved region code", stats.dropped(), stats.total);
        (resolved, stats)
    }

    /// Canonical codes known from the tables
    #[must_use]
    pub fn canonical_codes(&self) -> &BTreeSet<String> {
        &self.canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> RegionResolver {
        let kosis = CodeLookup::from_pairs(
            "kosis",
            vec![CodePair::new("11110", "11010"), CodePair::new("41110", "31010")],
        )
        .unwrap();
        let stat_change = CodeLookup::from_pairs(
            "stat change",
            vec![
                CodePair::new("31010", "31011"),
                CodePair::new("38010", "38110"),
            ],
        )
        .unwrap();
        RegionResolver::new(kosis, stat_change, &default_legacy_overrides()).unwrap()
    }

    #[test]
    fn normalization_pads_truncates_and_folds_subdistricts() {
        assert_eq!(normalize_code("1101").as_deref(), Some("11010"));
        assert_eq!(normalize_code(" 1101053 ").as_deref(), Some("11010"));
        assert_eq!(normalize_code("41113").as_deref(), Some("41110"));
        assert_eq!(normalize_code("39013").as_deref(), Some("39013"));
        assert_eq!(normalize_code(""), None);
        assert_eq!(normalize_code("11-01"), None);
    }

    #[test]
    fn lookups_chain_kosis_then_stat_change() {
        let resolver = resolver();
        let resolution = resolver.resolve("41117");
        assert_eq!(
            resolution,
            Resolution::Resolved {
                code: "31011".into(),
                path: ResolutionPath {
                    overridden: false,
                    via_kosis: true,
                    via_stat_change: true,
                },
            }
        );
    }

    #[test]
    fn overrides_apply_before_lookups() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("34390").code(), Some("29010"));
        assert_eq!(resolver.resolve("38070").code(), Some("38110"));
    }

    #[test]
    fn misses_pass_through_unless_strict() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("26010").code(), Some("26010"));
        let strict = resolver.strict(true);
        assert_eq!(
            strict.resolve("26010"),
            Resolution::Unresolved(UnresolvedReason::Unknown)
        );
        // a canonical target is accepted as is
        assert_eq!(strict.resolve("11010").code(), Some("11010"));
    }

    #[test]
    fn conflicting_table_entries_are_rejected() {
        let result = CodeLookup::from_pairs(
            "kosis",
            vec![CodePair::new("11110", "11010"), CodePair::new("11110", "11020")],
        );
        assert!(matches!(result, Err(PanelError::Crosswalk { .. })));

        let duplicate = CodeLookup::from_pairs(
            "kosis",
            vec![CodePair::new("11110", "11010"), CodePair::new("11110", "11010")],
        )
        .unwrap();
        assert_eq!(duplicate.len(), 1);
    }

    #[test]
    fn canonical_targets_are_kept_as_given() {
        let kosis =
            CodeLookup::from_pairs("kosis", vec![CodePair::new("11110", "47111")]).unwrap();
        let stat = CodeLookup::from_pairs("stat change", Vec::<CodePair>::new()).unwrap();
        let overrides = BTreeMap::from([("12345".to_string(), "54321".to_string())]);
        let resolver = RegionResolver::new(kosis, stat, &overrides).unwrap();

        assert_eq!(resolver.resolve("11110").code(), Some("47111"));
        assert_eq!(resolver.resolve("12345").code(), Some("54321"));
        assert!(resolver.canonical_codes().contains("47111"));
    }

    #[test]
    fn malformed_targets_are_rejected() {
        for target in ["4711", "471112", "47a11", ""] {
            let result = CodeLookup::from_pairs("kosis", vec![CodePair::new("11110", target)]);
            assert!(matches!(result, Err(PanelError::Crosswalk { .. })), "{target}");
        }
        assert_eq!(canonical_code(" 47111 ").as_deref(), Some("47111"));
    }

    #[test]
    fn batch_resolution_keeps_raw_codes() {
        let resolver = resolver().strict(true);
        let (resolved, stats) = resolver.resolve_all("test", ["41117", "26010", "x"]);
        assert_eq!(resolved, vec![("41117".to_string(), "31011".to_string())]);
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn registered_codes_become_canonical() {
        let resolver = resolver()
            .strict(true)
            .with_canonical(vec!["2601".to_string(), "bad".to_string()]);
        assert!(resolver.canonical_codes().contains("26010"));
        assert_eq!(resolver.resolve("26010").code(), Some("26010"));
        assert_eq!(
            resolver.resolve("26020"),
            Resolution::Unresolved(UnresolvedReason::Unknown)
        );
    }

    #[test]
    fn stats_count_drops() {
        let resolver = resolver();
        let mut stats = ResolutionStats::default();
        for raw in ["11110", "", "abc", "26010", "34390"] {
            let _ = resolver.resolve_counted(raw, &mut stats);
        }
        assert_eq!(stats.total, 5);
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.resolved, 3);
        assert_eq!(stats.passthrough, 1);
        assert_eq!(stats.overridden, 1);
        assert_eq!(stats.dropped(), 2);
    }
}
