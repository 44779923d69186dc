//! Benchmark-to-benchmark trade shocks per country, flow and industry

use std::collections::BTreeMap;

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::models::{FlowDirection, ShockRecord, TradeRecord};
use crate::utils::logging::log_drop_summary;
use crate::utils::numeric::add_skipna;

use super::deflator::Deflator;

/// Trade values are expressed per this many dollars
pub const VALUE_SCALE: f64 = 1000.0;

type SeriesKey = (String, FlowDirection, String);

/// Compute shocks for every reporter with the given partner.
///
/// Values are summed per (reporter, flow, industry, benchmark year),
/// deflated to reference-year prices and differenced against the
/// preceding benchmark. The first benchmark's lag is 0, as is any
/// benchmark at which a series reports nothing. Output is sorted by
/// (reporter, flow, industry, year).
///
/// # Arguments
/// * `records` - Trade values already mapped to industries
/// * `partner` - Partner whose trade with each reporter is measured
/// * `benchmarks` - Benchmark years; duplicates are ignored
/// * `deflator` - Price ratios up to the reference year
///
/// # Returns
/// One shock per series and benchmark whose value could be deflated
#[must_use]
pub fn compute_shocks(
    records: &[TradeRecord],
    partner: &str,
    benchmarks: &[i32],
    deflator: &Deflator,
) -> Vec<ShockRecord> {
    let benchmarks: Vec<i32> = benchmarks.iter().copied().sorted().dedup().collect();

    let mut totals: BTreeMap<(SeriesKey, i32), Option<f64>> = BTreeMap::new();
    for record in records {
        if record.partner != partner || !benchmarks.contains(&record.year) {
            continue;
        }
        let key = (
            (record.reporter.clone(), record.flow, record.code.clone()),
            record.year,
        );
        add_skipna(totals.entry(key).or_insert(None), record.value);
    }

    let mut undeflatable = 0;
    let mut deflated: BTreeMap<SeriesKey, FxHashMap<i32, f64>> = BTreeMap::new();
    for ((series, year), total) in totals {
        let Some(value) = deflator.deflate(year, total.unwrap_or(0.0)) else {
            undeflatable += 1;
            continue;
        };
        deflated.entry(series).or_default().insert(year, value / VALUE_SCALE);
    }
    log_drop_summary(
        "trade shocks",
        "no deflator for benchmark year",
        undeflatable,
        undeflatable + deflated.values().map(FxHashMap::len).sum::<usize>(),
    );

    let mut shocks = Vec::with_capacity(deflated.len() * benchmarks.len());
    for ((reporter, flow, industry), values) in deflated {
        let mut lagged = 0.0;
        for &year in &benchmarks {
            let current = values.get(&year).copied().unwrap_or(0.0);
            shocks.push(ShockRecord {
                reporter: reporter.clone(),
                flow,
                industry: industry.clone(),
                year,
                deflated_value: current,
                shock: current - lagged,
            });
            lagged = current;
        }
    }

    shocks.sort_by(|a, b| {
        (&a.reporter, a.flow, &a.industry, a.year).cmp(&(&b.reporter, b.flow, &b.industry, b.year))
    });
    shocks
}

/// Shock lookup by (flow, industry, year) summed over a set of countries
#[derive(Debug, Clone, Default)]
pub struct ShockIndex {
    values: FxHashMap<(FlowDirection, String, i32), f64>,
}

impl ShockIndex {
    /// Sum the shocks of `countries`
    #[must_use]
    pub fn for_countries<S: AsRef<str>>(shocks: &[ShockRecord], countries: &[S]) -> Self {
        let mut values = FxHashMap::default();
        for shock in shocks
            .iter()
            .filter(|s| countries.iter().any(|c| c.as_ref() == s.reporter))
        {
            *values
                .entry((shock.flow, shock.industry.clone(), shock.year))
                .or_insert(0.0) += shock.shock;
        }
        Self { values }
    }

    /// Shocks of one flow at one benchmark year, by industry
    pub fn at(&self, flow: FlowDirection, year: i32) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .filter(move |((f, _, y), _)| *f == flow && *y == year)
            .map(|((_, industry, _), value)| (industry.as_str(), *value))
    }

    #[must_use]
    pub fn get(&self, flow: FlowDirection, industry: &str, year: i32) -> Option<f64> {
        self.values.get(&(flow, industry.to_string(), year)).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
