//! Flow aggregation by year and by regression period

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::config::{PeriodDefinition, YearRange};
use crate::models::{FlowCount, MigrationRecord, PeriodFlow};

/// Sums persons per (origin, destination, year)
#[derive(Debug, Default)]
pub struct FlowAccumulator {
    cells: FxHashMap<(String, String, i32), f64>,
}

impl FlowAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &MigrationRecord) {
        self.add_count(&record.origin, &record.destination, record.year, record.persons);
    }

    pub fn add_count(&mut self, origin: &str, destination: &str, year: i32, count: f64) {
        *self
            .cells
            .entry((origin.to_string(), destination.to_string(), year))
            .or_insert(0.0) += count;
    }

    /// Fold another accumulator into this one and drop it
    pub fn absorb(&mut self, other: Self) {
        for ((origin, destination, year), count) in other.cells {
            *self.cells.entry((origin, destination, year)).or_insert(0.0) += count;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flow counts sorted by (origin, destination, year)
    #[must_use]
    pub fn into_flows(self) -> Vec<FlowCount> {
        let mut flows: Vec<FlowCount> = self
            .cells
            .into_iter()
            .map(|((origin, destination, year), count)| FlowCount {
                origin,
                destination,
                year,
                count,
            })
            .collect();
        flows.sort_by(|a, b| {
            (&a.origin, &a.destination, a.year).cmp(&(&b.origin, &b.destination, b.year))
        });
        flows
    }
}

/// Sum harmonised records into yearly flow counts
#[must_use]
pub fn aggregate_by_year<'a>(records: impl IntoIterator<Item = &'a MigrationRecord>) -> Vec<FlowCount> {
    let mut acc = FlowAccumulator::new();
    for record in records {
        acc.add(record);
    }
    acc.into_flows()
}

/// Period index of a migration year.
///
/// A period counts `[start_year, end_year)`; the last period also counts
/// its end year. Years in the pre-period window map to 0.
#[must_use]
pub fn period_of(year: i32, periods: &[PeriodDefinition], pre_period: &YearRange) -> Option<u8> {
    let last = periods.iter().map(|p| p.end_year).max();
    let found = periods.iter().find(|p| {
        (p.start_year..p.end_year).contains(&year) || (Some(p.end_year) == last && year == p.end_year)
    });
    match found {
        Some(period) => Some(period.index),
        None if pre_period.contains(year) => Some(0),
        None => None,
    }
}

/// Sum yearly flows into regression periods, sorted by
/// (origin, destination, period). Years outside every window are ignored.
#[must_use]
pub fn aggregate_by_period(
    flows: &[FlowCount],
    periods: &[PeriodDefinition],
    pre_period: &YearRange,
) -> Vec<PeriodFlow> {
    let mut cells: BTreeMap<(&str, &str, u8), f64> = BTreeMap::new();
    for flow in flows {
        if let Some(period) = period_of(flow.year, periods, pre_period) {
            *cells
                .entry((flow.origin.as_str(), flow.destination.as_str(), period))
                .or_insert(0.0) += flow.count;
        }
    }
    cells
        .into_iter()
        .map(|((origin, destination, period), count)| PeriodFlow {
            origin: origin.to_string(),
            destination: destination.to_string(),
            period,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn flow(origin: &str, destination: &str, year: i32, count: f64) -> FlowCount {
        FlowCount {
            origin: origin.into(),
            destination: destination.into(),
            year,
            count,
        }
    }

    #[test]
    fn yearly_counts_sum_persons() {
        let mut family = MigrationRecord::new("11010", "26010", 2003);
        family.persons = 4.0;
        let single = MigrationRecord::new("11010", "26010", 2003);
        let other_year = MigrationRecord::new("11010", "26010", 2004);

        let flows = aggregate_by_year([&family, &single, &other_year]);
        assert_eq!(flows, vec![flow("11010", "26010", 2003, 5.0), flow("11010", "26010", 2004, 1.0)]);
    }

    #[test]
    fn shared_boundary_year_goes_to_the_later_period() {
        let config = PipelineConfig::default();
        let period = |y| period_of(y, &config.periods, &config.pre_period);

        assert_eq!(period(1995), Some(0));
        assert_eq!(period(2000), Some(0));
        assert_eq!(period(2001), Some(1));
        assert_eq!(period(2009), Some(1));
        assert_eq!(period(2010), Some(2));
        assert_eq!(period(2019), Some(2));
        assert_eq!(period(1994), None);
        assert_eq!(period(2020), None);
    }

    #[test]
    fn period_totals_preserve_in_window_counts() {
        let config = PipelineConfig::default();
        let flows = vec![
            flow("A", "B", 1999, 2.0),
            flow("A", "B", 2005, 3.0),
            flow("A", "B", 2009, 1.0),
            flow("A", "B", 2010, 7.0),
            flow("A", "B", 2021, 100.0),
        ];
        let periods = aggregate_by_period(&flows, &config.periods, &config.pre_period);

        let counts: Vec<(u8, f64)> = periods.iter().map(|p| (p.period, p.count)).collect();
        assert_eq!(counts, vec![(0, 2.0), (1, 4.0), (2, 7.0)]);
    }

    #[test]
    fn absorbing_accumulators_adds_cells() {
        let mut era = FlowAccumulator::new();
        era.add_count("A", "B", 2001, 1.0);
        let mut year = FlowAccumulator::new();
        year.add_count("A", "B", 2001, 2.0);
        year.add_count("B", "A", 2001, 1.0);
        era.absorb(year);

        assert_eq!(era.len(), 2);
        assert_eq!(era.into_flows()[0].count, 3.0);
    }
}
