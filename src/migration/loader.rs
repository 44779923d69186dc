//! One loader for every migration era

use std::path::Path;

use csv::StringRecord;

use crate::crosswalk::establishment::RegionIndices;
use crate::error::Result;
use crate::models::{Gender, MigrationRecord};
use crate::utils::io::delimited::{ColumnIndex, field, numeric_field, open_reader};

use super::era::{EraLayout, MigrationEra};

/// One data row of a migration file
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedRow {
    Record(MigrationRecord),
    /// The layout has a persons column but this row's value is blank,
    /// negative or not a number
    InvalidPersons,
}

/// Column positions of an era layout in one file
#[derive(Debug, Clone, Copy)]
struct LayoutIndices {
    origin: RegionIndices,
    destination: RegionIndices,
    persons: Option<usize>,
    age: Option<usize>,
    gender: Option<usize>,
    household_size: Option<usize>,
    reason: Option<usize>,
}

impl LayoutIndices {
    fn locate(layout: &EraLayout, index: &ColumnIndex) -> Result<Self> {
        Ok(match layout {
            EraLayout::SplitCodes {
                origin_province,
                origin_district,
                destination_province,
                destination_district,
                persons,
            } => Self {
                origin: RegionIndices::Split(
                    index.require(origin_province)?,
                    index.require(origin_district)?,
                ),
                destination: RegionIndices::Split(
                    index.require(destination_province)?,
                    index.require(destination_district)?,
                ),
                persons: index.optional(persons.as_deref())?,
                age: None,
                gender: None,
                household_size: None,
                reason: None,
            },
            EraLayout::JoinedCodes {
                origin,
                destination,
                persons,
            } => Self {
                origin: RegionIndices::Single(index.require(origin)?),
                destination: RegionIndices::Single(index.require(destination)?),
                persons: index.optional(persons.as_deref())?,
                age: None,
                gender: None,
                household_size: None,
                reason: None,
            },
            EraLayout::Attributed {
                origin,
                destination,
                persons,
                age,
                gender,
                household_size,
                reason,
            } => Self {
                origin: RegionIndices::Single(index.require(origin)?),
                destination: RegionIndices::Single(index.require(destination)?),
                persons: index.optional(persons.as_deref())?,
                age: index.optional(age.as_deref())?,
                gender: index.optional(gender.as_deref())?,
                household_size: index.optional(household_size.as_deref())?,
                reason: index.optional(reason.as_deref())?,
            },
        })
    }

    fn parse(&self, row: &StringRecord, year: i32) -> LoadedRow {
        // a layout without a persons column reports one mover per row
        let persons = match self.persons {
            None => 1.0,
            Some(i) => match numeric_field(row, i).filter(|v| *v >= 0.0) {
                Some(persons) => persons,
                None => return LoadedRow::InvalidPersons,
            },
        };
        LoadedRow::Record(MigrationRecord {
            origin: self.origin.raw_code(row).unwrap_or_default(),
            destination: self.destination.raw_code(row).unwrap_or_default(),
            year,
            persons,
            age: self.age.and_then(|i| field(row, i)?.parse().ok()),
            gender: self.gender.and_then(|i| field(row, i)?.parse::<Gender>().ok()),
            household_size: self
                .household_size
                .and_then(|i| field(row, i)?.parse().ok()),
            reason: self.reason.and_then(|i| field(row, i)).map(str::to_string),
        })
    }
}

/// Reads the yearly files of one era with raw, unresolved codes
#[derive(Debug, Clone, Copy)]
pub struct EraLoader<'a> {
    era: &'a MigrationEra,
}

impl<'a> EraLoader<'a> {
    #[must_use]
    pub fn new(era: &'a MigrationEra) -> Self {
        Self { era }
    }

    #[must_use]
    pub fn era(&self) -> &'a MigrationEra {
        self.era
    }

    /// Stream every row of one year's file into `sink`.
    ///
    /// # Arguments
    /// * `path` - The year's file
    /// * `year` - Year stamped on every record
    /// * `sink` - Receives each parsed row in file order
    ///
    /// # Returns
    /// The number of rows read, including rows with an invalid mover count
    pub fn for_each_record<F>(&self, path: &Path, year: i32, mut sink: F) -> Result<usize>
    where
        F: FnMut(LoadedRow),
    {
        let mut reader = open_reader(path, self.era.delimiter as u8)?;
        let index = ColumnIndex::new(reader.headers()?.clone(), path);
        let columns = LayoutIndices::locate(&self.era.layout, &index)?;

        let mut rows = 0;
        for row in reader.records() {
            let row = row?;
            sink(columns.parse(&row, year));
            rows += 1;
        }
        Ok(rows)
    }

    /// Read one year's file into memory, skipping rows with an invalid
    /// mover count
    pub fn load_year(&self, path: &Path, year: i32) -> Result<Vec<MigrationRecord>> {
        let mut records = Vec::new();
        self.for_each_record(path, year, |row| {
            if let LoadedRow::Record(record) = row {
                records.push(record);
            }
        })?;
        Ok(records)
    }
}
