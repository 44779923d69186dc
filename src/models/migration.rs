//! Internal migration microdata and bilateral flow counts

use std::str::FromStr;

use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use super::traits::ArrowSchema;

/// Gender as coded in the migration microdata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "M" | "m" | "male" => Ok(Self::Male),
            "2" | "F" | "f" | "female" => Ok(Self::Female),
            other => Err(format!("unknown gender code: {other}")),
        }
    }
}

/// One reported move
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRecord {
    pub origin: String,
    pub destination: String,
    pub year: i32,
    /// Persons moving under this report
    pub persons: f64,
    pub age: Option<u16>,
    pub gender: Option<Gender>,
    pub household_size: Option<u16>,
    pub reason: Option<String>,
}

impl MigrationRecord {
    #[must_use]
    pub fn new(origin: &str, destination: &str, year: i32) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            year,
            persons: 1.0,
            age: None,
            gender: None,
            household_size: None,
            reason: None,
        }
    }
}

/// Movers from `origin` to `destination` in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowCount {
    pub origin: String,
    pub destination: String,
    pub year: i32,
    pub count: f64,
}

impl ArrowSchema for FlowCount {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("origin", DataType::Utf8, false),
            Field::new("destination", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("count", DataType::Float64, false),
        ])
    }
}

/// Movers from `origin` to `destination` summed over a regression period
///
/// Period 0 is the pre-period window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFlow {
    pub origin: String,
    pub destination: String,
    pub period: u8,
    pub count: f64,
}

impl ArrowSchema for PeriodFlow {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("origin", DataType::Utf8, false),
            Field::new("destination", DataType::Utf8, false),
            Field::new("period", DataType::UInt8, false),
            Field::new("count", DataType::Float64, false),
        ])
    }
}
