//! Establishment employment and regional population records

use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use super::traits::ArrowSchema;

/// Employment of one industry in one region and census year
///
/// `male` and `female` stay `None` for census years that did not report
/// the split; they are never filled with zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    pub region: String,
    pub industry: String,
    pub year: i32,
    pub employment: Option<f64>,
    pub male: Option<f64>,
    pub female: Option<f64>,
}

impl EmploymentRecord {
    #[must_use]
    pub fn new(region: &str, industry: &str, year: i32, employment: f64) -> Self {
        Self {
            region: region.to_string(),
            industry: industry.to_string(),
            year,
            employment: Some(employment),
            male: None,
            female: None,
        }
    }

    #[must_use]
    pub fn with_gender(mut self, male: f64, female: f64) -> Self {
        self.male = Some(male);
        self.female = Some(female);
        self
    }
}

impl ArrowSchema for EmploymentRecord {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("region", DataType::Utf8, false),
            Field::new("industry", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("employment", DataType::Float64, true),
            Field::new("male", DataType::Float64, true),
            Field::new("female", DataType::Float64, true),
        ])
    }
}

/// Resident population keyed by the region code as published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub region: String,
    pub year: i32,
    pub population: f64,
}

/// Census demographics used for control covariates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicRecord {
    pub region: String,
    pub year: i32,
    pub population: Option<f64>,
    pub college_educated: Option<f64>,
    pub foreign_born: Option<f64>,
}
