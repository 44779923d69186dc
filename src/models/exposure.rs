//! Trade shocks, shift-share exposures and regional controls

use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use super::trade::FlowDirection;
use super::traits::ArrowSchema;

/// Deflated trade value at a benchmark year and its change since the
/// previous benchmark, in thousands of reference-year dollars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockRecord {
    pub reporter: String,
    pub flow: FlowDirection,
    pub industry: String,
    pub year: i32,
    pub deflated_value: f64,
    pub shock: f64,
}

impl ArrowSchema for ShockRecord {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("reporter", DataType::Utf8, false),
            Field::new("flow", DataType::Utf8, false),
            Field::new("industry", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("deflated_value", DataType::Float64, false),
            Field::new("shock", DataType::Float64, false),
        ])
    }
}

/// Realised exposure (`x_`) and shift-share instrument (`z_`) of one
/// commuting zone and period under one donor-set variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub variant: String,
    pub cz: u32,
    pub period: u8,
    pub x_import: f64,
    pub x_export: f64,
    pub z_import: f64,
    pub z_export: f64,
}

impl ArrowSchema for ExposureRecord {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("variant", DataType::Utf8, false),
            Field::new("cz", DataType::UInt32, false),
            Field::new("period", DataType::UInt8, false),
            Field::new("x_import", DataType::Float64, false),
            Field::new("x_export", DataType::Float64, false),
            Field::new("z_import", DataType::Float64, false),
            Field::new("z_export", DataType::Float64, false),
        ])
    }
}

/// Commuting-zone covariates at the control benchmark year
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlRecord {
    pub cz: u32,
    pub manufacturing_share: Option<f64>,
    pub college_share: Option<f64>,
    pub foreign_share: Option<f64>,
    pub population: Option<f64>,
    pub pre_migration_log_change: Option<f64>,
}

impl ArrowSchema for ControlRecord {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("cz", DataType::UInt32, false),
            Field::new("manufacturing_share", DataType::Float64, true),
            Field::new("college_share", DataType::Float64, true),
            Field::new("foreign_share", DataType::Float64, true),
            Field::new("population", DataType::Float64, true),
            Field::new("pre_migration_log_change", DataType::Float64, true),
        ])
    }
}
