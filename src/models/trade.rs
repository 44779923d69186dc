//! Trade records and price deflators

use std::fmt;
use std::str::FromStr;

use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use super::traits::ArrowSchema;

/// Direction of a trade flow seen from the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FlowDirection {
    Import,
    Export,
}

impl FlowDirection {
    pub const ALL: [Self; 2] = [Self::Import, Self::Export];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowDirection {
    type Err = String;

    /// Accepts the spelled-out names and the Comtrade flow codes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "import" | "imports" | "m" | "1" => Ok(Self::Import),
            "export" | "exports" | "x" | "2" => Ok(Self::Export),
            other => Err(format!("unknown flow direction: {other}")),
        }
    }
}

impl From<FlowDirection> for String {
    fn from(flow: FlowDirection) -> Self {
        flow.as_str().to_string()
    }
}

impl TryFrom<String> for FlowDirection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Country-level trade value for one product or industry code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub reporter: String,
    pub partner: String,
    pub flow: FlowDirection,
    /// HS, ISIC or KSIC code depending on the stage
    pub code: String,
    pub year: i32,
    /// Current-price value in US dollars
    pub value: Option<f64>,
}

impl ArrowSchema for TradeRecord {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("reporter", DataType::Utf8, false),
            Field::new("partner", DataType::Utf8, false),
            Field::new("flow", DataType::Utf8, false),
            Field::new("code", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("value", DataType::Float64, true),
        ])
    }
}

/// Annual price ratio `index(year) / index(year - 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeflatorRecord {
    pub year: i32,
    pub ratio: f64,
}
