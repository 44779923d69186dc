//! Canonical regions and commuting zones

use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use super::traits::ArrowSchema;

/// A canonical 5-digit stat code and the commuting zone it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub cz: u32,
}

impl ArrowSchema for Region {
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("code", DataType::Utf8, false),
            Field::new("cz", DataType::UInt32, false),
        ])
    }
}

/// Commuting zone label row of the lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommutingZone {
    pub id: u32,
    pub label: String,
}
