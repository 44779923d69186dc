//! Row types flowing between pipeline stages
//!
//! Every staged table is a `Vec` of one of these types. Region and
//! industry codes are always `String` so leading zeros survive every
//! round trip through a delimited or Parquet file.

pub mod employment;
pub mod exposure;
pub mod migration;
pub mod panel;
pub mod region;
pub mod trade;
pub mod traits;

pub use employment::{DemographicRecord, EmploymentRecord, PopulationRecord};
pub use exposure::{ControlRecord, ExposureRecord, ShockRecord};
pub use migration::{FlowCount, Gender, MigrationRecord, PeriodFlow};
pub use panel::PanelRow;
pub use region::{CommutingZone, Region};
pub use trade::{DeflatorRecord, FlowDirection, TradeRecord};
pub use traits::ArrowSchema;
