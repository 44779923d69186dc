//! Shift-share exposure construction
//!
//! Trade values are deflated and differenced between benchmark years into
//! industry shocks, which are then spread over commuting zones with
//! pre-period employment shares.

pub mod builder;
pub mod deflator;
pub mod shares;
pub mod shock;

pub use builder::{ExposureBuilder, FlowExposure};
pub use deflator::Deflator;
pub use shares::EmploymentShares;
pub use shock::{ShockIndex, VALUE_SCALE, compute_shocks};
