//! Exposure, control and panel construction
//!
//! These steps consume the harmonised crosswalk outputs and produce the
//! tables the analysis layer reads.

pub mod controls;
pub mod exposure;
pub mod panel;

pub use controls::{ControlBuilder, industry_division};
pub use exposure::{Deflator, EmploymentShares, ExposureBuilder, ShockIndex, compute_shocks};
pub use panel::{PanelAssembler, log_change};
