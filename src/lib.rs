//! Harmonisation and panel assembly for trade-shock migration studies.
//!
//! Raw Korean establishment censuses, internal migration microdata and
//! bilateral trade extracts are mapped onto one region taxonomy (canonical
//! stat codes grouped into commuting zones) and one industry taxonomy
//! (KSIC10). Trade shocks are spread over commuting zones with pre-period
//! employment shares, and the result is joined onto a bilateral region-pair
//! panel for IV estimation.

pub mod algorithm;
pub mod analysis;
pub mod config;
pub mod crosswalk;
pub mod error;
pub mod migration;
pub mod models;
pub mod pipeline;
pub mod utils;

// Core types
pub use config::PipelineConfig;
pub use error::{PanelError, Result};

// Crosswalks
pub use crosswalk::{
    Concordance, CzAssigner, IndustryPanelBuilder, RegionResolver, TradeCrosswalk,
};

// Panel construction
pub use algorithm::{ControlBuilder, ExposureBuilder, PanelAssembler};
pub use migration::MigrationHarmonizer;

// Execution
pub use pipeline::{PipelineRunner, Stage};
