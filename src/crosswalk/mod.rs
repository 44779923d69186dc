//! Crosswalks between coding systems
//!
//! Region codes are resolved to canonical stat codes and assigned to
//! commuting zones; industry and product codes are moved between
//! classification revisions with proportional concordances.

pub mod commuting_zone;
pub mod concordance;
pub mod establishment;
pub mod industry_panel;
pub mod region;
pub mod trade;

pub use commuting_zone::CzAssigner;
pub use concordance::{Concordance, IndustryRevision, Reclassify, Reclassified};
pub use establishment::{CensusLayout, load_census_year};
pub use industry_panel::IndustryPanelBuilder;
pub use region::{
    CodeLookup, RegionResolver, Resolution, ResolutionStats, canonical_code, normalize_code,
};
pub use trade::{TradeCrosswalk, load_trade_records};
