//! Pipeline stages and their staged tables

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::PanelError;

/// Staged table names
pub mod tables {
    pub const TRADE_KSIC: &str = "trade_ksic";
    pub const ESTABLISHMENT: &str = "establishment";
    pub const REGIONS: &str = "regions";
    pub const INDUSTRY_PANEL: &str = "industry_panel";
    pub const MIGRATION_FLOWS: &str = "migration_flows";
    pub const PERIOD_FLOWS: &str = "period_flows";
    pub const SHOCKS: &str = "shocks";
    pub const EXPOSURE: &str = "exposure";
    pub const CONTROLS: &str = "controls";

    /// Region-pair panel of one instrument variant
    #[must_use]
    pub fn panel(variant: &str) -> String {
        format!("panel_{variant}")
    }

    /// Zone-pair panel of one instrument variant
    #[must_use]
    pub fn panel_cz(variant: &str) -> String {
        format!("panel_cz_{variant}")
    }
}

/// One step of the batch pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    TradeCrosswalk,
    Establishment,
    IndustryPanel,
    Migration,
    Exposure,
    Controls,
    Panel,
    Analysis,
}

impl Stage {
    /// All stages in a valid execution order
    pub const ALL: [Self; 8] = [
        Self::TradeCrosswalk,
        Self::Establishment,
        Self::IndustryPanel,
        Self::Migration,
        Self::Exposure,
        Self::Controls,
        Self::Panel,
        Self::Analysis,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::TradeCrosswalk => "trade-crosswalk",
            Self::Establishment => "establishment",
            Self::IndustryPanel => "industry-panel",
            Self::Migration => "migration",
            Self::Exposure => "exposure",
            Self::Controls => "controls",
            Self::Panel => "panel",
            Self::Analysis => "analysis",
        }
    }

    /// Stages whose outputs this stage reads
    #[must_use]
    pub fn dependencies(self) -> &'static [Self] {
        match self {
            Self::TradeCrosswalk | Self::Establishment | Self::Migration => &[],
            Self::IndustryPanel => &[Self::Establishment],
            Self::Exposure => &[Self::TradeCrosswalk, Self::IndustryPanel, Self::Establishment],
            Self::Controls => &[Self::IndustryPanel, Self::Migration, Self::Establishment],
            Self::Panel => &[Self::Establishment, Self::Migration, Self::Exposure, Self::Controls],
            Self::Analysis => &[Self::Panel],
        }
    }

    /// Staged tables this stage writes
    #[must_use]
    pub fn outputs(self, config: &PipelineConfig) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::TradeCrosswalk => &[tables::TRADE_KSIC],
            Self::Establishment => &[tables::ESTABLISHMENT, tables::REGIONS],
            Self::IndustryPanel => &[tables::INDUSTRY_PANEL],
            Self::Migration => &[tables::MIGRATION_FLOWS, tables::PERIOD_FLOWS],
            Self::Exposure => &[tables::SHOCKS, tables::EXPOSURE],
            Self::Controls => &[tables::CONTROLS],
            Self::Panel => {
                return config
                    .variants
                    .iter()
                    .flat_map(|v| [tables::panel(&v.name), tables::panel_cz(&v.name)])
                    .collect();
            }
            Self::Analysis => &[],
        };
        fixed.iter().map(ToString::to_string).collect()
    }

    /// Staged tables this stage reads
    #[must_use]
    pub fn inputs(self, config: &PipelineConfig) -> Vec<String> {
        match self {
            Self::TradeCrosswalk | Self::Establishment | Self::Migration => vec![],
            Self::IndustryPanel => vec![tables::ESTABLISHMENT.into()],
            Self::Exposure => vec![
                tables::TRADE_KSIC.into(),
                tables::INDUSTRY_PANEL.into(),
                tables::REGIONS.into(),
            ],
            Self::Controls => vec![
                tables::INDUSTRY_PANEL.into(),
                tables::MIGRATION_FLOWS.into(),
                tables::REGIONS.into(),
            ],
            Self::Panel => vec![
                tables::REGIONS.into(),
                tables::PERIOD_FLOWS.into(),
                tables::EXPOSURE.into(),
                tables::CONTROLS.into(),
            ],
            Self::Analysis => config.variants.iter().map(|v| tables::panel(&v.name)).collect(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|stage| stage.name() == wanted)
            .ok_or_else(|| PanelError::Config(format!("unknown stage `{s}`")))
    }
}
