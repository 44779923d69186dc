//! Trade classification crosswalk: HS products to ISIC to KSIC industries

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::models::{FlowDirection, TradeRecord};
use crate::utils::io::delimited::{delimiter_for, read_delimited};
use crate::utils::logging::log_drop_summary;
use crate::utils::numeric::add_skipna;

use super::concordance::{Concordance, Reclassify};

/// Default file names inside the crosswalk directory
pub const HS_ISIC_FILE: &str = "hs_isic.csv";
pub const ISIC_KSIC_FILE: &str = "isic_ksic.csv";

impl Reclassify for TradeRecord {
    type Key = (String, String, FlowDirection, i32);

    fn code(&self) -> &str {
        &self.code
    }

    fn key(&self) -> Self::Key {
        (
            self.reporter.clone(),
            self.partner.clone(),
            self.flow,
            self.year,
        )
    }

    fn reclassified(&self, code: &str, weight: f64) -> Self {
        Self {
            code: code.to_string(),
            value: self.value.map(|v| v * weight),
            ..self.clone()
        }
    }

    fn absorb(&mut self, other: Self) {
        add_skipna(&mut self.value, other.value);
    }
}

/// Row of a raw trade extract
#[derive(Debug, Deserialize)]
struct RawTradeRow {
    reporter: String,
    partner: String,
    flow: String,
    #[serde(alias = "hs_code", alias = "commodity")]
    code: String,
    year: i32,
    #[serde(deserialize_with = "csv::invalid_option")]
    value: Option<f64>,
}

/// Read a raw trade extract. Rows with an unknown flow direction are
/// dropped and counted.
pub fn load_trade_records(path: &Path) -> Result<Vec<TradeRecord>> {
    let rows: Vec<RawTradeRow> = read_delimited(path, delimiter_for(path))?;
    let total = rows.len();

    let records: Vec<TradeRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let flow = row.flow.parse::<FlowDirection>().ok()?;
            Some(TradeRecord {
                reporter: row.reporter.trim().to_ascii_uppercase(),
                partner: row.partner.trim().to_ascii_uppercase(),
                flow,
                code: row.code.trim().to_string(),
                year: row.year,
                value: row.value,
            })
        })
        .collect();

    log_drop_summary("trade records", "unknown flow direction", total - records.len(), total);
    Ok(records)
}

/// Two-step product-to-industry crosswalk
#[derive(Debug, Clone)]
pub struct TradeCrosswalk {
    hs_isic: Concordance,
    isic_ksic: Concordance,
}

impl TradeCrosswalk {
    #[must_use]
    pub fn new(hs_isic: Concordance, isic_ksic: Concordance) -> Self {
        Self { hs_isic, isic_ksic }
    }

    /// Load both weighted tables from the crosswalk directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self::new(
            Concordance::from_file("HS>ISIC", &dir.join(HS_ISIC_FILE))?,
            Concordance::from_file("ISIC>KSIC", &dir.join(ISIC_KSIC_FILE))?,
        ))
    }

    /// Reclassify HS-coded records to KSIC industries
    #[must_use]
    pub fn to_ksic(&self, records: Vec<TradeRecord>) -> Vec<TradeRecord> {
        let isic = self.hs_isic.apply(records);
        let ksic = self.isic_ksic.apply(isic.rows);
        log::info!(
            "Trade crosswalk: {} KSIC rows ({} HS and {} ISIC codes unmapped)",
            ksic.rows.len(),
            isic.unmapped_codes.len(),
            ksic.unmapped_codes.len()
        );
        ksic.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, flow: FlowDirection, value: f64) -> TradeRecord {
        TradeRecord {
            reporter: "KOR".into(),
            partner: "CHN".into(),
            flow,
            code: code.into(),
            year: 2001,
            value: Some(value),
        }
    }

    #[test]
    fn value_is_conserved_through_both_steps() {
        let hs_isic = Concordance::weighted(
            "HS>ISIC",
            vec![("850110", "2710", 0.6), ("850110", "2790", 0.4), ("620342", "1410", 1.0)],
        )
        .unwrap();
        let isic_ksic = Concordance::weighted(
            "ISIC>KSIC",
            vec![("2710", "28", 1.0), ("2790", "28", 1.0), ("1410", "14", 1.0)],
        )
        .unwrap();
        let crosswalk = TradeCrosswalk::new(hs_isic, isic_ksic);

        let rows = crosswalk.to_ksic(vec![
            record("850110", FlowDirection::Import, 1000.0),
            record("620342", FlowDirection::Import, 250.0),
            record("850110", FlowDirection::Export, 80.0),
        ]);

        assert_eq!(rows.len(), 3);
        let imports_28: f64 = rows
            .iter()
            .filter(|r| r.code == "28" && r.flow == FlowDirection::Import)
            .filter_map(|r| r.value)
            .sum();
        assert!((imports_28 - 1000.0).abs() < 1e-9);
        let total: f64 = rows.iter().filter_map(|r| r.value).sum();
        assert!((total - 1330.0).abs() < 1e-9);
    }

    #[test]
    fn raw_extract_parses_flow_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade.csv");
        std::fs::write(
            &path,
            "reporter,partner,flow,hs_code,year,value\n\
             kor,chn,M,010121,2001,10.5\n\
             KOR,CHN,X,010121,2001,\n\
             KOR,CHN,re-export,010121,2001,3\n",
        )
        .unwrap();

        let records = load_trade_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reporter, "KOR");
        assert_eq!(records[0].flow, FlowDirection::Import);
        assert_eq!(records[0].code, "010121");
        assert_eq!(records[1].value, None);
    }
}
