//! Unified KSIC10 employment panel across classification revisions

use std::path::Path;

use crate::error::Result;
use crate::models::EmploymentRecord;
use crate::utils::numeric::add_skipna;

use super::concordance::{Concordance, IndustryRevision, Reclassify};

/// Default file names inside the crosswalk directory
pub const KSIC8_KSIC9_FILE: &str = "ksic8_ksic9.csv";
pub const KSIC9_KSIC10_FILE: &str = "ksic9_ksic10.csv";

impl Reclassify for EmploymentRecord {
    type Key = (String, i32);

    fn code(&self) -> &str {
        &self.industry
    }

    fn key(&self) -> Self::Key {
        (self.region.clone(), self.year)
    }

    fn reclassified(&self, code: &str, weight: f64) -> Self {
        Self {
            region: self.region.clone(),
            industry: code.to_string(),
            year: self.year,
            employment: self.employment.map(|v| v * weight),
            male: self.male.map(|v| v * weight),
            female: self.female.map(|v| v * weight),
        }
    }

    fn absorb(&mut self, other: Self) {
        add_skipna(&mut self.employment, other.employment);
        add_skipna(&mut self.male, other.male);
        add_skipna(&mut self.female, other.female);
    }
}

/// Converts census years published in KSIC8 or KSIC9 to KSIC10
#[derive(Debug, Clone)]
pub struct IndustryPanelBuilder {
    ksic9_10: Concordance,
    ksic8_10: Concordance,
}

impl IndustryPanelBuilder {
    /// Build from the two revision concordances; the KSIC8 path is the
    /// composition of both
    #[must_use]
    pub fn new(ksic8_9: &Concordance, ksic9_10: Concordance) -> Self {
        let (ksic8_10, _) = ksic8_9.chain(&ksic9_10);
        Self { ksic9_10, ksic8_10 }
    }

    /// Load both concordances from the crosswalk directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let ksic8_9 = Concordance::from_file("KSIC8>KSIC9", &dir.join(KSIC8_KSIC9_FILE))?;
        let ksic9_10 = Concordance::from_file("KSIC9>KSIC10", &dir.join(KSIC9_KSIC10_FILE))?;
        Ok(Self::new(&ksic8_9, ksic9_10))
    }

    /// Convert one census year to KSIC10 and fold it into
    /// (industry, region) cells
    #[must_use]
    pub fn harmonize_year(&self, year: i32, records: Vec<EmploymentRecord>) -> Vec<EmploymentRecord> {
        match IndustryRevision::for_establishment_year(year) {
            IndustryRevision::Ksic8 => self.ksic8_10.apply(records).rows,
            IndustryRevision::Ksic9 => self.ksic9_10.apply(records).rows,
            _ => fold_identity(records),
        }
    }

    /// Harmonise all years and return the panel sorted by
    /// (year, region, industry)
    pub fn build<I>(&self, years: I) -> Vec<EmploymentRecord>
    where
        I: IntoIterator<Item = (i32, Vec<EmploymentRecord>)>,
    {
        let mut panel: Vec<EmploymentRecord> = years
            .into_iter()
            .flat_map(|(year, records)| self.harmonize_year(year, records))
            .collect();
        panel.sort_by(|a, b| {
            (a.year, &a.region, &a.industry).cmp(&(b.year, &b.region, &b.industry))
        });
        panel
    }
}

/// Fold duplicates of records that are already in the target revision
fn fold_identity(records: Vec<EmploymentRecord>) -> Vec<EmploymentRecord> {
    let identity = Concordance::equal_split(
        "KSIC10",
        records
            .iter()
            .map(|r| (r.industry.clone(), r.industry.clone()))
            .collect::<Vec<_>>(),
    );
    identity.apply(records).rows
}
