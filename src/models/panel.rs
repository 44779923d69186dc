//! Analysis panel rows

use arrow_schema::{DataType, Field, Schema};
use serde::{Deserialize, Serialize};

use super::traits::ArrowSchema;

/// One ordered region pair in one regression period.
///
/// `migration` is a count and defaults to zero when no move was recorded.
/// Every other value is a join result and stays `None` when the join
/// missed; the regression layer decides which rows are usable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelRow {
    pub origin: String,
    pub destination: String,
    pub origin_cz: u32,
    pub destination_cz: u32,
    pub period: u8,
    pub migration: f64,
    pub migration_log_change: Option<f64>,

    pub x_import_origin: Option<f64>,
    pub x_export_origin: Option<f64>,
    pub x_import_destination: Option<f64>,
    pub x_export_destination: Option<f64>,
    pub z_import_origin: Option<f64>,
    pub z_export_origin: Option<f64>,
    pub z_import_destination: Option<f64>,
    pub z_export_destination: Option<f64>,

    pub o_manufacturing_share: Option<f64>,
    pub o_college_share: Option<f64>,
    pub o_foreign_share: Option<f64>,
    pub o_population: Option<f64>,
    pub o_pre_migration_log_change: Option<f64>,
    pub d_manufacturing_share: Option<f64>,
    pub d_college_share: Option<f64>,
    pub d_foreign_share: Option<f64>,
    pub d_population: Option<f64>,
    pub d_pre_migration_log_change: Option<f64>,

    pub population_weight: Option<f64>,
}

/// Numeric panel columns addressable by name from the analysis layer
pub const NUMERIC_COLUMNS: [&str; 21] = [
    "migration",
    "migration_log_change",
    "x_import_origin",
    "x_export_origin",
    "x_import_destination",
    "x_export_destination",
    "z_import_origin",
    "z_export_origin",
    "z_import_destination",
    "z_export_destination",
    "o_manufacturing_share",
    "o_college_share",
    "o_foreign_share",
    "o_population",
    "o_pre_migration_log_change",
    "d_manufacturing_share",
    "d_college_share",
    "d_foreign_share",
    "d_population",
    "d_pre_migration_log_change",
    "population_weight",
];

impl PanelRow {
    /// Look up a numeric column by name; unknown names give `None`
    #[must_use]
    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "migration" => Some(self.migration),
            "migration_log_change" => self.migration_log_change,
            "x_import_origin" => self.x_import_origin,
            "x_export_origin" => self.x_export_origin,
            "x_import_destination" => self.x_import_destination,
            "x_export_destination" => self.x_export_destination,
            "z_import_origin" => self.z_import_origin,
            "z_export_origin" => self.z_export_origin,
            "z_import_destination" => self.z_import_destination,
            "z_export_destination" => self.z_export_destination,
            "o_manufacturing_share" => self.o_manufacturing_share,
            "o_college_share" => self.o_college_share,
            "o_foreign_share" => self.o_foreign_share,
            "o_population" => self.o_population,
            "o_pre_migration_log_change" => self.o_pre_migration_log_change,
            "d_manufacturing_share" => self.d_manufacturing_share,
            "d_college_share" => self.d_college_share,
            "d_foreign_share" => self.d_foreign_share,
            "d_population" => self.d_population,
            "d_pre_migration_log_change" => self.d_pre_migration_log_change,
            "population_weight" => self.population_weight,
            _ => None,
        }
    }
}

impl ArrowSchema for PanelRow {
    fn schema() -> Schema {
        let mut fields = vec![
            Field::new("origin", DataType::Utf8, false),
            Field::new("destination", DataType::Utf8, false),
            Field::new("origin_cz", DataType::UInt32, false),
            Field::new("destination_cz", DataType::UInt32, false),
            Field::new("period", DataType::UInt8, false),
            Field::new("migration", DataType::Float64, false),
        ];
        fields.extend(
            NUMERIC_COLUMNS[1..]
                .iter()
                .map(|name| Field::new(*name, DataType::Float64, true)),
        );
        Schema::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_matches_struct_order() {
        let schema = PanelRow::schema();
        assert_eq!(schema.fields().len(), 26);
        assert_eq!(schema.field(6).name(), "migration_log_change");
        assert_eq!(schema.field(25).name(), "population_weight");
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
    }

    #[test]
    fn batch_conversion_keeps_nulls() {
        let row = PanelRow {
            origin: "11010".into(),
            destination: "21010".into(),
            origin_cz: 1,
            destination_cz: 2,
            period: 1,
            migration: 12.0,
            z_import_origin: Some(0.25),
            ..Default::default()
        };
        let batch = PanelRow::to_record_batch(std::slice::from_ref(&row)).unwrap();
        assert_eq!(batch.num_rows(), 1);
        let back = PanelRow::from_record_batch(&batch).unwrap();
        assert_eq!(back, vec![row]);
        assert!(back[0].o_college_share.is_none());
    }
}
