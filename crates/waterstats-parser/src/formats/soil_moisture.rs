use crate::loader::MeasurementParser;

use super::schema::{
    AGGREGATE_SOILMOISTURE_PERCENTAGE, AVG_SOILMOISTURE_LEVEL_15CM, AVG_SOILMOISTURE_VOLUME_15CM,
    DATE, DISTRICT_NAME, STATE_NAME, VOLUME_SOILMOISTURE_PERCENTAGE,
};
use super::{ColumnKind, ColumnSpec};

/// District-level soil moisture export, measured at 15cm depth.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoilMoistureParser;

impl SoilMoistureParser {
    const NAME: &'static str = "SOIL_MOISTURE";

    // Header spellings ("Perg", "percg") are the exporter's, not typos here.
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::new(DATE, &[], ColumnKind::Date),
        ColumnSpec::new(STATE_NAME, &["State Name"], ColumnKind::Text),
        ColumnSpec::new(DISTRICT_NAME, &["District Name"], ColumnKind::Text),
        ColumnSpec::new(
            AVG_SOILMOISTURE_LEVEL_15CM,
            &["Avg Soilmoisture Level (at 15cm)"],
            ColumnKind::Float,
        ),
        ColumnSpec::new(
            AVG_SOILMOISTURE_VOLUME_15CM,
            &["Avg SoilMoisture Volume (at 15cm)"],
            ColumnKind::Float,
        ),
        ColumnSpec::new(
            AGGREGATE_SOILMOISTURE_PERCENTAGE,
            &["Aggregate Soilmoisture Perg (at 15cm)"],
            ColumnKind::Float,
        ),
        ColumnSpec::new(
            VOLUME_SOILMOISTURE_PERCENTAGE,
            &["Volume Soilmoisture percg (at 15cm)"],
            ColumnKind::Float,
        ),
    ];
}

impl MeasurementParser for SoilMoistureParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        Self::COLUMNS
    }
}
