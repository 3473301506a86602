use crate::loader::MeasurementParser;

use super::schema::{
    AGGREGATE_EVAPO_LEVEL_MM, AGGREGATE_EVAPO_VOLUME_TMCFT, DATE, DISTRICT_NAME, EVAPO_LEVEL_MM,
    EVAPO_VOLUME_TMCFT, STATE_NAME,
};
use super::{ColumnKind, ColumnSpec};

/// District-level evapotranspiration export.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvapotranspirationParser;

impl EvapotranspirationParser {
    const NAME: &'static str = "EVAPOTRANSPIRATION";

    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::new(DATE, &[], ColumnKind::Date),
        ColumnSpec::new(STATE_NAME, &["State Name"], ColumnKind::Text),
        ColumnSpec::new(DISTRICT_NAME, &["District Name"], ColumnKind::Text),
        ColumnSpec::new(EVAPO_LEVEL_MM, &["Evapo Level (mm)"], ColumnKind::Float),
        ColumnSpec::new(EVAPO_VOLUME_TMCFT, &["Evapo Volume (Tmcft)"], ColumnKind::Float),
        ColumnSpec::new(
            AGGREGATE_EVAPO_LEVEL_MM,
            &["Aggregate Evapo Level (mm)"],
            ColumnKind::Float,
        ),
        ColumnSpec::new(
            AGGREGATE_EVAPO_VOLUME_TMCFT,
            &["Aggregate Evapo Volume (Tmcft)"],
            ColumnKind::Float,
        ),
    ];
}

impl MeasurementParser for EvapotranspirationParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        Self::COLUMNS
    }
}
