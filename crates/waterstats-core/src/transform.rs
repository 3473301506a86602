use polars::prelude::*;
use waterstats_parser::schema::{AVG_SOILMOISTURE_LEVEL_15CM, EVAPO_LEVEL_MM, KEY_COLUMNS};

use crate::schema::{target_projection, MOISTURE_DEFICIT, WATER_EFFICIENCY};

const EVAPO_ROW: &str = "__evapo_row";
const SOIL_ROW: &str = "__soil_row";
const KEY_ROWS: &str = "__key_rows";

#[derive(Debug, Clone)]
pub struct TransformReport {
    /// Joined rows in the output schema.
    pub frame: DataFrame,
    pub evapo_rows: usize,
    pub soil_rows: usize,
    /// Keys that occur more than once in the evapotranspiration table.
    pub evapo_duplicate_keys: usize,
    /// Keys that occur more than once in the soil moisture table.
    pub soil_duplicate_keys: usize,
}

impl TransformReport {
    pub fn joined_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn has_duplicate_keys(&self) -> bool {
        self.evapo_duplicate_keys > 0 || self.soil_duplicate_keys > 0
    }
}

/// Inner-joins the two measurement tables on (Date, StateName, DistrictName),
/// adds the derived columns and projects onto the output schema.
///
/// Rows keep the evapotranspiration table's order. A key repeated on either
/// side yields one row per pairing; the repeats are counted in the report.
pub fn join_measurements(evapo: &DataFrame, soil: &DataFrame) -> PolarsResult<TransformReport> {
    let evapo_duplicate_keys = duplicate_key_groups(evapo)?;
    let soil_duplicate_keys = duplicate_key_groups(soil)?;

    let keys: Vec<Expr> = KEY_COLUMNS.iter().map(|name| col(*name)).collect();

    let frame = evapo
        .clone()
        .lazy()
        .with_row_index(EVAPO_ROW, None)
        .join(
            soil.clone().lazy().with_row_index(SOIL_ROW, None),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Inner),
        )
        .sort([EVAPO_ROW, SOIL_ROW], SortMultipleOptions::default())
        .with_columns([water_efficiency(), moisture_deficit()])
        .select(target_projection())
        .collect()?;

    Ok(TransformReport {
        frame,
        evapo_rows: evapo.height(),
        soil_rows: soil.height(),
        evapo_duplicate_keys,
        soil_duplicate_keys,
    })
}

/// `AvgSoilmoistureLevel_15cm / EvapoLevel_mm`, dividing by 1 where the
/// evapotranspiration level is exactly zero. Nulls propagate.
pub fn water_efficiency() -> Expr {
    let denominator = when(col(EVAPO_LEVEL_MM).eq(lit(0.0)))
        .then(lit(1.0))
        .otherwise(col(EVAPO_LEVEL_MM));
    (col(AVG_SOILMOISTURE_LEVEL_15CM) / denominator).alias(WATER_EFFICIENCY)
}

/// `EvapoLevel_mm - AvgSoilmoistureLevel_15cm`.
pub fn moisture_deficit() -> Expr {
    (col(EVAPO_LEVEL_MM) - col(AVG_SOILMOISTURE_LEVEL_15CM)).alias(MOISTURE_DEFICIT)
}

/// Number of distinct join keys that appear on more than one row.
pub fn duplicate_key_groups(df: &DataFrame) -> PolarsResult<usize> {
    let groups = df
        .clone()
        .lazy()
        .group_by(KEY_COLUMNS)
        .agg([len().alias(KEY_ROWS)])
        .collect()?;

    // Eager: a lazy `gt(lit(1))` on the `len()` column panics in polars 0.48.
    let repeated = groups
        .column(KEY_ROWS)?
        .idx()?
        .into_iter()
        .filter(|rows| rows.is_some_and(|rows| rows > 1))
        .count();
    Ok(repeated)
}
