//! The `district_water_stats` output relation and its mapping from the
//! canonical measurement columns.

use chrono::NaiveDate;
use polars::prelude::*;
use waterstats_parser::date_from_epoch_days;
use waterstats_parser::schema::{
    AGGREGATE_EVAPO_LEVEL_MM, AGGREGATE_EVAPO_VOLUME_TMCFT, AGGREGATE_SOILMOISTURE_PERCENTAGE,
    AVG_SOILMOISTURE_LEVEL_15CM, AVG_SOILMOISTURE_VOLUME_15CM, DATE, DISTRICT_NAME,
    EVAPO_LEVEL_MM, EVAPO_VOLUME_TMCFT, STATE_NAME, VOLUME_SOILMOISTURE_PERCENTAGE,
};

/// Intermediate names of the derived columns before the rename.
pub const WATER_EFFICIENCY: &str = "WaterEfficiency";
pub const MOISTURE_DEFICIT: &str = "MoistureDeficit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Date,
    Text,
    Float,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Date => "DATE",
            SqlType::Text => "TEXT",
            SqlType::Float => "DOUBLE PRECISION",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TargetColumn {
    pub name: &'static str,
    pub source: &'static str,
    pub sql_type: SqlType,
}

const fn target(name: &'static str, source: &'static str, sql_type: SqlType) -> TargetColumn {
    TargetColumn {
        name,
        source,
        sql_type,
    }
}

/// Output columns in table order. Every persisted column is listed here;
/// anything else in the joined frame is dropped.
pub const TARGET_COLUMNS: [TargetColumn; 13] = [
    target("Date", DATE, SqlType::Date),
    target("StateName", STATE_NAME, SqlType::Text),
    target("DistrictName", DISTRICT_NAME, SqlType::Text),
    target("Evapotranspiration_Level", EVAPO_LEVEL_MM, SqlType::Float),
    target("Evapotranspiration_Volume", EVAPO_VOLUME_TMCFT, SqlType::Float),
    target(
        "Aggregate_Evapotranspiration_Level",
        AGGREGATE_EVAPO_LEVEL_MM,
        SqlType::Float,
    ),
    target(
        "Aggregate_Evapotranspiration_Volume",
        AGGREGATE_EVAPO_VOLUME_TMCFT,
        SqlType::Float,
    ),
    target("Avg_Soilmoisture_Level", AVG_SOILMOISTURE_LEVEL_15CM, SqlType::Float),
    target("Avg_Soilmoisture_Volume", AVG_SOILMOISTURE_VOLUME_15CM, SqlType::Float),
    target(
        "Aggregate_Soilmoisture_Percentage",
        AGGREGATE_SOILMOISTURE_PERCENTAGE,
        SqlType::Float,
    ),
    target(
        "Volume_Soilmoisture_Percentage",
        VOLUME_SOILMOISTURE_PERCENTAGE,
        SqlType::Float,
    ),
    target("Water_Efficiency", WATER_EFFICIENCY, SqlType::Float),
    target("Moisture_Deficit", MOISTURE_DEFICIT, SqlType::Float),
];

pub fn target_column_names() -> Vec<&'static str> {
    TARGET_COLUMNS.iter().map(|column| column.name).collect()
}

/// Selects and renames the joined frame into the output schema.
pub fn target_projection() -> Vec<Expr> {
    TARGET_COLUMNS
        .iter()
        .map(|column| col(column.source).alias(column.name))
        .collect()
}

/// One row of the output relation.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictWaterStats {
    pub date: NaiveDate,
    pub state_name: String,
    pub district_name: String,
    pub evapotranspiration_level: Option<f64>,
    pub evapotranspiration_volume: Option<f64>,
    pub aggregate_evapotranspiration_level: Option<f64>,
    pub aggregate_evapotranspiration_volume: Option<f64>,
    pub avg_soilmoisture_level: Option<f64>,
    pub avg_soilmoisture_volume: Option<f64>,
    pub aggregate_soilmoisture_percentage: Option<f64>,
    pub volume_soilmoisture_percentage: Option<f64>,
    pub water_efficiency: Option<f64>,
    pub moisture_deficit: Option<f64>,
}

impl DistrictWaterStats {
    /// Values rendered for display, in `TARGET_COLUMNS` order.
    pub fn display_cells(&self) -> Vec<String> {
        let float = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.state_name.clone(),
            self.district_name.clone(),
            float(self.evapotranspiration_level),
            float(self.evapotranspiration_volume),
            float(self.aggregate_evapotranspiration_level),
            float(self.aggregate_evapotranspiration_volume),
            float(self.avg_soilmoisture_level),
            float(self.avg_soilmoisture_volume),
            float(self.aggregate_soilmoisture_percentage),
            float(self.volume_soilmoisture_percentage),
            float(self.water_efficiency),
            float(self.moisture_deficit),
        ]
    }
}

/// Converts a frame in the output schema into typed rows.
pub fn records_from_frame(df: &DataFrame) -> PolarsResult<Vec<DistrictWaterStats>> {
    let [date_col, state_col, district_col] = [0, 1, 2].map(|idx| TARGET_COLUMNS[idx].name);

    let day_numbers = df.column(date_col)?.cast(&DataType::Int32)?;
    let days = day_numbers.i32()?;
    let states = df.column(state_col)?.str()?;
    let districts = df.column(district_col)?.str()?;

    let floats = TARGET_COLUMNS[3..]
        .iter()
        .map(|column| df.column(column.name)?.f64().cloned())
        .collect::<PolarsResult<Vec<Float64Chunked>>>()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let date = days
            .get(idx)
            .and_then(date_from_epoch_days)
            .ok_or_else(|| missing_value(date_col, idx))?;
        let state_name = states
            .get(idx)
            .ok_or_else(|| missing_value(state_col, idx))?
            .to_string();
        let district_name = districts
            .get(idx)
            .ok_or_else(|| missing_value(district_col, idx))?
            .to_string();
        let value = |column: usize| floats[column].get(idx);

        records.push(DistrictWaterStats {
            date,
            state_name,
            district_name,
            evapotranspiration_level: value(0),
            evapotranspiration_volume: value(1),
            aggregate_evapotranspiration_level: value(2),
            aggregate_evapotranspiration_volume: value(3),
            avg_soilmoisture_level: value(4),
            avg_soilmoisture_volume: value(5),
            aggregate_soilmoisture_percentage: value(6),
            volume_soilmoisture_percentage: value(7),
            water_efficiency: value(8),
            moisture_deficit: value(9),
        });
    }

    Ok(records)
}

fn missing_value(column: &str, idx: usize) -> PolarsError {
    PolarsError::ComputeError(format!("row {idx} has no value for key column '{column}'").into())
}
