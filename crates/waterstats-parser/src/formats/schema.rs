//! Canonical column names shared by the loaders and the transform step.

pub const DATE: &str = "Date";
pub const STATE_NAME: &str = "StateName";
pub const DISTRICT_NAME: &str = "DistrictName";

/// Composite natural key present in both measurement tables.
pub const KEY_COLUMNS: [&str; 3] = [DATE, STATE_NAME, DISTRICT_NAME];

pub const EVAPO_LEVEL_MM: &str = "EvapoLevel_mm";
pub const EVAPO_VOLUME_TMCFT: &str = "EvapoVolume_Tmcft";
pub const AGGREGATE_EVAPO_LEVEL_MM: &str = "AggregateEvapoLevel_mm";
pub const AGGREGATE_EVAPO_VOLUME_TMCFT: &str = "AggregateEvapoVolume_Tmcft";

pub const AVG_SOILMOISTURE_LEVEL_15CM: &str = "AvgSoilmoistureLevel_15cm";
pub const AVG_SOILMOISTURE_VOLUME_15CM: &str = "AvgSoilmoistureVolume_15cm";
pub const AGGREGATE_SOILMOISTURE_PERCENTAGE: &str = "AggregateSoilmoisturePercentage";
pub const VOLUME_SOILMOISTURE_PERCENTAGE: &str = "VolumeSoilmoisturePercentage";

pub const EVAPOTRANSPIRATION_COLUMNS: [&str; 7] = [
    DATE,
    STATE_NAME,
    DISTRICT_NAME,
    EVAPO_LEVEL_MM,
    EVAPO_VOLUME_TMCFT,
    AGGREGATE_EVAPO_LEVEL_MM,
    AGGREGATE_EVAPO_VOLUME_TMCFT,
];

pub const SOIL_MOISTURE_COLUMNS: [&str; 7] = [
    DATE,
    STATE_NAME,
    DISTRICT_NAME,
    AVG_SOILMOISTURE_LEVEL_15CM,
    AVG_SOILMOISTURE_VOLUME_15CM,
    AGGREGATE_SOILMOISTURE_PERCENTAGE,
    VOLUME_SOILMOISTURE_PERCENTAGE,
];
