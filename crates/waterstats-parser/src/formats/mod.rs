mod common;
mod evapotranspiration;
pub mod schema;
mod soil_moisture;

pub use common::{date_from_epoch_days, epoch_days, ColumnKind, ColumnSpec, DATE_FORMAT};
pub use evapotranspiration::EvapotranspirationParser;
pub use soil_moisture::SoilMoistureParser;

pub(crate) use common::parse_table;
