pub mod errors;
pub mod formats;
mod loader;

pub use errors::ParserError;
pub use formats::schema;
pub use formats::{
    date_from_epoch_days, epoch_days, ColumnKind, ColumnSpec, EvapotranspirationParser,
    SoilMoistureParser, DATE_FORMAT,
};
pub use loader::{load_measurements, MeasurementParser};
