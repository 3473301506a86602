use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::info;

use crate::errors::ParserError;
use crate::formats::{parse_table, ColumnSpec};

/// One CSV export layout: its name for error reporting and the columns it must carry.
pub trait MeasurementParser {
    fn name(&self) -> &'static str;
    fn columns(&self) -> &'static [ColumnSpec];

    fn parse(&self, content: &str) -> Result<DataFrame, ParserError> {
        parse_table(self.name(), self.columns(), content)
    }
}

/// Reads `path` and parses it with `parser`.
pub fn load_measurements(
    path: &Path,
    parser: &dyn MeasurementParser,
) -> Result<DataFrame, ParserError> {
    let content = fs::read_to_string(path).map_err(|source| ParserError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let df = parser.parse(&content)?;
    info!(
        parser = parser.name(),
        path = %path.display(),
        rows = df.height(),
        "Loaded measurement table"
    );
    Ok(df)
}
