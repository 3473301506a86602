use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{parser} input is empty; expected a header row")]
    EmptyInput { parser: &'static str },

    #[error("{parser} header is missing required column '{column}'")]
    MissingColumn {
        parser: &'static str,
        column: &'static str,
    },

    #[error("{parser} header names column '{column}' more than once")]
    DuplicateColumn {
        parser: &'static str,
        column: &'static str,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} line {line_index}, column '{column}': {message}")]
    DataRow {
        parser: &'static str,
        line_index: u64,
        column: &'static str,
        message: String,
    },

    #[error("{parser} could not assemble table: {source}")]
    Polars {
        parser: &'static str,
        #[source]
        source: PolarsError,
    },
}
