use std::fmt;

use polars::error::PolarsError;
use thiserror::Error;
use waterstats_parser::ParserError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to load {source_name} data: {source}")]
    Load {
        source_name: &'static str,
        #[source]
        source: ParserError,
    },

    #[error("transform failed: {0}")]
    Transform(#[from] PolarsError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("{stage} failed: {source}")]
    Write {
        stage: WriteStage,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Short label used as the `category` field when a run fails.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Load { .. } => "load",
            PipelineError::Transform(_) => "transform",
            PipelineError::Connection(_) => "connection",
            PipelineError::Write { .. } => "write",
            PipelineError::InvalidTableName { .. } | PipelineError::Config(_) => "config",
        }
    }

    pub(crate) fn write(stage: WriteStage) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| PipelineError::Write { stage, source }
    }
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("DATABASE_URL (or WATERSTATS_DATABASE_URL) must be set")]
    MissingUrl,

    #[error("invalid username or password: {0}")]
    AccessDenied(#[source] sqlx::Error),

    #[error("database does not exist: {0}")]
    UnknownDatabase(#[source] sqlx::Error),

    #[error("failed to connect to Postgres: {0}")]
    Unavailable(#[source] sqlx::Error),
}

impl ConnectionError {
    /// Sorts a connect failure by its SQLSTATE.
    pub fn classify(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            // invalid_password, invalid_authorization_specification
            Some("28P01") | Some("28000") => ConnectionError::AccessDenied(err),
            // invalid_catalog_name
            Some("3D000") => ConnectionError::UnknownDatabase(err),
            _ => ConnectionError::Unavailable(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    CreateTable,
    Begin,
    Insert,
    Commit,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteStage::CreateTable => "creating target table",
            WriteStage::Begin => "beginning transaction",
            WriteStage::Insert => "inserting rows",
            WriteStage::Commit => "committing transaction",
        };
        f.write_str(label)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
