pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod transform;

pub use config::PipelineConfig;
pub use error::{ConnectionError, PipelineError, Result, WriteStage};
pub use pipeline::{PipelineRun, PreparedRun, RunSummary};
pub use schema::DistrictWaterStats;
pub use sink::{SinkReport, TableName};
pub use transform::TransformReport;
