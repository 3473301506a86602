use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;
use waterstats_parser::{
    load_measurements, EvapotranspirationParser, MeasurementParser, SoilMoistureParser,
};

use crate::config::PipelineConfig;
use crate::db;
use crate::error::{ConnectionError, PipelineError, Result};
use crate::schema::{records_from_frame, DistrictWaterStats};
use crate::sink::{self, SinkReport, TableName};
use crate::transform::{self, TransformReport};

/// Identity and logging scope of one invocation. Every stage logs under
/// a child of `span`.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    span: Span,
}

impl PipelineRun {
    pub fn new() -> Self {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        Self { run_id, span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of the load and transform stages, ready for the sink.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub transform: TransformReport,
    pub records: Vec<DistrictWaterStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub evapo_rows: usize,
    pub soil_rows: usize,
    pub joined_rows: usize,
    /// `None` on a dry run.
    pub rows_written: Option<u64>,
}

/// Runs load, transform and, unless `config.dry_run`, the sink.
pub async fn run(config: &PipelineConfig, run: &PipelineRun) -> Result<RunSummary> {
    // Reject a bad table name before any work is done.
    let table: TableName = config.table.parse()?;
    let prepared = prepare(config, run)?;

    let rows_written = if config.dry_run {
        info!(
            parent: run.span(),
            joined_rows = prepared.records.len(),
            "Dry run: skipping database write"
        );
        None
    } else {
        let report = sink_stage(config, &table, &prepared.records)
            .instrument(info_span!(parent: run.span(), "sink", table = %table))
            .await?;
        Some(report.rows_written)
    };

    let summary = RunSummary {
        run_id: run.run_id,
        evapo_rows: prepared.transform.evapo_rows,
        soil_rows: prepared.transform.soil_rows,
        joined_rows: prepared.transform.joined_rows(),
        rows_written,
    };
    info!(
        parent: run.span(),
        joined_rows = summary.joined_rows,
        rows_written = ?summary.rows_written,
        "Pipeline run complete"
    );
    Ok(summary)
}

/// Loads both sources and joins them.
pub fn prepare(config: &PipelineConfig, run: &PipelineRun) -> Result<PreparedRun> {
    let (evapo, soil) = {
        let _stage = info_span!(parent: run.span(), "load").entered();
        let evapo = load_stage(
            &config.evapotranspiration_path,
            &EvapotranspirationParser,
            "evapotranspiration",
        )?;
        let soil = load_stage(&config.soil_moisture_path, &SoilMoistureParser, "soil moisture")?;
        info!("CSV files loaded successfully");
        (evapo, soil)
    };

    let _stage = info_span!(parent: run.span(), "transform").entered();
    let report = transform::join_measurements(&evapo, &soil)?;
    if report.has_duplicate_keys() {
        warn!(
            evapo_duplicate_keys = report.evapo_duplicate_keys,
            soil_duplicate_keys = report.soil_duplicate_keys,
            "join keys are not unique; repeated keys produce one row per pairing"
        );
    }
    let records = records_from_frame(&report.frame)?;
    info!(
        evapo_rows = report.evapo_rows,
        soil_rows = report.soil_rows,
        joined_rows = records.len(),
        "Data transformation complete"
    );

    Ok(PreparedRun {
        transform: report,
        records,
    })
}

fn load_stage(
    path: &Path,
    parser: &dyn MeasurementParser,
    source_name: &'static str,
) -> Result<DataFrame> {
    load_measurements(path, parser).map_err(|source| PipelineError::Load {
        source_name,
        source,
    })
}

/// Holds the run's only connection and closes it whatever the sink returns.
async fn sink_stage(
    config: &PipelineConfig,
    table: &TableName,
    records: &[DistrictWaterStats],
) -> Result<SinkReport> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(ConnectionError::MissingUrl)?;

    let mut conn = db::connect(database_url).await?;
    let result = sink::persist(&mut conn, table, records).await;
    db::close(conn).await;
    result
}
