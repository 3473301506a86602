use std::fmt;
use std::str::FromStr;

use sqlx::postgres::{PgConnection, Postgres};
use sqlx::{Connection, QueryBuilder};
use tracing::info;

use crate::error::{PipelineError, Result, WriteStage};
use crate::schema::{DistrictWaterStats, TARGET_COLUMNS};

pub const DEFAULT_TABLE: &str = "district_water_stats";

/// Rows per INSERT statement; 13 binds each keeps a statement well under
/// the 65535 bind-parameter limit.
pub const INSERT_CHUNK_ROWS: usize = 1000;

const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated, optionally schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    name: String,
}

impl TableName {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// The name as it appears in SQL, each part double-quoted.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{schema}\".\"{}\"", self.name),
            None => format!("\"{}\"", self.name),
        }
    }
}

impl FromStr for TableName {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason| PipelineError::InvalidTableName {
            name: value.to_string(),
            reason,
        };

        let mut parts = value.split('.');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(invalid("expected at most one '.' separator"));
        }

        let (schema, name) = match second {
            Some(name) => (Some(first), name),
            None => (None, first),
        };
        for part in schema.into_iter().chain([name]) {
            validate_identifier(part).map_err(invalid)?;
        }

        Ok(Self {
            schema: schema.map(str::to_string),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

fn validate_identifier(ident: &str) -> std::result::Result<(), &'static str> {
    let mut chars = ident.chars();
    match chars.next() {
        None => return Err("identifier is empty"),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err("identifier must start with a letter or underscore")
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("identifier may only contain letters, digits and underscores");
    }
    if ident.len() > MAX_IDENTIFIER_LEN {
        return Err("identifier is longer than 63 bytes");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkReport {
    pub rows_written: u64,
}

pub fn create_table_sql(table: &TableName) -> String {
    let columns = TARGET_COLUMNS
        .iter()
        .map(|column| format!("    \"{}\" {}", column.name, column.sql_type.as_sql()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        table.quoted(),
        columns
    )
}

fn insert_prefix(table: &TableName) -> String {
    let columns = TARGET_COLUMNS
        .iter()
        .map(|column| format!("\"{}\"", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) ", table.quoted(), columns)
}

/// Creates the target table when absent. An existing table is left as is,
/// whatever its columns.
pub async fn ensure_table(conn: &mut PgConnection, table: &TableName) -> Result<()> {
    sqlx::query(&create_table_sql(table))
        .execute(&mut *conn)
        .await
        .map_err(PipelineError::write(WriteStage::CreateTable))?;
    info!(table = %table, "Table created successfully or already exists");
    Ok(())
}

/// Inserts every record inside one transaction. Either all rows commit or
/// the transaction is rolled back when it is dropped.
pub async fn insert_records(
    conn: &mut PgConnection,
    table: &TableName,
    records: &[DistrictWaterStats],
) -> Result<u64> {
    let mut tx = conn
        .begin()
        .await
        .map_err(PipelineError::write(WriteStage::Begin))?;

    let prefix = insert_prefix(table);
    let mut rows_written = 0;

    for chunk in records.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(prefix.as_str());
        builder.push_values(chunk, |mut row, record| {
            row.push_bind(record.date)
                .push_bind(record.state_name.as_str())
                .push_bind(record.district_name.as_str())
                .push_bind(record.evapotranspiration_level)
                .push_bind(record.evapotranspiration_volume)
                .push_bind(record.aggregate_evapotranspiration_level)
                .push_bind(record.aggregate_evapotranspiration_volume)
                .push_bind(record.avg_soilmoisture_level)
                .push_bind(record.avg_soilmoisture_volume)
                .push_bind(record.aggregate_soilmoisture_percentage)
                .push_bind(record.volume_soilmoisture_percentage)
                .push_bind(record.water_efficiency)
                .push_bind(record.moisture_deficit);
        });

        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(PipelineError::write(WriteStage::Insert))?;
        rows_written += result.rows_affected();
    }

    tx.commit()
        .await
        .map_err(PipelineError::write(WriteStage::Commit))?;
    Ok(rows_written)
}

/// Ensures the table, then writes all records.
pub async fn persist(
    conn: &mut PgConnection,
    table: &TableName,
    records: &[DistrictWaterStats],
) -> Result<SinkReport> {
    ensure_table(conn, table).await?;
    let rows_written = insert_records(conn, table, records).await?;
    info!(table = %table, rows = rows_written, "rows inserted successfully");
    Ok(SinkReport { rows_written })
}
