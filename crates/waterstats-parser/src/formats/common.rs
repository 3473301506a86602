use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord};
use polars::prelude::*;
use tracing::debug;

use crate::errors::ParserError;

/// Day-month-year, as exported by the source portal (`31-01-2023`).
pub const DATE_FORMAT: &str = "%d-%m-%Y";

// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since 1970-01-01, the physical value of a polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`epoch_days`]; `None` outside chrono's date range.
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

static NULL_TOKENS: &[&str] = &["na", "n/a", "nan", "null"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Text,
    Float,
}

/// A column the loader requires, with the header spellings it accepts.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn new(
        canonical: &'static str,
        aliases: &'static [&'static str],
        kind: ColumnKind,
    ) -> Self {
        Self {
            canonical,
            aliases,
            kind,
        }
    }

    pub fn matches(&self, header: &str) -> bool {
        let trimmed = header.trim();
        trimmed.eq_ignore_ascii_case(self.canonical)
            || self
                .aliases
                .iter()
                .any(|alias| trimmed.eq_ignore_ascii_case(alias))
    }
}

enum ColumnValues {
    Date(Vec<i32>),
    Text(Vec<String>),
    Float(Vec<Option<f64>>),
}

impl ColumnValues {
    fn new(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Date => ColumnValues::Date(Vec::new()),
            ColumnKind::Text => ColumnValues::Text(Vec::new()),
            ColumnKind::Float => ColumnValues::Float(Vec::new()),
        }
    }

    fn push(
        &mut self,
        parser: &'static str,
        column: &'static str,
        raw: &str,
        line_index: u64,
    ) -> Result<(), ParserError> {
        match self {
            ColumnValues::Date(values) => {
                let date = parse_date(parser, raw, line_index, column)?;
                values.push(epoch_days(date));
            }
            ColumnValues::Text(values) => values.push(raw.to_string()),
            ColumnValues::Float(values) => {
                values.push(parse_optional_f64(parser, raw, line_index, column)?)
            }
        }
        Ok(())
    }

    fn finish(self, name: &'static str) -> PolarsResult<Column> {
        let series = match self {
            ColumnValues::Date(days) => Series::new(name.into(), days).cast(&DataType::Date)?,
            ColumnValues::Text(values) => Series::new(name.into(), values),
            ColumnValues::Float(values) => Series::new(name.into(), values),
        };
        Ok(series.into())
    }
}

/// Parses CSV `content` into a DataFrame holding exactly `specs`, in spec order,
/// under their canonical names. Unknown columns are skipped.
pub(crate) fn parse_table(
    parser: &'static str,
    specs: &'static [ColumnSpec],
    content: &str,
) -> Result<DataFrame, ParserError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|source| ParserError::Csv { parser, source })?,
        None => return Err(ParserError::EmptyInput { parser }),
    };
    let positions = locate_columns(parser, specs, &header)?;

    let mut columns: Vec<ColumnValues> = specs.iter().map(|s| ColumnValues::new(s.kind)).collect();

    for record in records {
        let record = record.map_err(|source| ParserError::Csv { parser, source })?;
        let line_index = record.position().map(|p| p.line()).unwrap_or_default();

        for ((spec, &position), values) in specs.iter().zip(&positions).zip(columns.iter_mut()) {
            let raw = record.get(position).unwrap_or_default();
            values.push(parser, spec.canonical, raw, line_index)?;
        }
    }

    let columns = specs
        .iter()
        .zip(columns)
        .map(|(spec, values)| values.finish(spec.canonical))
        .collect::<PolarsResult<Vec<Column>>>()
        .map_err(|source| ParserError::Polars { parser, source })?;

    DataFrame::new(columns).map_err(|source| ParserError::Polars { parser, source })
}

fn locate_columns(
    parser: &'static str,
    specs: &[ColumnSpec],
    header: &StringRecord,
) -> Result<Vec<usize>, ParserError> {
    let mut positions = Vec::with_capacity(specs.len());

    for spec in specs {
        let mut matches = header
            .iter()
            .enumerate()
            .filter(|(_, name)| spec.matches(name))
            .map(|(idx, _)| idx);

        let position = matches.next().ok_or(ParserError::MissingColumn {
            parser,
            column: spec.canonical,
        })?;
        if matches.next().is_some() {
            return Err(ParserError::DuplicateColumn {
                parser,
                column: spec.canonical,
            });
        }
        positions.push(position);
    }

    for (idx, name) in header.iter().enumerate() {
        if !positions.contains(&idx) {
            debug!(parser, column = name, "ignoring unmapped column");
        }
    }

    Ok(positions)
}

pub(crate) fn parse_date(
    parser: &'static str,
    value: &str,
    line_index: u64,
    column: &'static str,
) -> Result<NaiveDate, ParserError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|err| ParserError::DataRow {
        parser,
        line_index,
        column,
        message: format!("invalid date '{trimmed}', expected DD-MM-YYYY: {err}"),
    })
}

pub(crate) fn parse_optional_f64(
    parser: &'static str,
    value: &str,
    line_index: u64,
    column: &'static str,
) -> Result<Option<f64>, ParserError> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || NULL_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return Ok(None);
    }

    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|err| ParserError::DataRow {
            parser,
            line_index,
            column,
            message: format!("failed to parse '{trimmed}' as float: {err}"),
        })
}
