//! CSV persistence for state-vector series and run summaries.
//!
//! Supports JSON summaries and CSV export/import.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDateTime, NaiveTime};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::aggregate::AggregationPeriod;
use crate::series::StateSeries;
use crate::table::{INDEX_COLUMN, parse_timestamp, parse_value};

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `{location}_state_vector_{period}.csv`
///
/// `period` is written in its canonical form, so `MS` and `ME` both name
/// files `_M` and `h` names them `_H`.
pub fn state_vector_file_name(location: &str, period: AggregationPeriod) -> String {
    format!("{}_state_vector_{}.csv", location, period)
}

fn format_timestamp(ts: &NaiveDateTime, date_only: bool) -> String {
    if date_only {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Shortest round-trip text with a trailing `.0` on integral values.
fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => String::new(),
    }
}

/// Writes `series` to `path`, replacing any existing file.
///
/// The first column is `datetime`. Timestamps drop their time part when
/// every index entry falls on midnight. Missing values are empty cells.
pub fn write_series(path: &Path, series: &StateSeries) -> Result<()> {
    debug!(path = %path.display(), rows = series.len(), "Writing series CSV");

    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    let mut header = Vec::with_capacity(series.columns.len() + 1);
    header.push(INDEX_COLUMN);
    header.extend(series.columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    let date_only = series.index.iter().all(|ts| ts.time() == NaiveTime::MIN);

    for (ts, row) in series.index.iter().zip(&series.rows) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(format_timestamp(ts, date_only));
        record.extend(row.iter().map(|v| format_value(*v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads a series written by [`write_series`]. The first column is the
/// timestamp index whatever its header says.
pub fn read_series(path: &Path) -> Result<StateSeries> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        bail!("{} has no header", path.display());
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut index = Vec::new();
    let mut rows = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("malformed row in {}", path.display()))?;
        let mut fields = record.iter();

        let raw_ts = fields
            .next()
            .ok_or_else(|| anyhow!("{} data row {} is empty", path.display(), line + 1))?;
        index.push(
            parse_timestamp(raw_ts)
                .with_context(|| format!("{} data row {}", path.display(), line + 1))?,
        );

        let row = fields
            .map(parse_value)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("{} data row {}", path.display(), line + 1))?;
        rows.push(row);
    }

    StateSeries::new(index, columns, rows)
}
