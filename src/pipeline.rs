//! End-to-end batch run: ingest, transform, aggregate, export.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregate::{AggregationPeriod, aggregate};
use crate::ingest::load_dataset;
use crate::output::{state_vector_file_name, write_series};
use crate::transform::build_state_vector;

/// Default substring marking categorical input files.
pub const DEFAULT_CATEGORICAL_MARKER: &str = "description";

/// What one [`process_weather_data`] run produced.
#[derive(Debug, Serialize)]
pub struct ProcessSummary {
    pub period: String,
    pub categorical: Vec<String>,
    pub continuous: Vec<String>,
    pub locations: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Builds one aggregated state-vector CSV per location.
///
/// Locations are processed in the column order of the first continuous
/// variable. `output_dir` is created if needed. A failure part-way leaves
/// the files of already processed locations in place.
#[tracing::instrument(skip_all, fields(
    source_dir = %source_dir.display(),
    output_dir = %output_dir.display(),
    period = %period
))]
pub fn process_weather_data(
    source_dir: &Path,
    output_dir: &Path,
    period: AggregationPeriod,
    categorical_marker: &str,
) -> Result<ProcessSummary> {
    let dataset = load_dataset(source_dir, categorical_marker)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let locations = dataset.locations()?.to_vec();
    let mut files = Vec::with_capacity(locations.len());

    for location in &locations {
        let state = build_state_vector(&dataset, location)
            .with_context(|| format!("building state vector for '{}'", location))?;
        let aggregated = aggregate(&state, period)
            .with_context(|| format!("aggregating '{}' by {}", location, period))?;

        let path = output_dir.join(state_vector_file_name(location, period));
        write_series(&path, &aggregated)?;

        info!(
            location = %location,
            rows = aggregated.len(),
            columns = aggregated.columns.len(),
            path = %path.display(),
            "Location processed"
        );
        files.push(path);
    }

    info!(locations = locations.len(), "Processing complete");

    Ok(ProcessSummary {
        period: period.to_string(),
        categorical: dataset.categorical,
        continuous: dataset.continuous,
        locations,
        files,
    })
}
