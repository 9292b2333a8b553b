//! Discovery and loading of per-variable weather CSV files.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::table::{INDEX_COLUMN, VariableKind, VariableTable, parse_timestamp};

/// All variable tables of one source directory.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub tables: BTreeMap<String, VariableTable>,
    /// Categorical variable names, in file name order.
    pub categorical: Vec<String>,
    /// Continuous variable names, in file name order.
    pub continuous: Vec<String>,
}

impl Dataset {
    /// Looks up a variable table by name.
    pub fn table(&self, name: &str) -> Result<&VariableTable> {
        self.tables
            .get(name)
            .ok_or_else(|| anyhow!("unknown variable '{}'", name))
    }

    /// Locations to process: the columns of the first continuous variable.
    pub fn locations(&self) -> Result<&[String]> {
        let first = self
            .continuous
            .first()
            .ok_or_else(|| anyhow!("no continuous variables in dataset"))?;
        Ok(&self.table(first)?.locations)
    }
}

/// Variable name for a CSV file: the file name up to its first `.`.
pub fn variable_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Lists `*.csv` files in `dir`, sorted by file name.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type()?.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Reads every CSV file in `source_dir` into a [`Dataset`].
///
/// Files whose name contains `categorical_marker` are categorical, all
/// others continuous.
///
/// # Errors
///
/// Fails when the directory is missing or holds no CSV files, or when any
/// file cannot be parsed by [`read_variable_table`].
#[tracing::instrument(skip_all, fields(source_dir = %source_dir.display(), categorical_marker = %categorical_marker))]
pub fn load_dataset(source_dir: &Path, categorical_marker: &str) -> Result<Dataset> {
    let files = discover_csv_files(source_dir)?;
    if files.is_empty() {
        bail!("no CSV files found in {}", source_dir.display());
    }

    let mut tables = BTreeMap::new();
    let mut categorical = Vec::new();
    let mut continuous = Vec::new();

    for path in files {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("non UTF-8 file name {}", path.display()))?;
        let name = variable_name(file_name).to_string();
        let kind = VariableKind::from_file_name(file_name, categorical_marker);

        let table = read_variable_table(&path, kind)?;

        debug!(
            variable = %name,
            ?kind,
            rows = table.index.len(),
            locations = table.locations.len(),
            "Variable table loaded"
        );

        match kind {
            VariableKind::Categorical => categorical.push(name.clone()),
            VariableKind::Continuous => continuous.push(name.clone()),
        }
        if tables.insert(name.clone(), table).is_some() {
            bail!("variable '{}' defined by more than one file", name);
        }
    }

    info!(?categorical, "Categorical variables");
    info!(?continuous, "Continuous variables");

    Ok(Dataset {
        tables,
        categorical,
        continuous,
    })
}

/// Reads one variable CSV: a `datetime` column plus one column per location.
///
/// The table is named after the file (see [`variable_name`]).
pub fn read_variable_table(path: &Path, kind: VariableKind) -> Result<VariableTable> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr
        .headers()
        .with_context(|| format!("cannot read header of {}", path.display()))?
        .clone();

    let index_pos = headers
        .iter()
        .position(|h| h.trim() == INDEX_COLUMN)
        .ok_or_else(|| anyhow!("{} has no '{}' column", path.display(), INDEX_COLUMN))?;

    let locations: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index_pos)
        .map(|(_, h)| h.trim().to_string())
        .collect();

    let mut index = Vec::new();
    let mut cells = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("malformed row in {}", path.display()))?;

        let raw_ts = record.get(index_pos).unwrap_or_default();
        let ts = parse_timestamp(raw_ts)
            .with_context(|| format!("{} data row {}", path.display(), line + 1))?;

        let row: Vec<String> = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_pos)
            .map(|(_, v)| v.to_string())
            .collect();

        index.push(ts);
        cells.push(row);
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(variable_name)
        .unwrap_or_default()
        .to_string();

    Ok(VariableTable {
        name,
        kind,
        index,
        locations,
        cells,
    })
}
