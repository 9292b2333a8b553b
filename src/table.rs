//! Time-indexed tables read from per-variable CSV files.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Name of the timestamp column every input file must carry.
pub const INDEX_COLUMN: &str = "datetime";

/// How a variable is fed into the state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Labels such as `clear sky`, one-hot encoded.
    Categorical,
    /// Numeric measurements, min-max scaled.
    Continuous,
}

impl VariableKind {
    /// Classifies a file by whether its name contains `marker`.
    pub fn from_file_name(file_name: &str, marker: &str) -> Self {
        if file_name.contains(marker) {
            VariableKind::Categorical
        } else {
            VariableKind::Continuous
        }
    }
}

/// One measured quantity: timestamp index × location columns of raw cell text.
#[derive(Debug, Clone)]
pub struct VariableTable {
    pub name: String,
    pub kind: VariableKind,
    pub index: Vec<NaiveDateTime>,
    pub locations: Vec<String>,
    /// Row-major cells, `cells[row][location]`.
    pub cells: Vec<Vec<String>>,
}

impl VariableTable {
    fn location_position(&self, location: &str) -> Result<usize> {
        self.locations
            .iter()
            .position(|l| l == location)
            .ok_or_else(|| anyhow!("variable '{}' has no column for location '{}'", self.name, location))
    }

    /// Raw labels for one location, in index order.
    pub fn labels(&self, location: &str) -> Result<Vec<&str>> {
        let col = self.location_position(location)?;
        Ok(self.cells.iter().map(|row| row[col].as_str()).collect())
    }

    /// Numeric values for one location; empty cells and `NaN` are missing.
    pub fn values(&self, location: &str) -> Result<Vec<Option<f64>>> {
        let col = self.location_position(location)?;
        self.cells
            .iter()
            .zip(&self.index)
            .map(|(row, ts)| {
                parse_value(&row[col]).map_err(|e| {
                    anyhow!("variable '{}', location '{}' at {}: {}", self.name, location, ts, e)
                })
            })
            .collect()
    }
}

/// Parses a numeric cell. Empty, `NaN` and `nan` are missing.
pub fn parse_value(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| anyhow!("invalid number '{}'", trimmed))?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parses the timestamp forms found in weather exports.
///
/// Offsets (RFC 3339) are converted to UTC and dropped.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(d.and_time(NaiveTime::MIN));
        }
    }

    Err(anyhow!("unparseable timestamp '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sample_table() -> VariableTable {
        VariableTable {
            name: "temperature".to_string(),
            kind: VariableKind::Continuous,
            index: vec![ts("2024-01-01 00:00:00"), ts("2024-01-01 01:00:00")],
            locations: vec!["Tokyo".to_string(), "Osaka".to_string()],
            cells: vec![
                vec!["1.5".to_string(), "".to_string()],
                vec!["NaN".to_string(), "-3".to_string()],
            ],
        }
    }

    #[test]
    fn test_classify_by_marker() {
        assert_eq!(
            VariableKind::from_file_name("weather_description.csv", "description"),
            VariableKind::Categorical
        );
        assert_eq!(
            VariableKind::from_file_name("humidity.csv", "description"),
            VariableKind::Continuous
        );
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = ts("2012-10-01 13:00:00");
        assert_eq!(parse_timestamp("2012-10-01 13:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2012-10-01T13:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2012-10-01 13:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2012/10/01 13:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2012-10-01T15:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2012-10-01").unwrap(), ts("2012-10-01 00:00:00"));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_values_treat_blank_and_nan_as_missing() {
        let table = sample_table();
        assert_eq!(table.values("Tokyo").unwrap(), vec![Some(1.5), None]);
        assert_eq!(table.values("Osaka").unwrap(), vec![None, Some(-3.0)]);
    }

    #[test]
    fn test_unknown_location_is_error() {
        let table = sample_table();
        let err = table.labels("Kyoto").unwrap_err();
        assert!(err.to_string().contains("Kyoto"));
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let mut table = sample_table();
        table.cells[0][0] = "warm".to_string();
        let err = table.values("Tokyo").unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }
}
