//! Per-location state-vector construction.
//!
//! For one location this encodes every categorical variable as one-hot
//! columns, min-max scales every continuous variable, joins the two blocks
//! and renormalizes each row so it sums to 1.

pub mod minmax;
pub mod onehot;

pub use minmax::MinMaxScaler;
pub use onehot::OneHotEncoder;

use anyhow::{Result, bail};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::ingest::Dataset;
use crate::series::StateSeries;

fn check_aligned(dataset: &Dataset, index: &[NaiveDateTime]) -> Result<()> {
    for name in dataset.categorical.iter().chain(&dataset.continuous) {
        if dataset.table(name)?.index != index {
            bail!("variable '{}' is not aligned with the shared timestamp index", name);
        }
    }
    Ok(())
}

/// One-hot block for `location`, one column per category of each variable.
pub fn categorical_block(
    dataset: &Dataset,
    location: &str,
    index: &[NaiveDateTime],
) -> Result<StateSeries> {
    let columns = dataset
        .categorical
        .iter()
        .map(|var| dataset.table(var)?.labels(location))
        .collect::<Result<Vec<_>>>()?;

    let (encoder, encoded) = OneHotEncoder::fit_transform(&dataset.categorical, &columns)?;

    let rows = if columns.is_empty() {
        vec![Vec::new(); index.len()]
    } else {
        encoded
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect()
    };

    StateSeries::new(index.to_vec(), encoder.feature_names_out(), rows)
}

/// Scaled block for `location`, one column per continuous variable.
pub fn continuous_block(
    dataset: &Dataset,
    location: &str,
    index: &[NaiveDateTime],
) -> Result<StateSeries> {
    let columns = dataset
        .continuous
        .iter()
        .map(|var| dataset.table(var)?.values(location))
        .collect::<Result<Vec<_>>>()?;

    let (_, scaled) = MinMaxScaler::fit_transform(&columns);

    let rows = (0..index.len())
        .map(|row| scaled.iter().map(|col| col[row]).collect())
        .collect();

    StateSeries::new(index.to_vec(), dataset.continuous.clone(), rows)
}

/// Divides each row by its sum so the present components add up to 1.
///
/// Rows that sum to zero are left as zeros. Returns how many there were.
pub fn normalize_rows(series: &mut StateSeries) -> usize {
    let sums = series.row_sums();
    let mut zero_rows = 0;
    for (row, sum) in series.rows.iter_mut().zip(sums) {
        if sum == 0.0 {
            zero_rows += 1;
            continue;
        }
        for v in row.iter_mut().flatten() {
            *v /= sum;
        }
    }
    zero_rows
}

/// Builds the normalized state vector series for one location.
///
/// Columns are the one-hot columns first, then the continuous variables in
/// dataset order.
#[tracing::instrument(skip(dataset))]
pub fn build_state_vector(dataset: &Dataset, location: &str) -> Result<StateSeries> {
    let Some(first) = dataset.continuous.first() else {
        bail!("no continuous variables in dataset");
    };
    let index = dataset.table(first)?.index.clone();
    check_aligned(dataset, &index)?;

    let onehot = categorical_block(dataset, location, &index)?;
    let scaled = continuous_block(dataset, location, &index)?;

    let mut state = onehot.concat_columns(scaled)?;
    let zero_rows = normalize_rows(&mut state);
    if zero_rows > 0 {
        warn!(location, zero_rows, "Rows summing to zero left unnormalized");
    }

    debug!(
        location,
        rows = state.len(),
        columns = state.columns.len(),
        "State vector built"
    );

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{VariableKind, VariableTable};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn table(name: &str, kind: VariableKind, cells: &[[&str; 2]]) -> VariableTable {
        VariableTable {
            name: name.to_string(),
            kind,
            index: (0..cells.len() as u32).map(hour).collect(),
            locations: vec!["Tokyo".to_string(), "Osaka".to_string()],
            cells: cells
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn dataset(tables: Vec<VariableTable>) -> Dataset {
        let mut categorical = Vec::new();
        let mut continuous = Vec::new();
        let mut map = BTreeMap::new();
        for t in tables {
            match t.kind {
                VariableKind::Categorical => categorical.push(t.name.clone()),
                VariableKind::Continuous => continuous.push(t.name.clone()),
            }
            map.insert(t.name.clone(), t);
        }
        Dataset {
            tables: map,
            categorical,
            continuous,
        }
    }

    fn sample() -> Dataset {
        dataset(vec![
            table(
                "weather_description",
                VariableKind::Categorical,
                &[["rain", "clear"], ["clear", "clear"], ["rain", "snow"]],
            ),
            table(
                "temperature",
                VariableKind::Continuous,
                &[["270", "1"], ["280", "2"], ["290", "3"]],
            ),
            table(
                "humidity",
                VariableKind::Continuous,
                &[["0", "50"], ["10", "50"], ["5", ""]],
            ),
        ])
    }

    #[test]
    fn test_column_order_is_onehot_then_continuous() {
        let state = build_state_vector(&sample(), "Tokyo").unwrap();
        assert_eq!(
            state.columns,
            vec![
                "weather_description_clear",
                "weather_description_rain",
                "temperature",
                "humidity",
            ]
        );
    }

    #[test]
    fn test_rows_sum_to_one() {
        let ds = sample();
        for location in ["Tokyo", "Osaka"] {
            let state = build_state_vector(&ds, location).unwrap();
            for sum in state.row_sums() {
                assert!((sum - 1.0).abs() < 1e-12, "{location}: {sum}");
            }
            for v in state.rows.iter().flatten().flatten() {
                assert!(*v >= 0.0);
            }
        }
    }

    #[test]
    fn test_values_are_scaled_before_normalizing() {
        let state = build_state_vector(&sample(), "Tokyo").unwrap();
        // row 1: clear=1, rain=0, temperature=0.5, humidity=1.0 -> sum 2.5
        assert_eq!(
            state.rows[1],
            vec![Some(0.4), Some(0.0), Some(0.2), Some(0.4)]
        );
    }

    #[test]
    fn test_missing_value_stays_missing() {
        let state = build_state_vector(&sample(), "Osaka").unwrap();
        assert_eq!(state.rows[2][3], None);
    }

    #[test]
    fn test_locations_have_their_own_categories() {
        let state = build_state_vector(&sample(), "Osaka").unwrap();
        assert_eq!(
            &state.columns[..2],
            ["weather_description_clear", "weather_description_snow"]
        );
    }

    #[test]
    fn test_zero_sum_rows_stay_zero() {
        let ds = dataset(vec![table(
            "temperature",
            VariableKind::Continuous,
            &[["4", "4"], ["4", "4"]],
        )]);

        let state = build_state_vector(&ds, "Tokyo").unwrap();

        assert_eq!(state.rows, vec![vec![Some(0.0)], vec![Some(0.0)]]);
    }

    #[test]
    fn test_misaligned_tables_fail() {
        let mut ds = sample();
        ds.tables.get_mut("humidity").unwrap().index[0] = hour(23);

        let err = build_state_vector(&ds, "Tokyo").unwrap_err();
        assert!(err.to_string().contains("humidity"));
    }

    #[test]
    fn test_no_continuous_variables_fails() {
        let ds = dataset(vec![table(
            "weather_description",
            VariableKind::Categorical,
            &[["rain", "rain"]],
        )]);
        assert!(build_state_vector(&ds, "Tokyo").is_err());
    }

    #[test]
    fn test_unknown_location_fails() {
        assert!(build_state_vector(&sample(), "Nagoya").is_err());
    }
}
