//! The tabular state-vector series shared by every pipeline stage.

use anyhow::{Result, bail};
use chrono::NaiveDateTime;

/// A time-indexed table of numeric columns. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSeries {
    pub index: Vec<NaiveDateTime>,
    pub columns: Vec<String>,
    /// `rows[i]` belongs to `index[i]` and has one entry per column.
    pub rows: Vec<Vec<Option<f64>>>,
}

impl StateSeries {
    /// Builds a series, checking that every row matches the column count.
    pub fn new(
        index: Vec<NaiveDateTime>,
        columns: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if index.len() != rows.len() {
            bail!("index has {} entries but there are {} rows", index.len(), rows.len());
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            bail!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                columns.len()
            );
        }
        Ok(Self {
            index,
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Joins `other`'s columns to the right of `self`'s. Both must share
    /// the same index.
    pub fn concat_columns(mut self, other: StateSeries) -> Result<Self> {
        if self.index != other.index {
            bail!("cannot concatenate series with different timestamp indexes");
        }
        self.columns.extend(other.columns);
        for (row, extra) in self.rows.iter_mut().zip(other.rows) {
            row.extend(extra);
        }
        Ok(self)
    }

    /// Sum of the present values of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().flatten().sum())
            .collect()
    }
}

/// Mean of the present values, `None` when there are none.
pub fn mean_present<'a>(values: impl IntoIterator<Item = &'a Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Column-wise mean over a group of rows.
pub fn column_means(rows: &[&Vec<Option<f64>>], width: usize) -> Vec<Option<f64>> {
    (0..width)
        .map(|col| mean_present(rows.iter().map(|r| &r[col])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = StateSeries::new(
            vec![day(1)],
            vec!["a".into(), "b".into()],
            vec![vec![Some(1.0)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_concat_columns() {
        let left = StateSeries::new(vec![day(1)], vec!["a".into()], vec![vec![Some(1.0)]]).unwrap();
        let right = StateSeries::new(vec![day(1)], vec!["b".into()], vec![vec![None]]).unwrap();

        let joined = left.concat_columns(right).unwrap();

        assert_eq!(joined.columns, vec!["a", "b"]);
        assert_eq!(joined.rows, vec![vec![Some(1.0), None]]);
    }

    #[test]
    fn test_concat_rejects_misaligned_index() {
        let left = StateSeries::new(vec![day(1)], vec!["a".into()], vec![vec![Some(1.0)]]).unwrap();
        let right = StateSeries::new(vec![day(2)], vec!["b".into()], vec![vec![Some(1.0)]]).unwrap();

        assert!(left.concat_columns(right).is_err());
    }

    #[test]
    fn test_mean_present_skips_missing() {
        assert_eq!(mean_present(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean_present(&[None, None]), None);
    }

    #[test]
    fn test_row_sums_ignore_missing() {
        let s = StateSeries::new(
            vec![day(1)],
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Some(0.25), None, Some(0.5)]],
        )
        .unwrap();
        assert_eq!(s.row_sums(), vec![0.75]);
    }
}
