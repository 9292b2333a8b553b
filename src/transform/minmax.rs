//! Per-column min-max scaling to [0, 1].

/// Observed range of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

/// Scaler fitted on a set of continuous columns.
///
/// Missing values are ignored when fitting and stay missing when
/// transforming. A constant column maps to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    ranges: Vec<Option<ColumnRange>>,
}

impl MinMaxScaler {
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        let ranges = columns
            .iter()
            .map(|col| {
                col.iter().flatten().fold(None, |acc: Option<ColumnRange>, &v| {
                    Some(match acc {
                        None => ColumnRange { min: v, max: v },
                        Some(r) => ColumnRange {
                            min: r.min.min(v),
                            max: r.max.max(v),
                        },
                    })
                })
            })
            .collect();
        Self { ranges }
    }

    pub fn ranges(&self) -> &[Option<ColumnRange>] {
        &self.ranges
    }

    /// Scales each column with its own fitted range.
    pub fn transform(&self, columns: &[Vec<Option<f64>>]) -> Vec<Vec<Option<f64>>> {
        columns
            .iter()
            .zip(&self.ranges)
            .map(|(col, range)| {
                col.iter()
                    .map(|v| {
                        let r = (*range)?;
                        let span = r.max - r.min;
                        let span = if span == 0.0 { 1.0 } else { span };
                        v.map(|v| (v - r.min) / span)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn fit_transform(columns: &[Vec<Option<f64>>]) -> (Self, Vec<Vec<Option<f64>>>) {
        let scaler = Self::fit(columns);
        let scaled = scaler.transform(columns);
        (scaler, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_to_ten_scales_to_unit_range() {
        let (_, scaled) = MinMaxScaler::fit_transform(&[vec![Some(0.0), Some(10.0)]]);
        assert_eq!(scaled, vec![vec![Some(0.0), Some(1.0)]]);
    }

    #[test]
    fn test_columns_scale_independently() {
        let columns = vec![
            vec![Some(270.0), Some(280.0), Some(290.0)],
            vec![Some(-5.0), Some(5.0), Some(0.0)],
        ];

        let (scaler, scaled) = MinMaxScaler::fit_transform(&columns);

        assert_eq!(scaler.ranges()[0], Some(ColumnRange { min: 270.0, max: 290.0 }));
        assert_eq!(scaled[0], vec![Some(0.0), Some(0.5), Some(1.0)]);
        assert_eq!(scaled[1], vec![Some(0.0), Some(1.0), Some(0.5)]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let (_, scaled) = MinMaxScaler::fit_transform(&[vec![Some(3.0), Some(3.0)]]);
        assert_eq!(scaled, vec![vec![Some(0.0), Some(0.0)]]);
    }

    #[test]
    fn test_missing_values_pass_through() {
        let (_, scaled) = MinMaxScaler::fit_transform(&[vec![Some(1.0), None, Some(3.0)]]);
        assert_eq!(scaled, vec![vec![Some(0.0), None, Some(1.0)]]);

        let (_, all_missing) = MinMaxScaler::fit_transform(&[vec![None, None]]);
        assert_eq!(all_missing, vec![vec![None, None]]);
    }
}
