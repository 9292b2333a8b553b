use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::series::{StateSeries, column_means};

/// Mean state vector of one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// Groups rows by calendar date and averages each column.
///
/// Frames come out in chronological order. A column with no values on a
/// date is drawn as 0.
pub fn daily_frames(series: &StateSeries) -> Vec<Frame> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Vec<Option<f64>>>> = BTreeMap::new();
    for (ts, row) in series.index.iter().zip(&series.rows) {
        by_date.entry(ts.date()).or_default().push(row);
    }

    let width = series.columns.len();
    by_date
        .into_iter()
        .map(|(date, rows)| Frame {
            date,
            values: column_means(&rows, width)
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_frames_are_chronological_daily_means() {
        let series = StateSeries::new(
            vec![at(3, 0), at(1, 6), at(1, 18), at(2, 0)],
            vec!["a".into(), "b".into()],
            vec![
                vec![Some(0.9), Some(0.1)],
                vec![Some(0.2), Some(0.8)],
                vec![Some(0.4), None],
                vec![None, None],
            ],
        )
        .unwrap();

        let frames = daily_frames(&series);

        let dates: Vec<u32> = frames.iter().map(|f| chrono::Datelike::day(&f.date)).collect();
        assert_eq!(dates, vec![1, 2, 3]);
        assert!((frames[0].values[0] - 0.3).abs() < 1e-12);
        assert_eq!(frames[0].values[1], 0.8);
        assert_eq!(frames[1].values, vec![0.0, 0.0]);
        assert_eq!(frames[2].values, vec![0.9, 0.1]);
    }

    #[test]
    fn test_empty_series_has_no_frames() {
        let series = StateSeries::new(vec![], vec!["a".into()], vec![]).unwrap();
        assert!(daily_frames(&series).is_empty());
    }
}
