//! Temporal aggregation of state-vector series into coarser buckets.

use anyhow::{Result, anyhow, bail};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::series::{StateSeries, column_means};

/// Calendar unit of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Minute,
    Hour,
    Day,
    /// Weeks starting on Monday.
    Week,
    /// Calendar months starting on day 1.
    Month,
}

/// Bucket size selected for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPeriod {
    /// No grouping; the series is returned unchanged.
    All,
    /// Fixed 5-day buckets.
    Pentad,
    Every { count: u32, unit: PeriodUnit },
}

impl AggregationPeriod {
    pub const DAILY: AggregationPeriod = AggregationPeriod::Every {
        count: 1,
        unit: PeriodUnit::Day,
    };
}

impl FromStr for AggregationPeriod {
    type Err = anyhow::Error;

    /// Accepts `all`, `pentad` or `[n]<unit>` where unit is one of
    /// `min`/`T`, `H`/`h`, `D`/`d`, `W`/`w`, `M`/`MS`/`ME`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "all" => return Ok(Self::All),
            "pentad" => return Ok(Self::Pentad),
            _ => {}
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let count = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid period multiplier in '{}'", s))?
        };
        if count == 0 {
            bail!("period multiplier must be positive in '{}'", s);
        }

        let unit = match unit {
            "min" | "T" => PeriodUnit::Minute,
            "H" | "h" => PeriodUnit::Hour,
            "D" | "d" => PeriodUnit::Day,
            "W" | "w" => PeriodUnit::Week,
            "M" | "MS" | "ME" => PeriodUnit::Month,
            _ => bail!(
                "unknown aggregation period '{}' (expected all, pentad, or [n]min/H/D/W/M)",
                s
            ),
        };

        Ok(Self::Every { count, unit })
    }
}

impl fmt::Display for AggregationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Pentad => f.write_str("pentad"),
            Self::Every { count, unit } => {
                if *count != 1 {
                    write!(f, "{}", count)?;
                }
                f.write_str(match unit {
                    PeriodUnit::Minute => "min",
                    PeriodUnit::Hour => "H",
                    PeriodUnit::Day => "D",
                    PeriodUnit::Week => "W",
                    PeriodUnit::Month => "M",
                })
            }
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn week_start(ts: NaiveDateTime) -> NaiveDate {
    let date = ts.date();
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_index(ts: NaiveDateTime) -> i64 {
    i64::from(ts.year()) * 12 + i64::from(ts.month0())
}

fn month_start(index: i64) -> Option<NaiveDateTime> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1).map(midnight)
}

/// Maps each timestamp to the start of its bucket.
struct Bucketer {
    count: i64,
    unit: PeriodUnit,
    origin: NaiveDateTime,
}

impl Bucketer {
    fn new(count: u32, unit: PeriodUnit, first: NaiveDateTime) -> Self {
        let origin = match unit {
            PeriodUnit::Week => midnight(week_start(first)),
            PeriodUnit::Month => midnight(first.date().with_day(1).unwrap_or(first.date())),
            _ => midnight(first.date()),
        };
        Self {
            count: i64::from(count),
            unit,
            origin,
        }
    }

    fn fixed_width(&self) -> Option<Duration> {
        match self.unit {
            PeriodUnit::Minute => Some(Duration::minutes(self.count)),
            PeriodUnit::Hour => Some(Duration::hours(self.count)),
            PeriodUnit::Day => Some(Duration::days(self.count)),
            PeriodUnit::Week => Some(Duration::weeks(self.count)),
            PeriodUnit::Month => None,
        }
    }

    fn bucket_start(&self, ts: NaiveDateTime) -> Result<NaiveDateTime> {
        if let Some(width) = self.fixed_width() {
            let width_secs = width.num_seconds();
            let offset = (ts - self.origin).num_seconds();
            let k = offset.div_euclid(width_secs);
            return Ok(self.origin + Duration::seconds(k * width_secs));
        }

        let months = month_index(ts) - month_index(self.origin);
        let k = months.div_euclid(self.count);
        month_start(month_index(self.origin) + k * self.count)
            .ok_or_else(|| anyhow!("bucket for {} is out of range", ts))
    }
}

/// Averages `series` into buckets of `period`.
///
/// `All` returns the input unchanged. Otherwise each output row is the
/// column-wise mean of the rows falling into one bucket (missing values
/// skipped) and is indexed by the bucket start. Empty buckets are omitted
/// and the output index is ascending.
pub fn aggregate(series: &StateSeries, period: AggregationPeriod) -> Result<StateSeries> {
    let (count, unit) = match period {
        AggregationPeriod::All => return Ok(series.clone()),
        AggregationPeriod::Pentad => (5, PeriodUnit::Day),
        AggregationPeriod::Every { count, unit } => (count, unit),
    };

    let Some(first) = series.index.iter().min().copied() else {
        return Ok(series.clone());
    };
    let bucketer = Bucketer::new(count, unit, first);

    let mut buckets: BTreeMap<NaiveDateTime, Vec<&Vec<Option<f64>>>> = BTreeMap::new();
    for (ts, row) in series.index.iter().zip(&series.rows) {
        buckets
            .entry(bucketer.bucket_start(*ts)?)
            .or_default()
            .push(row);
    }

    let width = series.columns.len();
    let (index, rows) = buckets
        .into_iter()
        .map(|(start, rows)| (start, column_means(&rows, width)))
        .unzip();

    StateSeries::new(index, series.columns.clone(), rows)
}
