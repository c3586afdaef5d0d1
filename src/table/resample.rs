//! Resampling of time tables onto a regular, coarser grid
//!
//! Buckets are left-closed and labelled by their start. The grid is anchored at
//! midnight of the earliest timestamp, and every bucket between the earliest and
//! the latest row is emitted, including empty ones.

use super::TimeTable;
use crate::errors::{Result, ToolboxError};
use crate::time::start_of_day;
use chrono::{Duration, NaiveDateTime};
use ndarray::{ArrayD, Axis, IxDyn};
use std::str::FromStr;

/// How the rows falling into one bucket are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reducer {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// First valid value
    First,
    /// Last valid value
    Last,
}

impl Reducer {
    /// Get the string representation of the reducer
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
        }
    }

    /// Reduces `rows` along axis 0, skipping NaN and infinite values.
    ///
    /// Elements with no valid value become NaN, except for `Sum` where they are 0.
    #[must_use]
    pub fn reduce_rows(self, rows: &ArrayD<f64>) -> ArrayD<f64> {
        let axis = Axis(0);
        match self {
            Self::Sum => sum_valid(rows),
            Self::Mean => {
                let counts =
                    rows.fold_axis(axis, 0.0_f64, |&n, &x| if x.is_finite() { n + 1.0 } else { n });
                // 0/0 is NaN, which is what an empty bucket should read as
                sum_valid(rows) / counts
            }
            Self::Min => rows
                .fold_axis(axis, f64::INFINITY, |&acc, &x| {
                    if x.is_finite() {
                        acc.min(x)
                    } else {
                        acc
                    }
                })
                .mapv(|x| if x == f64::INFINITY { f64::NAN } else { x }),
            Self::Max => rows
                .fold_axis(axis, f64::NEG_INFINITY, |&acc, &x| {
                    if x.is_finite() {
                        acc.max(x)
                    } else {
                        acc
                    }
                })
                .mapv(|x| if x == f64::NEG_INFINITY { f64::NAN } else { x }),
            Self::First => rows.fold_axis(axis, f64::NAN, |&acc, &x| {
                if acc.is_nan() && x.is_finite() {
                    x
                } else {
                    acc
                }
            }),
            Self::Last => {
                rows.fold_axis(axis, f64::NAN, |&acc, &x| if x.is_finite() { x } else { acc })
            }
        }
    }
}

fn sum_valid(rows: &ArrayD<f64>) -> ArrayD<f64> {
    rows.fold_axis(Axis(0), 0.0_f64, |&acc, &x| if x.is_finite() { acc + x } else { acc })
}

impl FromStr for Reducer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(format!(
                "Unknown reducer '{other}': expected one of mean, sum, min, max, first, last"
            )),
        }
    }
}

/// Parses a resample interval such as `"1 hour"`, `"6 hours"` or `"30min"`.
///
/// # Errors
///
/// Returns [`ToolboxError::InvalidArgument`] if the string is not a duration or
/// the duration is zero.
pub fn parse_interval(text: &str) -> Result<Duration> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ToolboxError::invalid_argument(text, "resample interval is empty"));
    }

    let parsed = parse_duration::parse(&trimmed.to_ascii_lowercase())
        .map_err(|e| ToolboxError::invalid_argument(text, format!("not a valid duration: {e}")))?;
    if parsed.is_zero() {
        return Err(ToolboxError::invalid_argument(text, "resample interval must be positive"));
    }

    Duration::from_std(parsed)
        .map_err(|_| ToolboxError::invalid_argument(text, "resample interval is too large"))
}

impl TimeTable {
    /// Re-buckets the table onto a regular grid of width `interval`.
    ///
    /// Rows do not need to be sorted; each row is assigned to the bucket that
    /// contains its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::InvalidArgument`] for a non-positive interval or a
    /// time span that cannot be expressed in microseconds.
    pub fn resample(&self, interval: Duration, reducer: Reducer) -> Result<Self> {
        let step = interval
            .num_microseconds()
            .filter(|&us| us > 0)
            .ok_or_else(|| {
                ToolboxError::invalid_argument(
                    interval.to_string(),
                    "resample interval must be positive",
                )
            })?;

        let (Some(&earliest), Some(&latest)) =
            (self.index().iter().min(), self.index().iter().max())
        else {
            return Ok(self.clone());
        };

        let origin = start_of_day(earliest);
        let bucket_of = |t: NaiveDateTime| -> Result<i64> {
            (t - origin)
                .num_microseconds()
                .map(|us| us.div_euclid(step))
                .ok_or_else(|| {
                    ToolboxError::invalid_argument(
                        interval.to_string(),
                        "time span too large to resample",
                    )
                })
        };

        let first = bucket_of(earliest)?;
        let last = bucket_of(latest)?;
        let bucket_range_error =
            || ToolboxError::invalid_argument(interval.to_string(), "invalid bucket range");
        let n_buckets = usize::try_from(last - first + 1).map_err(|_| bucket_range_error())?;

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_buckets];
        for (row, &t) in self.index().iter().enumerate() {
            let slot = usize::try_from(bucket_of(t)? - first).map_err(|_| bucket_range_error())?;
            members[slot].push(row);
        }

        let index: Vec<NaiveDateTime> = (first..=last)
            .map(|k| origin + Duration::microseconds(k * step))
            .collect();

        tracing::debug!(
            rows = self.n_rows(),
            buckets = n_buckets,
            reducer = reducer.as_str(),
            "resampling table"
        );

        let mut resampled = Self::new(index);
        for column in self.columns() {
            let mut shape = vec![n_buckets];
            shape.extend_from_slice(column.row_shape());
            let mut out = ArrayD::from_elem(IxDyn(&shape), f64::NAN);

            for (bucket, rows) in members.iter().enumerate() {
                let selected = column.data.select(Axis(0), rows);
                let reduced = reducer.reduce_rows(&selected);
                out.index_axis_mut(Axis(0), bucket).assign(&reduced);
            }

            resampled.push_column(column.name.clone(), out)?;
        }

        Ok(resampled)
    }
}
