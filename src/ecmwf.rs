//! Point sampling of gridded ECMWF fields
//!
//! Fields are expected on a regular `(time, latitude, longitude)` grid. Each
//! requested time is matched exactly against the file's time coordinate and
//! each location is matched to the nearest grid cell.

use crate::errors::{Result, ToolboxError};
use crate::netcdf_io::{NetCDFFile, TIME};
use chrono::NaiveDateTime;
use ndarray::ArrayD;
use std::path::Path;

const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";

/// Where to sample the field
#[derive(Debug, Clone, PartialEq)]
pub enum PointLocation {
    /// One location for every requested time
    Fixed { lat: f64, lon: f64 },
    /// One `(lat, lon)` per requested time, e.g. a ship track
    Track(Vec<(f64, f64)>),
}

impl PointLocation {
    fn at(&self, i: usize) -> Option<(f64, f64)> {
        match self {
            Self::Fixed { lat, lon } => Some((*lat, *lon)),
            Self::Track(points) => points.get(i).copied(),
        }
    }
}

/// Samples `variable` at `times` and `location`.
///
/// Times that the file does not contain yield NaN.
///
/// # Errors
///
/// Returns [`ToolboxError::InvalidArgument`] if the variable is not defined on
/// `(time, latitude, longitude)`, [`ToolboxError::ShapeMismatch`] if a track
/// does not have one point per time, and read errors from the file.
pub fn pick_point(
    path: impl AsRef<Path>,
    variable: &str,
    times: &[NaiveDateTime],
    location: &PointLocation,
) -> Result<Vec<f64>> {
    if let PointLocation::Track(points) = location {
        if points.len() != times.len() {
            return Err(ToolboxError::ShapeMismatch(format!(
                "{} track points for {} times",
                points.len(),
                times.len()
            )));
        }
    }

    let handle = NetCDFFile::open(path)?;
    let descriptor = handle.describe(variable)?;
    if descriptor.dimensions != [TIME, LATITUDE, LONGITUDE] {
        return Err(ToolboxError::invalid_argument(
            variable,
            format!(
                "expected dimensions (time, latitude, longitude), found ({})",
                descriptor.dimensions.join(", ")
            ),
        ));
    }

    let file_times = handle.read_time()?;
    let lats = handle.read_array(LATITUDE)?;
    let lons = handle.read_array(LONGITUDE)?;
    let field = handle.read_array(variable)?;

    let mut values = Vec::with_capacity(times.len());
    for (i, at) in times.iter().enumerate() {
        let Some(ti) = file_times.iter().position(|t| t == at) else {
            tracing::debug!(time = %at, "time not in file");
            values.push(f64::NAN);
            continue;
        };
        let (lat, lon) = location
            .at(i)
            .ok_or_else(|| ToolboxError::ShapeMismatch(format!("no track point for time #{i}")))?;
        values.push(sample(&field, ti, &lats, &lons, lat, lon));
    }

    Ok(values)
}

fn sample(
    field: &ArrayD<f64>,
    ti: usize,
    lats: &ArrayD<f64>,
    lons: &ArrayD<f64>,
    lat: f64,
    lon: f64,
) -> f64 {
    let lon = shift_longitude(lon, lons);
    match (nearest(lats, lat), nearest(lons, lon)) {
        (Some(yi), Some(xi)) => field.get([ti, yi, xi].as_slice()).copied().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Brings `lon` into the convention of the grid (0..360 or -180..180)
fn shift_longitude(lon: f64, grid: &ArrayD<f64>) -> f64 {
    let max = grid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 180.0 && lon < 0.0 {
        lon + 360.0
    } else if max <= 180.0 && lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Index of the grid value closest to `target`
fn nearest(grid: &ArrayD<f64>, target: f64) -> Option<usize> {
    grid.iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
}
