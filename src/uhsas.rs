//! UHSAS (Ultra-High Sensitivity Aerosol Spectrometer) size distributions

use crate::errors::{Result, ToolboxError};
use crate::netcdf_io::NetCDFFile;
use chrono::{NaiveDateTime, Timelike};
use ndarray::{Array1, Array2, Axis, Ix1, Ix2};
use std::path::Path;

/// Default sample rate used when converting counts to concentrations
pub const DEFAULT_SAMPLE_RATE: f64 = 10.0;

/// One UHSAS file loaded into memory
#[derive(Debug, Clone)]
pub struct Uhsas {
    pub datetimes: Vec<NaiveDateTime>,
    /// Counts per record and size bin, `(time, bin)`
    pub size_distribution: Array2<f64>,
    pub sampling_volume: Array1<f64>,
    pub lower_size_limit: Array1<f64>,
    pub upper_size_limit: Array1<f64>,
}

impl Uhsas {
    /// Reads the size distribution and its sampling metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or has the wrong rank,
    /// or if the record count of the variables disagrees.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let handle = NetCDFFile::open(path)?;

        let datetimes = handle.read_time()?;
        let size_distribution = handle
            .read_array("size_distribution")?
            .into_dimensionality::<Ix2>()?;
        let sampling_volume = handle
            .read_array("sampling_volume")?
            .into_dimensionality::<Ix1>()?;
        let lower_size_limit = handle
            .read_array("lower_size_limit")?
            .into_dimensionality::<Ix1>()?;
        let upper_size_limit = handle
            .read_array("upper_size_limit")?
            .into_dimensionality::<Ix1>()?;

        let records = datetimes.len();
        if size_distribution.nrows() != records || sampling_volume.len() != records {
            return Err(ToolboxError::ShapeMismatch(format!(
                "{records} time records, {} distribution rows, {} sampling volumes",
                size_distribution.nrows(),
                sampling_volume.len()
            )));
        }
        if lower_size_limit.len() != size_distribution.ncols() {
            return Err(ToolboxError::ShapeMismatch(format!(
                "{} size bins but {} lower size limits",
                size_distribution.ncols(),
                lower_size_limit.len()
            )));
        }

        Ok(Self {
            datetimes,
            size_distribution,
            sampling_volume,
            lower_size_limit,
            upper_size_limit,
        })
    }

    /// Hour of day of each record
    #[must_use]
    pub fn hours(&self) -> Vec<u32> {
        self.datetimes.iter().map(Timelike::hour).collect()
    }

    /// Concentration over all bins, at [`DEFAULT_SAMPLE_RATE`]
    #[must_use]
    pub fn total_concentration(&self) -> Array1<f64> {
        self.concentration(f64::NEG_INFINITY, DEFAULT_SAMPLE_RATE)
    }

    /// Concentration of particles in bins whose lower limit is at least `lower_limit`.
    ///
    /// Counts are divided by `(sampling_volume / 60) * sample_rate`.
    #[must_use]
    pub fn concentration(&self, lower_limit: f64, sample_rate: f64) -> Array1<f64> {
        let bins: Vec<usize> = self
            .lower_size_limit
            .iter()
            .enumerate()
            .filter(|(_, limit)| **limit >= lower_limit)
            .map(|(i, _)| i)
            .collect();

        let counts = self
            .size_distribution
            .select(Axis(1), &bins)
            .sum_axis(Axis(1));
        counts / self.sampling_volume.mapv(|v| (v / 60.0) * sample_rate)
    }
}
