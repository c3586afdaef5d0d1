//! Record extraction: resolved variables into a table or a plain mapping
//!
//! The result shape depends only on [`has_time_axis`]: when the file defines a
//! `time` variable and every resolved variable is defined over the `time`
//! dimension the variables become columns of a [`TimeTable`]; otherwise they
//! are returned as a name → array mapping.

use crate::errors::Result;
use crate::netcdf_io::{NetCDFFile, RawVariable, TIME};
use crate::resolver::{resolve, Diagnostic, Resolution, VarRequest};
use crate::table::{parse_interval, Reducer, TimeTable};
use chrono::NaiveDateTime;
use ndarray::ArrayD;

/// One extraction result
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Rows keyed by decoded timestamps
    Table(TimeTable),
    /// Variables that do not all share the time dimension, in resolved order
    Arrays(Vec<(String, ArrayD<f64>)>),
}

impl Extraction {
    #[must_use]
    pub const fn as_table(&self) -> Option<&TimeTable> {
        match self {
            Self::Table(table) => Some(table),
            Self::Arrays(_) => None,
        }
    }

    /// The array stored for `name`, whichever the shape
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArrayD<f64>> {
        match self {
            Self::Table(table) => table.column(name),
            Self::Arrays(arrays) => arrays.iter().find(|(n, _)| n == name).map(|(_, a)| a),
        }
    }
}

/// Result of [`extract`] plus the diagnostics collected while resolving
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// `None` when nothing matched and emptiness was tolerated
    pub result: Option<Extraction>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Options for [`extract`]
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Resample interval such as `"1 hour"`; ignored for the mapping shape
    pub resample: Option<String>,
    /// Reducer applied when resampling
    pub reducer: Reducer,
    /// Return an empty result instead of failing when nothing matches
    pub tolerate_empty: bool,
}

impl ExtractOptions {
    #[must_use]
    pub fn with_resample(mut self, interval: impl Into<String>) -> Self {
        self.resample = Some(interval.into());
        self
    }

    #[must_use]
    pub const fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    #[must_use]
    pub const fn tolerate_empty(mut self, tolerate: bool) -> Self {
        self.tolerate_empty = tolerate;
        self
    }
}

/// Whether the table shape applies: `time` exists as a variable and every
/// variable's dimensions include `time`
#[must_use]
pub fn has_time_axis<S: AsRef<str>>(time_defined: bool, dimensions: &[Vec<S>]) -> bool {
    time_defined
        && dimensions
            .iter()
            .all(|dims| dims.iter().any(|d| d.as_ref() == TIME))
}

/// Extracts the variables selected by `request` from `handle`.
///
/// # Errors
///
/// Fails with the errors of [`resolve`], with
/// [`crate::ToolboxError::InvalidArgument`] for a malformed resample interval,
/// and with I/O, NetCDF or time decoding errors while reading.
pub fn extract(
    handle: &NetCDFFile,
    request: &VarRequest,
    options: &ExtractOptions,
) -> Result<Extracted> {
    request.validate()?;
    let interval = options.resample.as_deref().map(parse_interval).transpose()?;

    let keys = handle.keys()?;
    let (names, diagnostics) = match resolve(request, &keys, options.tolerate_empty)? {
        Resolution::Matched { names, diagnostics } => (names, diagnostics),
        Resolution::Empty { diagnostics } => {
            tracing::debug!(path = %handle.path().display(), "no variables matched");
            return Ok(Extracted {
                result: None,
                diagnostics,
            });
        }
    };

    let time_defined = keys.iter().any(|k| k == TIME);
    let variables = handle.read_variables(&names)?;
    let dims: Vec<Vec<String>> = variables
        .iter()
        .map(|v| v.descriptor.dimensions.clone())
        .collect();

    let result = if has_time_axis(time_defined, &dims) {
        let index = handle.read_time()?;
        let mut table = build_table(index, variables)?;
        if let Some(interval) = interval {
            table = table.resample(interval, options.reducer)?;
        }
        Extraction::Table(table)
    } else {
        Extraction::Arrays(
            variables
                .into_iter()
                .map(|v| (v.descriptor.name, v.data))
                .collect(),
        )
    };

    tracing::debug!(
        path = %handle.path().display(),
        variables = names.len(),
        table = matches!(result, Extraction::Table(_)),
        "extracted"
    );

    Ok(Extracted {
        result: Some(result),
        diagnostics,
    })
}

/// Moves each variable's time axis to the front and adds it as a column
fn build_table(index: Vec<NaiveDateTime>, variables: Vec<RawVariable>) -> Result<TimeTable> {
    let mut table = TimeTable::new(index);
    for RawVariable { descriptor, data } in variables {
        let axis = descriptor
            .dimensions
            .iter()
            .position(|d| d == TIME)
            .unwrap_or(0);
        let data = if axis == 0 {
            data
        } else {
            let mut order: Vec<usize> = (0..data.ndim()).collect();
            order.remove(axis);
            order.insert(0, axis);
            data.permuted_axes(order).as_standard_layout().into_owned()
        };
        table.push_column(descriptor.name, data)?;
    }
    Ok(table)
}
