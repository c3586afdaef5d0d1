//! Time-indexed tables
//!
//! A [`TimeTable`] has one row per timestamp and one column per variable. A
//! column holds the variable's full array with axis 0 running over the rows, so
//! a profile variable `(time, height)` becomes a column whose rows are profiles.
//! Missing values are `NaN`.
//!
//! # Organization
//!
//! - [`concat`]: row-wise concatenation with column union
//! - [`resample`]: re-bucketing onto a coarser time grid

pub mod concat;
pub mod resample;

pub use concat::concat;
pub use resample::{parse_interval, Reducer};

use crate::errors::{Result, ToolboxError};
use chrono::NaiveDateTime;
use ndarray::{ArrayD, Axis};

/// One named column of a [`TimeTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ArrayD<f64>,
}

impl Column {
    /// Shape of one row of this column (the array shape without axis 0)
    #[must_use]
    pub fn row_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }
}

/// A table whose rows are keyed by decoded timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl TimeTable {
    /// Creates a table with the given index and no columns
    #[must_use]
    pub const fn new(index: Vec<NaiveDateTime>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Adds a column, consuming and returning the table.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::ShapeMismatch`] if `data` is zero-dimensional or its
    /// first axis does not match the number of rows, and
    /// [`ToolboxError::InvalidArgument`] if the column already exists.
    pub fn with_column(mut self, name: impl Into<String>, data: ArrayD<f64>) -> Result<Self> {
        self.push_column(name, data)?;
        Ok(self)
    }

    /// Adds a column in place; see [`TimeTable::with_column`]
    ///
    /// # Errors
    ///
    /// Same as [`TimeTable::with_column`].
    pub fn push_column(&mut self, name: impl Into<String>, data: ArrayD<f64>) -> Result<()> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(ToolboxError::invalid_argument(
                name,
                "column already exists in table",
            ));
        }
        if data.ndim() == 0 || data.len_of(Axis(0)) != self.index.len() {
            return Err(ToolboxError::ShapeMismatch(format!(
                "column '{name}' has shape {:?} but the table has {} rows",
                data.shape(),
                self.index.len()
            )));
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    #[must_use]
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// The data of column `name`, if present
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Prints the first `n` rows, scalar cells as numbers and array cells by shape
    pub fn print_head(&self, n: usize) {
        println!(
            "\n TimeTable: {} rows x {} columns",
            self.n_rows(),
            self.columns.len()
        );
        let mut header = format!("{:<20}", "time");
        for column in &self.columns {
            header.push_str(&format!(" {:>14}", column.name));
        }
        println!("{header}");

        for (row, ts) in self.index.iter().enumerate().take(n) {
            let mut line = format!("{:<20}", ts.format("%Y-%m-%d %H:%M:%S"));
            for column in &self.columns {
                let cell = column.data.index_axis(Axis(0), row);
                let text = if cell.ndim() == 0 {
                    cell.first()
                        .map_or_else(|| "NaN".to_string(), |v| format!("{v:.4}"))
                } else {
                    format!("{:?}", cell.shape())
                };
                line.push_str(&format!(" {text:>14}"));
            }
            println!("{line}");
        }
        if self.n_rows() > n {
            println!("... ({} more rows)", self.n_rows() - n);
        }
    }
}
