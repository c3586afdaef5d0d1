//! NetCDF I/O: the scoped file handle and the keyed table store
//!
//! [`NetCDFFile`] never keeps the underlying file open. Each query opens the
//! file, reads what it needs and closes it again before returning, so an
//! interrupted read cannot leave a dangling handle.
//!
//! Aggregated tables are persisted with [`TableWriter`] as a named group inside
//! a netCDF file and read back with [`read_table`].

use crate::errors::{Result, ToolboxError};
use crate::metadata::{numeric_attribute, text_attribute, MetaValue, VariableDescriptor};
use crate::table::TimeTable;
use crate::time::{decode_times, encode_seconds_since_epoch, EPOCH_UNITS};
use chrono::{NaiveDateTime, Utc};
use ndarray::{Array1, ArrayD};
use netcdf::{AttributeValue, File, Variable};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Name of the distinguished time coordinate and dimension
pub const TIME: &str = "time";

/// Default key under which tables are stored
pub const DEFAULT_TABLE_KEY: &str = "data";

/// Name of the row dimension and index variable inside a stored table
const INDEX: &str = "index";

/// A variable read in full, together with its descriptor
#[derive(Debug, Clone)]
pub struct RawVariable {
    pub descriptor: VariableDescriptor,
    pub data: ArrayD<f64>,
}

/// Read-only handle on one netCDF file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetCDFFile {
    abspath: PathBuf,
}

impl NetCDFFile {
    /// Validates `path` and creates a handle for it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::InvalidArgument`] for an empty path and
    /// [`ToolboxError::NotFound`] if `path` is not a regular file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ToolboxError::invalid_argument("path", "path must not be empty"));
        }
        if !path.is_file() {
            return Err(ToolboxError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            abspath: fs::canonicalize(path)?,
        })
    }

    /// Absolute path of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.abspath
    }

    fn with_file<T>(&self, f: impl FnOnce(&File) -> Result<T>) -> Result<T> {
        let file = netcdf::open(&self.abspath)?;
        f(&file)
    }

    /// All variable names, sorted alphabetically
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.with_file(|file| {
            let mut keys: Vec<String> = file.variables().map(|v| v.name()).collect();
            keys.sort();
            Ok(keys)
        })
    }

    /// Whether the file defines a variable called `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn has_variable(&self, name: &str) -> Result<bool> {
        self.with_file(|file| Ok(file.variable(name).is_some()))
    }

    /// Descriptor of variable `name`
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::VariableNotFound`] if the variable does not exist.
    pub fn describe(&self, name: &str) -> Result<VariableDescriptor> {
        self.with_file(|file| {
            let var = find_variable(file, name)?;
            Ok(VariableDescriptor::from_variable(&var))
        })
    }

    /// Descriptors of every variable, in key order
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn descriptors(&self) -> Result<Vec<VariableDescriptor>> {
        self.with_file(|file| {
            let mut descriptors: Vec<VariableDescriptor> = file
                .variables()
                .map(|v| VariableDescriptor::from_variable(&v))
                .collect();
            descriptors.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(descriptors)
        })
    }

    /// Full, unpacked contents of variable `name`
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::VariableNotFound`] if the variable does not exist,
    /// or a NetCDF error if it cannot be read as numbers.
    pub fn read_array(&self, name: &str) -> Result<ArrayD<f64>> {
        self.with_file(|file| read_unpacked(&find_variable(file, name)?))
    }

    /// Reads several variables under a single open
    ///
    /// # Errors
    ///
    /// Fails on the first variable that is missing or unreadable.
    pub fn read_variables(&self, names: &[String]) -> Result<Vec<RawVariable>> {
        self.with_file(|file| {
            names
                .iter()
                .map(|name| {
                    let var = find_variable(file, name)?;
                    Ok(RawVariable {
                        descriptor: VariableDescriptor::from_variable(&var),
                        data: read_unpacked(&var)?,
                    })
                })
                .collect()
        })
    }

    /// Decodes the `time` coordinate into timestamps
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::VariableNotFound`] if there is no `time` variable and
    /// [`ToolboxError::TimeDecode`] if it has no usable `units` attribute.
    pub fn read_time(&self) -> Result<Vec<NaiveDateTime>> {
        self.with_file(read_time_coordinate)
    }
}

pub(crate) fn find_variable<'f>(file: &'f File, name: &str) -> Result<Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| ToolboxError::variable_not_found(name))
}

/// Decodes the `time` variable of an already open file
pub(crate) fn read_time_coordinate(file: &File) -> Result<Vec<NaiveDateTime>> {
    let var = find_variable(file, TIME)?;
    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    let units = match text_attribute(&var, "units") {
        MetaValue::Known(units) => units,
        MetaValue::Unknown => {
            return Err(ToolboxError::time_decode("None", "time variable has no units attribute"))
        }
    };
    let calendar = text_attribute(&var, "calendar");
    decode_times(&values, &units, calendar.as_deref())
}

/// Reads a variable as f64, masking `_FillValue`/`missing_value` to NaN and
/// applying `scale_factor`/`add_offset`
pub(crate) fn read_unpacked(var: &Variable) -> Result<ArrayD<f64>> {
    let mut data = var.get::<f64, _>(..)?;

    let fill = numeric_attribute(var, "_FillValue");
    let missing = numeric_attribute(var, "missing_value");
    let scale = numeric_attribute(var, "scale_factor").unwrap_or(1.0);
    let offset = numeric_attribute(var, "add_offset").unwrap_or(0.0);

    data.mapv_inplace(|x| {
        if Some(x) == fill || Some(x) == missing {
            f64::NAN
        } else {
            x * scale + offset
        }
    });
    Ok(data)
}

/// Writer for the keyed table store
pub struct TableWriter<'a> {
    output_path: &'a Path,
    key: &'a str,
}

impl<'a> TableWriter<'a> {
    /// Create a new table writer
    pub const fn new(output_path: &'a Path, key: &'a str) -> Self {
        Self { output_path, key }
    }

    /// Writes `table` as group `key` of a new netCDF file, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::Persistence`] if the target directory does not
    /// exist, the table has no rows, or a column is named like the index; NetCDF
    /// errors are passed through.
    pub fn write(&self, table: &TimeTable) -> Result<()> {
        let parent = match self.output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(ToolboxError::persistence(
                self.output_path,
                format!("directory {} does not exist", parent.display()),
            ));
        }
        if table.is_empty() {
            return Err(ToolboxError::persistence(self.output_path, "table has no rows"));
        }
        if table.column(INDEX).is_some() {
            return Err(ToolboxError::persistence(
                self.output_path,
                format!("column name '{INDEX}' is reserved for the row index"),
            ));
        }

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = netcdf::create(self.output_path)?;
        file.add_attribute(
            "history",
            format!("Created by nctoolbox on {}", Utc::now().to_rfc3339()),
        )?;

        let mut group = file.add_group(self.key)?;
        group.add_dimension(INDEX, table.n_rows())?;
        group.add_attribute("columns", table.column_names())?;

        {
            let seconds = Array1::from(encode_seconds_since_epoch(table.index()));
            let mut index_var = group.add_variable::<f64>(INDEX, &[INDEX])?;
            index_var.put_attribute("units", EPOCH_UNITS)?;
            index_var.put(seconds.view(), ..)?;
        }

        for column in table.columns() {
            let mut dim_names = vec![INDEX.to_string()];
            for (axis, &len) in column.row_shape().iter().enumerate() {
                let dim_name = format!("{}_dim{}", column.name, axis + 1);
                group.add_dimension(&dim_name, len)?;
                dim_names.push(dim_name);
            }

            let dim_refs: Vec<&str> = dim_names.iter().map(String::as_str).collect();
            let mut var = group.add_variable::<f64>(&column.name, &dim_refs)?;
            var.put(column.data.view(), ..)?;
        }

        tracing::info!(
            path = %self.output_path.display(),
            key = self.key,
            rows = table.n_rows(),
            columns = table.columns().len(),
            "table saved"
        );

        Ok(())
    }
}

/// Reads the table stored under `key` in `path`.
///
/// # Errors
///
/// Returns [`ToolboxError::NotFound`] if the file is missing and
/// [`ToolboxError::Persistence`] if it holds no table under `key`.
pub fn read_table(path: impl AsRef<Path>, key: &str) -> Result<TimeTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ToolboxError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = netcdf::open(path)?;
    let group = file
        .group(key)?
        .ok_or_else(|| {
            ToolboxError::persistence(path, format!("no table stored under key '{key}'"))
        })?;

    let index_var = group
        .variable(INDEX)
        .ok_or_else(|| ToolboxError::persistence(path, format!("table '{key}' has no index")))?;
    let seconds: Vec<f64> = index_var.get_values::<f64, _>(..)?;
    let units = text_attribute(&index_var, "units");
    let index = decode_times(&seconds, units.as_deref().unwrap_or(EPOCH_UNITS), None)?;

    let order: Vec<String> = match group.attribute("columns").map(|a| a.value()) {
        Some(Ok(AttributeValue::Strs(names))) => names,
        Some(Ok(AttributeValue::Str(name))) => vec![name],
        _ => group
            .variables()
            .map(|v| v.name())
            .filter(|name| name != INDEX)
            .collect(),
    };

    let mut table = TimeTable::new(index);
    for name in order {
        let var = group
            .variable(&name)
            .ok_or_else(|| {
                ToolboxError::persistence(
                    path,
                    format!("column '{name}' is listed but not stored"),
                )
            })?;
        let data = read_unpacked(&var)?;
        table.push_column(name, data)?;
    }

    Ok(table)
}
