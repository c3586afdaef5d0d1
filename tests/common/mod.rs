//! Shared NetCDF fixtures for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const ARM_UNITS: &str = "seconds since 2014-03-15 00:00:00 0:00";

/// One variable of a fixture file
pub struct VarSpec {
    name: String,
    dims: Vec<String>,
    data: Vec<f64>,
    attrs: Vec<(String, String)>,
    fill_value: Option<f64>,
}

/// Builds small NetCDF files for tests
#[derive(Default)]
pub struct NcBuilder {
    dims: Vec<(String, usize)>,
    vars: Vec<VarSpec>,
}

impl NcBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `time` dimension and coordinate with the given units
    pub fn time(self, units: &str, values: &[f64]) -> Self {
        self.dimension("time", values.len())
            .variable("time", &["time"], values)
            .attr("units", units)
            .attr("long_name", "Time offset from midnight")
    }

    pub fn dimension(mut self, name: &str, len: usize) -> Self {
        self.dims.push((name.to_string(), len));
        self
    }

    pub fn variable(mut self, name: &str, dims: &[&str], data: &[f64]) -> Self {
        self.vars.push(VarSpec {
            name: name.to_string(),
            dims: dims.iter().map(|d| (*d).to_string()).collect(),
            data: data.to_vec(),
            attrs: Vec::new(),
            fill_value: None,
        });
        self
    }

    /// Sets a text attribute on the most recently added variable
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        if let Some(var) = self.vars.last_mut() {
            var.attrs.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Sets `_FillValue` on the most recently added variable
    pub fn fill_value(mut self, value: f64) -> Self {
        if let Some(var) = self.vars.last_mut() {
            var.fill_value = Some(value);
        }
        self
    }

    pub fn write(self, path: &Path) -> PathBuf {
        let mut file = netcdf::create(path).expect("Failed to create NetCDF file");
        for (name, len) in &self.dims {
            file.add_dimension(name, *len)
                .expect("Failed to add dimension");
        }
        for spec in &self.vars {
            let dims: Vec<&str> = spec.dims.iter().map(String::as_str).collect();
            let mut var = file
                .add_variable::<f64>(&spec.name, &dims)
                .expect("Failed to add variable");
            if let Some(fill) = spec.fill_value {
                var.set_fill_value(fill).expect("Failed to set fill value");
            }
            for (key, value) in &spec.attrs {
                var.put_attribute(key, value.as_str())
                    .expect("Failed to add attribute");
            }
            if dims.is_empty() {
                var.put_value(spec.data[0], ..)
                    .expect("Failed to write scalar");
            } else {
                var.put_values(&spec.data, ..)
                    .expect("Failed to write data");
            }
        }
        path.to_path_buf()
    }
}

/// A surface met file: `time`, `temp`, `lat`, `lon`, plus `rh` when `with_rh`
pub fn met_file(
    path: &Path,
    start_seconds: f64,
    rows: usize,
    base_temp: f64,
    with_rh: bool,
) -> PathBuf {
    let times: Vec<f64> = (0..rows).map(|i| start_seconds + 60.0 * i as f64).collect();
    let temp: Vec<f64> = (0..rows).map(|i| base_temp + i as f64).collect();

    let mut builder = NcBuilder::new()
        .time(ARM_UNITS, &times)
        .variable("temp", &["time"], &temp)
        .attr("long_name", "Temperature mean")
        .attr("units", "degC")
        .variable("lat", &[], &[36.605])
        .attr("long_name", "North latitude")
        .attr("units", "degree_N")
        .variable("lon", &[], &[-97.485])
        .attr("long_name", "East longitude")
        .attr("units", "degree_E");

    if with_rh {
        let rh: Vec<f64> = (0..rows).map(|i| 50.0 + i as f64).collect();
        builder = builder
            .variable("rh", &["time"], &rh)
            .attr("long_name", "Relative humidity mean")
            .attr("units", "%");
    }

    builder.write(path)
}
