//! Variable descriptors and formatted variable listings
//!
//! A [`VariableDescriptor`] captures the display name, units and dimension names
//! of one variable. Attributes that the file does not define are reported as
//! [`MetaValue::Unknown`] rather than omitted.

use crate::errors::Result;
use crate::netcdf_io::NetCDFFile;
use netcdf::{AttributeValue, Variable};
use std::{fmt, fs, path::Path};

/// A metadata field that may be absent from the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// The attribute exists
    Known(String),
    /// The attribute is not defined for this variable
    Unknown,
}

impl MetaValue {
    /// The attribute text, if present
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => write!(f, "{value}"),
            Self::Unknown => write!(f, "None"),
        }
    }
}

/// Read-only description of one named variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub name: String,
    pub long_name: MetaValue,
    pub units: MetaValue,
    pub dimensions: Vec<String>,
}

impl VariableDescriptor {
    /// Builds the descriptor of an open variable
    pub fn from_variable(var: &Variable) -> Self {
        Self {
            name: var.name(),
            long_name: text_attribute(var, "long_name"),
            units: text_attribute(var, "units"),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
        }
    }

    /// Whether `dim` is one of this variable's dimensions
    #[must_use]
    pub fn has_dimension(&self, dim: &str) -> bool {
        self.dimensions.iter().any(|d| d == dim)
    }
}

/// Reads a textual attribute, rendering non-text values with their debug form
pub(crate) fn text_attribute(var: &Variable, name: &str) -> MetaValue {
    match var.attribute(name).map(|attr| attr.value()) {
        Some(Ok(AttributeValue::Str(s))) => MetaValue::Known(s),
        Some(Ok(AttributeValue::Strs(ss))) => MetaValue::Known(ss.join(", ")),
        Some(Ok(other)) => MetaValue::Known(format!("{other:?}")),
        Some(Err(_)) | None => MetaValue::Unknown,
    }
}

/// Reads a numeric attribute as f64; list-valued attributes yield their first element
pub(crate) fn numeric_attribute(var: &Variable, name: &str) -> Option<f64> {
    let value = var.attribute(name)?.value().ok()?;
    match value {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Uint(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Ushort(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        AttributeValue::Doubles(vs) => vs.first().copied(),
        AttributeValue::Floats(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Longlongs(vs) => vs.first().map(|&v| v as f64),
        AttributeValue::Ulonglongs(vs) => vs.first().map(|&v| v as f64),
        AttributeValue::Ints(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Uints(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Shorts(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Ushorts(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Schars(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Uchars(vs) => vs.first().map(|&v| f64::from(v)),
        AttributeValue::Str(_) | AttributeValue::Strs(_) => None,
    }
}

/// Renders descriptors as a left-aligned table with a header row
#[must_use]
pub fn format_variable_table(descriptors: &[VariableDescriptor]) -> String {
    const HEADERS: [&str; 4] = ["Variable", "Long Name", "Units", "Dimensions"];

    let rows: Vec<[String; 4]> = descriptors
        .iter()
        .map(|d| {
            [
                d.name.clone(),
                d.long_name.to_string(),
                d.units.to_string(),
                format!("({})", d.dimensions.join(", ")),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let format_row = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!(" {cell:<w$} "))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = vec![rule.clone()];
    out.push(format_row(&HEADERS.map(String::from)));
    out.push(rule.clone());
    out.extend(rows.iter().map(|row| format_row(row)));
    out.push(rule);
    out.join("\n")
}

/// Prints every variable of `file` with its long name, units and dimensions.
///
/// When `outfile` is given the table is written there instead of stdout.
/// The descriptors are returned for later reference.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the output cannot be written.
pub fn print_vars(file: &NetCDFFile, outfile: Option<&Path>) -> Result<Vec<VariableDescriptor>> {
    let descriptors = file.descriptors()?;
    let table = format_variable_table(&descriptors);

    match outfile {
        Some(path) => fs::write(path, format!("{table}\n"))?,
        None => {
            println!("\n {}", file.path().display());
            println!("{table}");
        }
    }

    Ok(descriptors)
}
