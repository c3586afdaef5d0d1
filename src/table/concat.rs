//! Row-wise concatenation of time tables

use super::TimeTable;
use crate::errors::{Result, ToolboxError};
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis, IxDyn};

/// Concatenates `tables` row-wise, in the given order.
///
/// Columns are the union of all input columns in first-seen order. Rows coming
/// from a table that lacks a column are filled with `NaN`.
///
/// # Errors
///
/// Returns [`ToolboxError::Aggregation`] if one column has a different per-row
/// shape in two tables.
pub fn concat(tables: &[TimeTable]) -> Result<TimeTable> {
    let mut names: Vec<String> = Vec::new();
    let mut row_shapes: Vec<Vec<usize>> = Vec::new();

    for (position, table) in tables.iter().enumerate() {
        for column in table.columns() {
            match names.iter().position(|n| *n == column.name) {
                Some(i) if row_shapes[i] != column.row_shape() => {
                    return Err(ToolboxError::aggregation(
                        format!("table #{position}"),
                        format!(
                            "column '{}' has per-row shape {:?}, expected {:?}",
                            column.name,
                            column.row_shape(),
                            row_shapes[i]
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    names.push(column.name.clone());
                    row_shapes.push(column.row_shape().to_vec());
                }
            }
        }
    }

    let index = tables
        .iter()
        .flat_map(|t| t.index().iter().copied())
        .collect();
    let mut combined = TimeTable::new(index);

    for (name, row_shape) in names.iter().zip(&row_shapes) {
        let parts: Vec<ArrayD<f64>> = tables
            .iter()
            .map(|t| match t.column(name) {
                Some(data) => data.clone(),
                None => {
                    let mut shape = vec![t.n_rows()];
                    shape.extend_from_slice(row_shape);
                    ArrayD::from_elem(IxDyn(&shape), f64::NAN)
                }
            })
            .collect();
        let views: Vec<ArrayViewD<'_, f64>> = parts.iter().map(|p| p.view()).collect();

        let data = concatenate(Axis(0), &views)?;
        combined.push_column(name.clone(), data)?;
    }

    Ok(combined)
}
