//! Centralized error handling for nctoolbox
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! names the offending input (path, token, or argument) so batch scripts can
//! report the first failure directly.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for nctoolbox operations
#[derive(Debug, Error)]
pub enum ToolboxError {
    /// A path that should be a regular file is missing or is not a file
    #[error("File {} could not be found", path.display())]
    NotFound { path: PathBuf },

    /// A path that should be a directory is missing or is not a directory
    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// An argument has the wrong shape (empty token, malformed extension, bad duration)
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// None of the requested tokens matched a variable in the file
    #[error("No matching variables found for request [{}]", tokens.join(", "))]
    NoMatch { tokens: Vec<String> },

    /// The variable request itself is unusable
    #[error("Error: {0}")]
    VariableError(String),

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Per-file results cannot be concatenated into one table
    #[error("Cannot aggregate '{}': {message}", path.display())]
    Aggregation { path: PathBuf, message: String },

    /// The aggregated table could not be written to (or read from) the store
    #[error("Cannot persist table to '{}': {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    /// The time coordinate could not be decoded
    #[error("Cannot decode time units '{units}': {message}")]
    TimeDecode { units: String, message: String },

    /// Two arrays that must agree in shape do not
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),
}

impl ToolboxError {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// Create a VariableNotFound error.
    pub fn variable_not_found(var: impl Into<String>) -> Self {
        Self::VariableNotFound { var: var.into() }
    }

    /// Create a TimeDecode error.
    pub fn time_decode(units: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimeDecode {
            units: units.into(),
            message: message.into(),
        }
    }

    /// Create a Persistence error.
    pub fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an Aggregation error.
    pub fn aggregation(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Aggregation {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for nctoolbox operations
pub type Result<T> = std::result::Result<T, ToolboxError>;
