//! nctoolbox: variable extraction and aggregation for atmospheric NetCDF data
//!
//! A research toolbox for working with netCDF files from field campaigns and
//! reanalyses. Variables are requested by exact name or by name fragment,
//! extracted into a time-indexed table, optionally resampled, and whole folders
//! of files are concatenated into one table that can be saved and reloaded.
//!
//! ## Module Organization
//!
//! - [`netcdf_io`]: scoped file handle and the keyed table store
//! - [`metadata`]: variable descriptors and formatted listings
//! - [`resolver`]: request tokens to concrete variable names
//! - [`time`]: decoding of `"<unit> since <reference>"` time coordinates
//! - [`table`]: the time-indexed table, concatenation and resampling
//! - [`extract`]: per-file extraction into a table or a name → array mapping
//! - [`folder`]: file discovery, summaries and aggregation
//! - [`parallel`]: parallel processing configuration
//! - [`equations`]: saturation humidity, adiabatic LWC and droplet number
//! - [`ecmwf`]: point sampling of gridded fields
//! - [`uhsas`]: UHSAS particle size distributions
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nctoolbox::prelude::*;
//!
//! // One file: "tem" selects every variable whose name contains it
//! let handle = NetCDFFile::open("enametC1.b1.20140315.000000.cdf").unwrap();
//! let extracted = extract(&handle, &VarRequest::from("tem"), &ExtractOptions::default()).unwrap();
//!
//! // A folder of daily files, resampled to 6 hours and saved
//! let folder = NetCDFFolder::discover("met/", &FileFilter::default()).unwrap();
//! let options = ProcessOptions {
//!     extract: ExtractOptions::default().with_resample("6 hours"),
//!     save_to: Some("met_6h.nc".into()),
//!     ..ProcessOptions::default()
//! };
//! let request = VarRequest::from(["temp_mean", "rh_mean"]);
//! let aggregation = folder.process(&request, &options).unwrap();
//! ```

pub mod ecmwf;
pub mod equations;
pub mod errors;
pub mod extract;
pub mod folder;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod resolver;
pub mod table;
pub mod time;
pub mod uhsas;

pub use errors::{Result, ToolboxError};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::errors::{Result, ToolboxError};
    pub use crate::extract::{extract, ExtractOptions, Extracted, Extraction};
    pub use crate::folder::{Aggregation, FileFilter, FolderSummary, NetCDFFolder, ProcessOptions};
    pub use crate::metadata::{print_vars, MetaValue, VariableDescriptor};
    pub use crate::netcdf_io::{read_table, NetCDFFile, TableWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::resolver::{resolve, Diagnostic, Resolution, VarRequest};
    pub use crate::table::{Reducer, TimeTable};
}
