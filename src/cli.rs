//! Defines command-line interface options using `clap` for the nctoolbox application.

use clap::{Args as ClapArgs, Parser, Subcommand};
use nctoolbox::folder::FileFilter;
use nctoolbox::netcdf_io::DEFAULT_TABLE_KEY;
use nctoolbox::resolver::VarRequest;
use nctoolbox::table::Reducer;
use std::path::PathBuf;

/// A CLI tool for extracting and aggregating atmospheric NetCDF data
#[derive(Parser, Debug)]
#[command(
    version,
    name = "nctoolbox",
    about = "Extract, resample and aggregate variables from NetCDF files"
)]
pub struct Args {
    /// Enable verbose (debug) logging. RUST_LOG takes precedence when set.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all variables of a file with long name, units and dimensions
    Vars {
        /// Path to the NetCDF file
        file: PathBuf,

        /// Write the listing to this file instead of the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract variables from a single file
    Extract {
        /// Path to the NetCDF file
        file: PathBuf,

        #[command(flatten)]
        request: RequestArgs,

        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        head: usize,
    },

    /// Count the files of a folder, grouped by datastream
    Summary {
        /// Folder to scan
        folder: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Only print the total
        #[arg(long)]
        brief: bool,

        /// Separator ending the datastream name in a file name
        #[arg(long, default_value = ".")]
        sep: String,
    },

    /// Extract variables from every file of a folder and concatenate the tables
    Process {
        /// Folder to scan
        folder: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        request: RequestArgs,

        /// Only process files whose path contains this substring
        #[arg(long)]
        include: Option<String>,

        /// Save the aggregated table to this NetCDF file
        #[arg(long)]
        save_to: Option<PathBuf>,

        /// Key of the saved table
        #[arg(long, default_value = DEFAULT_TABLE_KEY)]
        key: String,

        /// Extract files in parallel (file order is preserved)
        #[arg(long)]
        parallel: bool,

        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        head: usize,
    },

    /// Print a table saved by `process --save-to`
    Show {
        /// Path to the saved table file
        file: PathBuf,

        /// Key of the table
        #[arg(long, default_value = DEFAULT_TABLE_KEY)]
        key: String,

        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        head: usize,
    },
}

/// Which variables to extract and how
#[derive(ClapArgs, Debug)]
pub struct RequestArgs {
    /// Variable names or name fragments; a fragment selects every variable containing it
    #[arg(short = 's', long = "var", required = true, num_args = 1..)]
    pub vars: Vec<String>,

    /// Resample time-indexed results to this interval, e.g. "1 hour" or "6h"
    #[arg(long)]
    pub resample: Option<String>,

    /// Reducer used when resampling: mean, sum, min, max, first, last
    #[arg(long, default_value = "mean")]
    pub how: Reducer,

    /// Return an empty result instead of failing when nothing matches
    #[arg(long)]
    pub tolerate_empty: bool,
}

impl RequestArgs {
    pub fn var_request(&self) -> VarRequest {
        match self.vars.as_slice() {
            [single] => VarRequest::Single(single.clone()),
            many => VarRequest::Many(many.to_vec()),
        }
    }
}

/// File selection inside a folder
#[derive(ClapArgs, Debug)]
pub struct FilterArgs {
    /// Select files whose name contains this substring (overrides --ext)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Allowed file extensions, comma separated
    #[arg(long, value_delimiter = ',', default_value = "nc,cdf")]
    pub ext: Vec<String>,
}

impl FilterArgs {
    pub fn file_filter(&self) -> FileFilter {
        match &self.pattern {
            Some(pattern) => FileFilter::Pattern(pattern.clone()),
            None => FileFilter::extensions(self.ext.iter().cloned()),
        }
    }
}
