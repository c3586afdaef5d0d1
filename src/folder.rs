//! Folder aggregation: discover files, extract each one, concatenate the tables
//!
//! A [`NetCDFFolder`] holds the file set found at discovery time. Filters are
//! not re-applied later; a file removed after discovery surfaces as an I/O
//! error when it is processed.

use crate::errors::{Result, ToolboxError};
use crate::extract::{extract, ExtractOptions, Extraction, Extracted};
use crate::netcdf_io::{NetCDFFile, TableWriter, DEFAULT_TABLE_KEY};
use crate::resolver::{Diagnostic, VarRequest};
use crate::table::{concat, TimeTable};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Which files of a folder belong to the file set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// File names containing this substring (case-sensitive), any extension
    Pattern(String),
    /// File names whose extension is in the allow-list
    Extensions(Vec<String>),
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::Extensions(vec!["nc".to_string(), "cdf".to_string()])
    }
}

impl FileFilter {
    /// An allow-list filter from one or more extensions
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Extensions(extensions.into_iter().map(Into::into).collect())
    }

    /// Checks the filter and strips leading dots from extensions.
    fn normalized(&self) -> Result<Self> {
        match self {
            Self::Pattern(pattern) => {
                if pattern.is_empty() {
                    return Err(ToolboxError::invalid_argument(
                        "pattern",
                        "pattern must not be empty",
                    ));
                }
                Ok(self.clone())
            }
            Self::Extensions(extensions) => {
                if extensions.is_empty() {
                    return Err(ToolboxError::invalid_argument(
                        "extensions",
                        "at least one extension is required",
                    ));
                }
                extensions
                    .iter()
                    .map(|ext| {
                        let trimmed = ext.strip_prefix('.').unwrap_or(ext);
                        if trimmed.is_empty() || trimmed.contains(['/', '\\', '.']) {
                            Err(ToolboxError::invalid_argument(
                                ext.clone(),
                                "extensions must be non-empty names like 'nc' or 'cdf'",
                            ))
                        } else {
                            Ok(trimmed.to_string())
                        }
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Self::Extensions)
            }
        }
    }

    /// Hidden files (such as `._*` resource forks) never match
    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        match self {
            Self::Pattern(pattern) => name.contains(pattern.as_str()),
            Self::Extensions(extensions) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext)),
        }
    }
}

/// Counts reported by [`NetCDFFolder::summary`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub total: usize,
    /// Files per datastream (basename prefix); empty unless detailed
    pub groups: BTreeMap<String, usize>,
}

/// Options for [`NetCDFFolder::process`]
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Only process files whose path contains this substring
    pub include: Option<String>,
    /// Persist the aggregated table to this path
    pub save_to: Option<PathBuf>,
    /// Key of the stored table
    pub key: String,
    /// Per-file extraction options
    pub extract: ExtractOptions,
    /// Extract files on the Rayon thread pool
    pub parallel: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            include: None,
            save_to: None,
            key: DEFAULT_TABLE_KEY.to_string(),
            extract: ExtractOptions::default(),
            parallel: false,
        }
    }
}

/// The aggregated table and what happened while building and saving it
#[derive(Debug)]
pub struct Aggregation {
    /// `None` when no file produced a table
    pub table: Option<TimeTable>,
    pub diagnostics: Vec<Diagnostic>,
    /// Where the table was written, if it was
    pub saved_to: Option<PathBuf>,
    /// Why saving failed; the in-memory table is still returned
    pub save_error: Option<ToolboxError>,
}

/// The file set of one directory
#[derive(Debug, Clone)]
pub struct NetCDFFolder {
    abspath: PathBuf,
    files: Vec<PathBuf>,
}

impl NetCDFFolder {
    /// Lists the regular, non-hidden files of `folder` accepted by `filter`,
    /// sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::NotADirectory`] if `folder` is not a directory and
    /// [`ToolboxError::InvalidArgument`] for a malformed filter.
    pub fn discover(folder: impl AsRef<Path>, filter: &FileFilter) -> Result<Self> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(ToolboxError::NotADirectory {
                path: folder.to_path_buf(),
            });
        }
        let filter = filter.normalized()?;
        let abspath = fs::canonicalize(folder)?;

        let mut files = Vec::new();
        for entry in fs::read_dir(&abspath)? {
            let path = entry?.path();
            if path.is_file() && filter.accepts(&path) {
                files.push(path);
            }
        }
        files.sort();

        tracing::debug!(folder = %abspath.display(), files = files.len(), "discovered files");

        Ok(Self { abspath, files })
    }

    /// Absolute path of the folder
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.abspath
    }

    /// The file set, in processing order
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Prints the file count and, if `detailed`, the count per datastream.
    ///
    /// A file's datastream is its basename up to the first `separator`.
    pub fn summary(&self, detailed: bool, separator: &str) -> FolderSummary {
        println!("{}", self.abspath.display());
        println!("Found {} files total\n", self.files.len());

        let mut groups = BTreeMap::new();
        if detailed {
            for file in &self.files {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let stream = if separator.is_empty() {
                    name
                } else {
                    name.split(separator).next().unwrap_or_default().to_string()
                };
                *groups.entry(stream).or_insert(0) += 1;
            }
            for (stream, count) in &groups {
                println!("Found {count} items for datastream {stream}");
            }
        }

        FolderSummary {
            total: self.files.len(),
            groups,
        }
    }

    /// Extracts `request` from every file and concatenates the tables in file order.
    ///
    /// # Errors
    ///
    /// Stops at the first file that fails to extract, and returns
    /// [`ToolboxError::Aggregation`] if any file yields the mapping shape or the
    /// tables cannot be combined. Persistence failures are reported in
    /// [`Aggregation::save_error`] instead.
    pub fn process(&self, request: &VarRequest, options: &ProcessOptions) -> Result<Aggregation> {
        request.validate()?;

        let mut diagnostics = Vec::new();
        let mut selected: Vec<&PathBuf> = Vec::new();
        for file in &self.files {
            match &options.include {
                Some(include) if !file.to_string_lossy().contains(include.as_str()) => {
                    diagnostics.push(Diagnostic::SkippedFile { path: file.clone() });
                }
                _ => selected.push(file),
            }
        }

        let run = |path: &&PathBuf| -> Result<(PathBuf, Extracted)> {
            tracing::debug!(path = %path.display(), "processing");
            let handle = NetCDFFile::open(path)?;
            Ok(((*path).clone(), extract(&handle, request, &options.extract)?))
        };
        let results: Vec<(PathBuf, Extracted)> = if options.parallel {
            selected
                .par_iter()
                .map(run)
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<_>>()?
        } else {
            selected.iter().map(run).collect::<Result<_>>()?
        };

        let mut tables = Vec::new();
        for (path, extracted) in results {
            diagnostics.extend(extracted.diagnostics);
            match extracted.result {
                Some(Extraction::Table(table)) => tables.push(table),
                Some(Extraction::Arrays(_)) => {
                    return Err(ToolboxError::aggregation(
                        path,
                        "variables do not all share the time dimension, \
                         so the result is not a table",
                    ));
                }
                None => diagnostics.push(Diagnostic::EmptyResult { path }),
            }
        }

        let table = if tables.is_empty() {
            None
        } else {
            Some(concat(&tables)?)
        };

        tracing::info!(
            files = selected.len(),
            tables = tables.len(),
            rows = table.as_ref().map_or(0, TimeTable::n_rows),
            "aggregation complete"
        );

        let (saved_to, save_error) = match &options.save_to {
            None => (None, None),
            Some(path) => match save(path, &options.key, table.as_ref()) {
                Ok(()) => (Some(path.clone()), None),
                Err(e) => {
                    tracing::warn!(error = %e, "aggregated table was not saved");
                    (None, Some(e))
                }
            },
        };

        Ok(Aggregation {
            table,
            diagnostics,
            saved_to,
            save_error,
        })
    }
}

fn save(path: &Path, key: &str, table: Option<&TimeTable>) -> Result<()> {
    let table = table.ok_or_else(|| {
        ToolboxError::persistence(path, "there is no aggregated table to save")
    })?;
    TableWriter::new(path, key).write(table)
}
