use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use tracing::{debug, error};

use crate::definition::is_derived;
use crate::error::{Error, Result};

/// Where hashring definition files come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HashringSource {
    /// A single definition file.
    File(PathBuf),

    /// Every `.json` file below a directory, derived files excluded.
    Directory(PathBuf),
}

impl HashringSource {
    /// Builds a source from mutually exclusive file and directory options.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly one of `file` and `directory` is set.
    pub fn from_options(file: Option<PathBuf>, directory: Option<PathBuf>) -> Result<Self> {
        match (file, directory) {
            (Some(file), None) => Ok(Self::File(file)),
            (None, Some(directory)) => Ok(Self::Directory(directory)),
            _ => Err(Error::InvalidSource),
        }
    }

    /// Lists the definition files currently present.
    ///
    /// Entries that cannot be inspected are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing, unreadable or not a
    /// directory, or if its path cannot form a valid pattern.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let files = match self {
            Self::File(file) => vec![file.clone()],
            Self::Directory(directory) => list_hashring_files(directory)?,
        };

        debug!("watching files: {:?}", files);

        Ok(files)
    }
}

fn list_hashring_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(directory).map_err(|source| Error::ReadSource {
        path: directory.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    let root = Pattern::escape(&directory.to_string_lossy());
    let pattern = format!("{}/**/*.json", root.trim_end_matches('/'));

    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() && !is_derived(&path) => files.push(path),
            Ok(_) => {}
            Err(e) => error!("{}", e),
        }
    }

    files.sort();

    Ok(files)
}
