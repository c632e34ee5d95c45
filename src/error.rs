use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Per-file failure of a scan or merge task. Terminal for that file only.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file no longer holds the identifier the plan expects at this line.
    #[error("{} changed since it was scanned (line {line})", path.display())]
    StalePlan { path: PathBuf, line: usize },
}

impl MergeError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        MergeError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        MergeError::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            MergeError::FileRead { path, .. }
            | MergeError::FileWrite { path, .. }
            | MergeError::StalePlan { path, .. } => path,
        }
    }
}

pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// A file whose task ended with an error, kept alongside the successful ones.
#[derive(Debug)]
pub struct FileFailure {
    pub file: String,
    pub error: MergeError,
}
