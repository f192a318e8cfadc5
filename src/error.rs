use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or writing one of the JSON stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{} is not a valid store: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Validation(String),
    #[error("no workout at position {index} (the log has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}
