use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to locate a valid home directory")]
    NoHomeDir,
    #[error("Failed to create directory {0}: {1}")]
    DirCreationFailed(String, io::Error),
    #[error("{0} is not a directory")]
    NotADirectory(String),
    #[error("{0} contains invalid unicode")]
    InvalidUnicode(String),
    #[error("Storage quota of {quota} bytes exceeded writing {key}")]
    QuotaExceeded { key: String, quota: usize },
    #[error("I/O error on {0}: {1}")]
    Io(String, io::Error),
}
