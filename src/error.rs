//! Error types for inkpress operations.
//!
//! Conversion itself never fails; these cover the I/O edges around it
//! (theme directories, CLI input and output).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading themes or handling files.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read theme directory {}: {source}", path.display())]
    ThemeDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "cli")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
