use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of a batch run.
///
/// `NotFound`, `NoMatchingFiles` and `ServiceUnavailable` abort the run.
/// `DocumentOpen` and `Scan` are contained per file by the pipeline and only
/// show up in [`crate::BatchReport::failures`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Folder not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No Word documents found in {}", .0.display())]
    NoMatchingFiles(PathBuf),

    #[error("{engine} engine is unavailable: {source}")]
    ServiceUnavailable {
        engine: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("Failed to open {}: {source}", path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Failed to check {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Failed to export results: {0}")]
    Export(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::Export(err.to_string())
    }
}
