use super::config::ConfigError;
use super::scan_type::ScanTypeError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "Failed to prepare {what} for worker {worker} at '{path}': {source}",
        path = path.display()
    )]
    WorkerSetup {
        worker: usize,
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output directory '{path}': {source}", path = path.display())]
    OutputSetup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    ScanType(#[from] ScanTypeError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
