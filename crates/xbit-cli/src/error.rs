use std::path::PathBuf;
use thiserror::Error;
use xbit::engine::error::EngineError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// A fatal condition raised by the scan engine itself.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot parse '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write result table: {0}")]
    Export(#[from] csv::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
