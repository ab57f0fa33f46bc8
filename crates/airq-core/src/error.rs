use thiserror::Error;

use crate::config::ConfigError;
use crate::display_manager::DisplayError;
use crate::storage::LogWriteError;

/// Errors that stop the monitor from starting or shutting down cleanly.
///
/// Failed sensor reads, display pushes and log rows never surface here;
/// the loops log them and retry.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open display: {0}")]
    Display(#[from] DisplayError),
    #[error("failed to open sample log: {0}")]
    Log(#[from] LogWriteError),
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} thread panicked")]
    TaskPanicked(&'static str),
}
