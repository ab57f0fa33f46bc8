//! Sample history and durable logging.
//!
//! [`HistoryStore`] keeps the most recent samples in RAM for trend
//! computation and writes every accepted sample through a [`LogSink`] in
//! the same call. The pair is best-effort: a failed log write is reported
//! but the in-memory append stands.

pub mod csv_log;
pub mod history;

pub use csv_log::{CsvLog, NullLog};
pub use history::HistoryStore;

use thiserror::Error;

use crate::sample::Sample;

/// Default number of samples retained in memory (one hour at 1 Hz)
pub const DEFAULT_HISTORY_CAPACITY: usize = 3600;

/// Failure to append a row to the durable log.
#[derive(Error, Debug)]
pub enum LogWriteError {
    #[error("failed to create log {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write log row: {0}")]
    Write(#[from] std::io::Error),
}

/// Append-only destination for accepted samples.
pub trait LogSink {
    /// Append one row for `sample`. Must not return before the row is handed
    /// to the operating system.
    fn append(&mut self, sample: &Sample) -> Result<(), LogWriteError>;
}

impl<L: LogSink + ?Sized> LogSink for Box<L> {
    fn append(&mut self, sample: &Sample) -> Result<(), LogWriteError> {
        (**self).append(sample)
    }
}
