use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

use super::{LogSink, LogWriteError};
use crate::sample::{Field, Sample};

/// Fields written for every sample, in column order
const CORE_FIELDS: [Field; 5] = [
    Field::Temperature,
    Field::Humidity,
    Field::Co2,
    Field::Tvoc,
    Field::Eco2,
];

/// Particulate fields appended when the log carries particulate columns
const PARTICULATE_FIELDS: [Field; 3] = [Field::Pm1, Field::Pm2_5, Field::Pm10];

/// Local date-time format for the timestamp column
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Append-only CSV log of accepted samples.
///
/// The header is written once when the log is created. Each row is flushed
/// before [`LogSink::append`] returns.
pub struct CsvLog<W: Write> {
    writer: W,
    with_particulates: bool,
    path: Option<PathBuf>,
    line: String,
}

impl CsvLog<File> {
    /// Create a new log file in `dir`, named after `started_at`.
    ///
    /// The directory is created if it does not exist. An existing file of the
    /// same name is never reopened; that is reported as
    /// [`LogWriteError::Create`].
    pub fn create_in(
        dir: impl AsRef<Path>,
        started_at: DateTime<Local>,
        with_particulates: bool,
    ) -> Result<Self, LogWriteError> {
        let dir = dir.as_ref();
        let path = dir.join(Self::file_name(started_at));

        let create_err = |source| LogWriteError::Create {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(dir).map_err(create_err)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(create_err)?;

        info!("Logging samples to {}", path.display());

        let mut log = Self::new(file, with_particulates)?;
        log.path = Some(path);
        Ok(log)
    }

    /// File name for a log started at `started_at`.
    pub fn file_name(started_at: DateTime<Local>) -> String {
        format!("air_quality_{}.csv", started_at.format("%Y%m%d_%H%M%S"))
    }
}

impl<W: Write> CsvLog<W> {
    /// Wrap `writer` and write the header row.
    pub fn new(writer: W, with_particulates: bool) -> Result<Self, LogWriteError> {
        let mut log = Self {
            writer,
            with_particulates,
            path: None,
            line: String::with_capacity(128),
        };
        log.write_header()?;
        Ok(log)
    }

    /// Path of the backing file, when the log was created on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> Result<(), LogWriteError> {
        self.line.clear();
        self.line.push_str("timestamp");
        for field in columns(self.with_particulates) {
            self.line.push(',');
            self.line.push_str(field.column());
        }
        self.flush_line()
    }

    fn flush_line(&mut self) -> Result<(), LogWriteError> {
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> LogSink for CsvLog<W> {
    fn append(&mut self, sample: &Sample) -> Result<(), LogWriteError> {
        self.line.clear();
        // Writing into a String cannot fail.
        let _ = write!(self.line, "{}", format_timestamp(sample.timestamp));
        for field in columns(self.with_particulates) {
            self.line.push(',');
            match field.of(sample) {
                Some(value) if matches!(field, Field::Co2 | Field::Tvoc | Field::Eco2) => {
                    let _ = write!(self.line, "{}", value as u16);
                }
                Some(value) => {
                    let _ = write!(self.line, "{}", value);
                }
                None => {}
            }
        }
        self.flush_line()
    }
}

/// Fields of one row, in column order.
fn columns(with_particulates: bool) -> impl Iterator<Item = Field> {
    let particulates: &'static [Field] = if with_particulates {
        &PARTICULATE_FIELDS
    } else {
        &[]
    };
    CORE_FIELDS.into_iter().chain(particulates.iter().copied())
}

/// Render epoch seconds as a local date-time.
///
/// Timestamps outside chrono's range fall back to the raw seconds.
pub fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1.0e9) as u32;
    match DateTime::from_timestamp(secs as i64, nanos.min(999_999_999)) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        None => format!("{timestamp}"),
    }
}

/// Log sink that discards every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl LogSink for NullLog {
    fn append(&mut self, _sample: &Sample) -> Result<(), LogWriteError> {
        Ok(())
    }
}
