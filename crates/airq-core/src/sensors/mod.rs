//! Sensor ports consumed by the acquisition loop.
//!
//! The real drivers live outside this crate. Each one is wrapped behind
//! [`Sensor`], which only promises "start, stop, read one sample, may fail".
//! The VOC sensor additionally accepts a humidity compensation value through
//! [`HumidityCompensated`].

pub mod mock;
mod sensor_manager;
mod task;

pub use sensor_manager::{CycleError, SensorKind, SensorManager};
pub use task::{AcquisitionLoop, CycleOutcome};

use thiserror::Error;

/// Errors reported by a sensor port.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: String,
    },
    /// A measurement cycle produced nothing, e.g. the sensor is still warming up.
    #[error("{sensor}: no data available")]
    NoData { sensor: &'static str },
    #[error("{sensor}: failed to apply compensation: {details}")]
    CompensationFailed {
        sensor: &'static str,
        details: String,
    },
    #[error("{sensor}: {operation} failed: {details}")]
    LifecycleFailed {
        sensor: &'static str,
        operation: &'static str,
        details: String,
    },
}

impl SensorError {
    /// Whether this is a "measurement produced nothing" condition rather than
    /// a communication failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

/// Readings from the VOC/eCO2 sensor (SGP30 class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocReadings {
    pub eco2: u16,
    pub tvoc: u16,
}

/// Readings from the CO2/temperature/humidity sensor (SCD4x class).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReadings {
    pub co2: u16,
    pub temperature: f32,
    pub humidity: f32,
    /// Seconds since epoch at which the measurement was taken
    pub timestamp: f64,
}

/// Readings from the particulate sensor (PMS5003 class), in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticulateReadings {
    pub pm1: f32,
    pub pm2_5: f32,
    pub pm10: f32,
}

/// A sensor that produces typed readings.
///
/// Calls are blocking and carry no timeout; a hung read stalls only the
/// acquisition loop.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings;

    /// Human-readable sensor name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Enter measurement mode.
    fn start(&mut self) -> Result<(), SensorError>;

    /// Leave measurement mode and release the sensor.
    fn stop(&mut self) -> Result<(), SensorError>;

    /// Read one sample.
    fn read(&mut self) -> Result<Self::Readings, SensorError>;

    /// Restart measurement mode after a failure.
    fn restart(&mut self) -> Result<(), SensorError> {
        self.stop()?;
        self.start()
    }
}

/// A sensor whose readings are corrected with an absolute humidity value.
pub trait HumidityCompensated: Sensor {
    /// Apply an absolute humidity in 8.8 fixed-point g/m³.
    fn set_compensation(&mut self, absolute_humidity: u16) -> Result<(), SensorError>;
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    type Readings = S::Readings;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn start(&mut self) -> Result<(), SensorError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), SensorError> {
        (**self).stop()
    }

    fn read(&mut self) -> Result<Self::Readings, SensorError> {
        (**self).read()
    }

    fn restart(&mut self) -> Result<(), SensorError> {
        (**self).restart()
    }
}

impl<S: HumidityCompensated + ?Sized> HumidityCompensated for Box<S> {
    fn set_compensation(&mut self, absolute_humidity: u16) -> Result<(), SensorError> {
        (**self).set_compensation(absolute_humidity)
    }
}
