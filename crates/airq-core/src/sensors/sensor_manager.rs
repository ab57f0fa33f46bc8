use core::fmt;

use log::{error, info, warn};
use thiserror::Error;

use super::{
    ClimateReadings, HumidityCompensated, ParticulateReadings, Sensor, SensorError, VocReadings,
};
use crate::compensation::absolute_humidity_fixed_point;
use crate::sample::Sample;

/// Which of the three sensors an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// VOC/eCO2 sensor
    Voc,
    /// CO2/temperature/humidity sensor
    Climate,
    /// Particulate matter sensor
    Particulate,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Voc => "VOC",
            Self::Climate => "climate",
            Self::Particulate => "particulate",
        })
    }
}

/// A measurement cycle that produced no sample.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{sensor} sensor: {source}")]
pub struct CycleError {
    pub sensor: SensorKind,
    #[source]
    pub source: SensorError,
}

impl CycleError {
    fn new(sensor: SensorKind, source: SensorError) -> Self {
        Self { sensor, source }
    }
}

/// Owns the sensors and turns one pass over them into a [`Sample`].
///
/// The particulate sensor is optional; without it samples carry no
/// particulate reading.
pub struct SensorManager<V, C, P> {
    voc: V,
    climate: C,
    particulate: Option<P>,
}

impl<V, C, P> SensorManager<V, C, P>
where
    V: HumidityCompensated<Readings = VocReadings>,
    C: Sensor<Readings = ClimateReadings>,
    P: Sensor<Readings = ParticulateReadings>,
{
    pub fn new(voc: V, climate: C, particulate: Option<P>) -> Self {
        Self {
            voc,
            climate,
            particulate,
        }
    }

    pub fn has_particulates(&self) -> bool {
        self.particulate.is_some()
    }

    /// Start measurement on every sensor.
    ///
    /// Failures are logged and otherwise ignored: the acquisition loop
    /// reports them again on every cycle until the sensor recovers.
    pub fn init(&mut self) {
        info!("Starting sensors");
        log_lifecycle(self.voc.name(), "start", self.voc.start());
        log_lifecycle(self.climate.name(), "start", self.climate.start());
        if let Some(pm) = self.particulate.as_mut() {
            log_lifecycle(pm.name(), "start", pm.start());
        }
    }

    /// Read every sensor once and assemble a sample.
    ///
    /// Order: VOC, climate, particulates, then the absolute humidity derived
    /// from the climate reading is fed back to the VOC sensor.
    pub fn read_cycle(&mut self) -> Result<Sample, CycleError> {
        let voc = self
            .voc
            .read()
            .map_err(|e| CycleError::new(SensorKind::Voc, e))?;

        let climate = self
            .climate
            .read()
            .map_err(|e| CycleError::new(SensorKind::Climate, e))?;

        let particulates = match self.particulate.as_mut() {
            Some(pm) => Some(
                pm.read()
                    .map_err(|e| CycleError::new(SensorKind::Particulate, e))?,
            ),
            None => None,
        };

        let compensation = absolute_humidity_fixed_point(climate.temperature, climate.humidity);
        self.voc
            .set_compensation(compensation)
            .map_err(|e| CycleError::new(SensorKind::Voc, e))?;

        Ok(Sample::from_readings(voc, climate, particulates))
    }

    /// Restart the sensor that caused `error`, if it supports recovery.
    ///
    /// Only the climate sensor's periodic measurement mode is restarted, and
    /// only after a failed read. [`SensorError::NoData`] means the sensor is
    /// still warming up; a restart would begin the warm-up again.
    /// Returns whether a restart was attempted.
    pub fn recover(&mut self, error: &CycleError) -> bool {
        if error.sensor != SensorKind::Climate || error.source.is_no_data() {
            return false;
        }

        info!("{}: restarting periodic measurement", self.climate.name());
        if let Err(e) = self.climate.restart() {
            error!("{}: restart failed: {}", self.climate.name(), e);
        }
        true
    }

    /// Stop every sensor, releasing the climate sensor's periodic
    /// measurement mode.
    pub fn shutdown(&mut self) {
        info!("Stopping sensors");
        log_lifecycle(self.climate.name(), "stop", self.climate.stop());
        log_lifecycle(self.voc.name(), "stop", self.voc.stop());
        if let Some(pm) = self.particulate.as_mut() {
            log_lifecycle(pm.name(), "stop", pm.stop());
        }
    }

    pub fn voc(&self) -> &V {
        &self.voc
    }

    pub fn climate(&self) -> &C {
        &self.climate
    }
}

fn log_lifecycle(sensor: &str, operation: &str, result: Result<(), SensorError>) {
    if let Err(e) = result {
        warn!("{}: {} failed: {}", sensor, operation, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::mock::{MockClimateSensor, MockParticulateSensor, MockVocSensor};
    use crate::testing::{ScriptedClimate, ScriptedVoc, climate_at};

    #[test]
    fn test_cycle_feeds_compensation_to_voc() {
        let mut manager = SensorManager::new(
            ScriptedVoc::default(),
            ScriptedClimate::new(vec![Ok(climate_at(21.0, 45.0, 100.0))]),
            None::<MockParticulateSensor>,
        );

        let sample = manager.read_cycle().unwrap();

        assert_eq!(sample.timestamp, 100.0);
        assert_eq!(sample.particulates, None);
        assert_eq!(manager.voc().compensations(), vec![2105]);
    }

    #[test]
    fn test_no_data_is_a_climate_error() {
        let mut manager = SensorManager::new(
            MockVocSensor::new(),
            MockClimateSensor::new(),
            Some(MockParticulateSensor::new()),
        );

        // Never started, so the climate sensor has nothing to report.
        let err = manager.read_cycle().unwrap_err();
        assert_eq!(err.sensor, SensorKind::Climate);
        assert!(err.source.is_no_data());
    }

    #[test]
    fn test_init_then_full_cycle() {
        let mut manager = SensorManager::new(
            MockVocSensor::new(),
            MockClimateSensor::new(),
            Some(MockParticulateSensor::new()),
        );
        manager.init();

        let sample = manager.read_cycle().unwrap();
        assert!(sample.particulates.is_some());
        assert!(manager.voc().compensation().is_some());
    }

    #[test]
    fn test_voc_failure_skips_climate_read() {
        let mut manager = SensorManager::new(
            ScriptedVoc::failing_read(),
            ScriptedClimate::new(vec![Ok(climate_at(21.0, 45.0, 1.0))]),
            None::<MockParticulateSensor>,
        );

        let err = manager.read_cycle().unwrap_err();
        assert_eq!(err.sensor, SensorKind::Voc);
        assert_eq!(manager.climate().reads(), 0);
    }

    #[test]
    fn test_compensation_failure_fails_cycle() {
        let mut manager = SensorManager::new(
            ScriptedVoc::failing_compensation(),
            ScriptedClimate::new(vec![Ok(climate_at(21.0, 45.0, 1.0))]),
            None::<MockParticulateSensor>,
        );

        let err = manager.read_cycle().unwrap_err();
        assert_eq!(err.sensor, SensorKind::Voc);
        assert!(matches!(err.source, SensorError::CompensationFailed { .. }));
    }

    #[test]
    fn test_recover_restarts_only_climate() {
        let mut manager = SensorManager::new(
            ScriptedVoc::default(),
            ScriptedClimate::new(vec![]),
            None::<MockParticulateSensor>,
        );
        let voc_err = CycleError::new(SensorKind::Voc, SensorError::NoData { sensor: "SGP30" });
        let climate_err = CycleError::new(
            SensorKind::Climate,
            SensorError::ReadFailed {
                sensor: "SCD41",
                operation: "read measurement",
                details: "bus error".into(),
            },
        );

        assert!(!manager.recover(&voc_err));
        assert!(manager.recover(&climate_err));
        assert_eq!(manager.climate().restarts(), 1);
    }

    #[test]
    fn test_recover_leaves_warming_climate_alone() {
        let mut manager = SensorManager::new(
            ScriptedVoc::default(),
            ScriptedClimate::new(vec![]),
            None::<MockParticulateSensor>,
        );
        manager.init();
        let warming = CycleError::new(SensorKind::Climate, SensorError::NoData { sensor: "SCD41" });

        assert!(!manager.recover(&warming));
        assert_eq!(manager.climate().restarts(), 0);
        assert!(manager.climate().is_measuring());
    }

    #[test]
    fn test_shutdown_stops_climate() {
        let mut manager = SensorManager::new(
            ScriptedVoc::default(),
            ScriptedClimate::new(vec![]),
            None::<MockParticulateSensor>,
        );
        manager.init();
        manager.shutdown();

        assert!(!manager.climate().is_measuring());
    }
}
