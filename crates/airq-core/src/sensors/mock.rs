//! Synthetic sensors for running the pipeline without hardware.
//!
//! Values drift along slow sinusoids of the read counter, the same way the
//! desktop simulator generates data, so runs are reproducible. Failures can
//! be injected every N reads to exercise the recovery path.

use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use super::{
    ClimateReadings, HumidityCompensated, ParticulateReadings, Sensor, SensorError, VocReadings,
};

/// Typical indoor baseline for eCO2 (ppm)
const ECO2_BASELINE: f64 = 400.0;
/// Typical indoor baseline for TVOC (ppb)
const TVOC_BASELINE: f64 = 20.0;

/// Outdoor CO2 level (ppm)
const CO2_BASELINE: f64 = 400.0;
/// Room temperature (°C)
const TEMPERATURE_BASELINE: f64 = 21.0;
/// Indoor relative humidity (%RH)
const HUMIDITY_BASELINE: f64 = 45.0;

/// PM1.0, PM2.5 and PM10 baselines (µg/m³)
const PM_BASELINE: [f64; 3] = [12.0, 25.0, 45.0];

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Returns true when read number `count` (1-based) should fail.
fn should_fail(fail_every: Option<u32>, count: u64) -> bool {
    match fail_every {
        Some(n) if n > 0 => count % u64::from(n) == 0,
        _ => false,
    }
}

/// SGP30-like VOC/eCO2 sensor.
#[derive(Debug, Default)]
pub struct MockVocSensor {
    measuring: bool,
    reads: u64,
    compensation: Option<u16>,
}

impl MockVocSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last absolute humidity value applied, if any.
    pub fn compensation(&self) -> Option<u16> {
        self.compensation
    }
}

impl Sensor for MockVocSensor {
    type Readings = VocReadings;

    fn name(&self) -> &'static str {
        "SGP30"
    }

    fn start(&mut self) -> Result<(), SensorError> {
        self.measuring = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SensorError> {
        self.measuring = false;
        Ok(())
    }

    fn read(&mut self) -> Result<VocReadings, SensorError> {
        if !self.measuring {
            // The real part reports its idle values until measurement starts.
            return Ok(VocReadings { eco2: 400, tvoc: 0 });
        }

        self.reads += 1;
        let t = self.reads as f64;
        let eco2 = ECO2_BASELINE + 50.0 * (t / 90.0).sin().abs() + 10.0 * (t / 7.0).cos();
        let tvoc = TVOC_BASELINE + 5.0 * (t / 45.0).sin();

        Ok(VocReadings {
            eco2: eco2.max(400.0) as u16,
            tvoc: tvoc.max(0.0) as u16,
        })
    }
}

impl HumidityCompensated for MockVocSensor {
    fn set_compensation(&mut self, absolute_humidity: u16) -> Result<(), SensorError> {
        debug!("SGP30: humidity compensation set to {}", absolute_humidity);
        self.compensation = Some(absolute_humidity);
        Ok(())
    }
}

/// SCD4x-like CO2/temperature/humidity sensor.
///
/// Reports [`SensorError::NoData`] while periodic measurement is stopped.
#[derive(Debug, Default)]
pub struct MockClimateSensor {
    measuring: bool,
    reads: u64,
    fail_every: Option<u32>,
}

impl MockClimateSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `n`th read with a communication error.
    pub fn with_fail_every(mut self, n: u32) -> Self {
        self.fail_every = Some(n);
        self
    }
}

impl Sensor for MockClimateSensor {
    type Readings = ClimateReadings;

    fn name(&self) -> &'static str {
        "SCD41"
    }

    fn start(&mut self) -> Result<(), SensorError> {
        self.measuring = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SensorError> {
        self.measuring = false;
        Ok(())
    }

    fn read(&mut self) -> Result<ClimateReadings, SensorError> {
        if !self.measuring {
            return Err(SensorError::NoData { sensor: self.name() });
        }

        self.reads += 1;
        if should_fail(self.fail_every, self.reads) {
            return Err(SensorError::ReadFailed {
                sensor: self.name(),
                operation: "read measurement",
                details: "simulated I2C error".into(),
            });
        }

        let t = self.reads as f64;
        let co2 = CO2_BASELINE + 200.0 * (t / 300.0).sin().abs() + 25.0 * (t / 41.0).cos();
        let temperature = TEMPERATURE_BASELINE + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
        let humidity = HUMIDITY_BASELINE + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();

        Ok(ClimateReadings {
            co2: co2.max(400.0) as u16,
            temperature: temperature as f32,
            humidity: humidity.clamp(0.0, 100.0) as f32,
            timestamp: now_secs(),
        })
    }
}

/// PMS5003-like particulate sensor.
#[derive(Debug, Default)]
pub struct MockParticulateSensor {
    reads: u64,
    fail_every: Option<u32>,
}

impl MockParticulateSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `n`th read with a frame error.
    pub fn with_fail_every(mut self, n: u32) -> Self {
        self.fail_every = Some(n);
        self
    }
}

impl Sensor for MockParticulateSensor {
    type Readings = ParticulateReadings;

    fn name(&self) -> &'static str {
        "PMS5003"
    }

    // The PMS5003 streams continuously once powered; nothing to toggle.
    fn start(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read(&mut self) -> Result<ParticulateReadings, SensorError> {
        self.reads += 1;
        if should_fail(self.fail_every, self.reads) {
            return Err(SensorError::ReadFailed {
                sensor: self.name(),
                operation: "read frame",
                details: "simulated checksum mismatch".into(),
            });
        }

        // A common ±20 % variation across all size bins.
        let variation = 1.0 + 0.2 * (self.reads as f64 / 60.0).sin();
        let [pm1, pm2_5, pm10] = PM_BASELINE.map(|v| (v * variation) as f32);

        Ok(ParticulateReadings { pm1, pm2_5, pm10 })
    }
}
