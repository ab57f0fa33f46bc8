//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use embedded_graphics::prelude::Size;

use crate::display_manager::{DisplayError, DisplaySink};
use crate::framebuffer::MonoFrame;
use crate::sample::Sample;
use crate::sensors::{
    ClimateReadings, HumidityCompensated, ParticulateReadings, Sensor, SensorError, VocReadings,
};
use crate::storage::{LogSink, LogWriteError};

/// A sample with typical indoor values at `timestamp`.
pub fn sample_at(timestamp: f64) -> Sample {
    Sample {
        temperature: 21.0,
        humidity: 45.0,
        co2: 450,
        tvoc: 20,
        eco2: 420,
        particulates: Some(ParticulateReadings {
            pm1: 12.0,
            pm2_5: 25.0,
            pm10: 45.0,
        }),
        timestamp,
    }
}

pub fn climate_at(temperature: f32, humidity: f32, timestamp: f64) -> ClimateReadings {
    ClimateReadings {
        co2: 450,
        temperature,
        humidity,
        timestamp,
    }
}

/// A fresh, unique directory path under the system temp dir. Not created.
pub fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("airq-{name}-{}-{nanos}", std::process::id()))
}

/// Log sink whose every write fails.
pub struct FailingLog;

impl LogSink for FailingLog {
    fn append(&mut self, _sample: &Sample) -> Result<(), LogWriteError> {
        Err(LogWriteError::Write(io::Error::other("disk full")))
    }
}

/// In-memory writer whose contents stay readable after it is moved into a log.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// VOC sensor returning fixed readings and recording every compensation.
#[derive(Default)]
pub struct ScriptedVoc {
    compensations: Vec<u16>,
    fail_read: bool,
    fail_compensation: bool,
}

impl ScriptedVoc {
    pub fn failing_read() -> Self {
        Self {
            fail_read: true,
            ..Self::default()
        }
    }

    pub fn failing_compensation() -> Self {
        Self {
            fail_compensation: true,
            ..Self::default()
        }
    }

    pub fn compensations(&self) -> Vec<u16> {
        self.compensations.clone()
    }
}

impl Sensor for ScriptedVoc {
    type Readings = VocReadings;

    fn name(&self) -> &'static str {
        "SGP30"
    }

    fn start(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read(&mut self) -> Result<VocReadings, SensorError> {
        if self.fail_read {
            return Err(SensorError::ReadFailed {
                sensor: "SGP30",
                operation: "measure air quality",
                details: "crc mismatch".into(),
            });
        }
        Ok(VocReadings { eco2: 420, tvoc: 20 })
    }
}

impl HumidityCompensated for ScriptedVoc {
    fn set_compensation(&mut self, absolute_humidity: u16) -> Result<(), SensorError> {
        if self.fail_compensation {
            return Err(SensorError::CompensationFailed {
                sensor: "SGP30",
                details: "nack".into(),
            });
        }
        self.compensations.push(absolute_humidity);
        Ok(())
    }
}

/// Climate sensor replaying a fixed script of results, then reporting no data.
pub struct ScriptedClimate {
    script: VecDeque<Result<ClimateReadings, SensorError>>,
    measuring: bool,
    reads: usize,
    restarts: usize,
}

impl ScriptedClimate {
    pub fn new(script: Vec<Result<ClimateReadings, SensorError>>) -> Self {
        Self {
            script: script.into(),
            measuring: false,
            reads: 0,
            restarts: 0,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }
}

impl Sensor for ScriptedClimate {
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
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or(Err(SensorError::NoData { sensor: "SCD41" }))
    }

    fn restart(&mut self) -> Result<(), SensorError> {
        self.restarts += 1;
        self.stop()?;
        self.start()
    }
}

/// Display sink that keeps every pushed frame.
#[derive(Clone)]
pub struct RecordingDisplay {
    size: Size,
    frames: Arc<Mutex<Vec<MonoFrame>>>,
    fail: bool,
}

impl RecordingDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            frames: Arc::default(),
            fail: false,
        }
    }

    /// A display whose every push fails.
    pub fn failing(width: u32, height: u32) -> Self {
        Self {
            fail: true,
            ..Self::new(width, height)
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn last_frame(&self) -> Option<MonoFrame> {
        self.frames.lock().unwrap().last().cloned()
    }
}

impl DisplaySink for RecordingDisplay {
    fn size(&self) -> Size {
        self.size
    }

    fn display(&mut self, frame: &MonoFrame) -> Result<(), DisplayError> {
        if self.fail {
            return Err(DisplayError::Push("panel not responding".into()));
        }
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}
