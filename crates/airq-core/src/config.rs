//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid
//! configuration:
//!
//! ```toml
//! sample_period_ms = 1000
//! log_dir = "/var/lib/airq"
//!
//! [pages]
//! page_seconds = 4
//!
//! [indicators.co2]
//! gauge_max = 2500
//! bands = [
//!     { from = 0, status = "good" },
//!     { from = 1000, status = "warning" },
//!     { from = 1500, status = "bad" },
//! ]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use embedded_graphics::prelude::Size;
use serde::Deserialize;
use thiserror::Error;

use crate::metrics::{Indicators, StatusBands};
use crate::pages::DEFAULT_TREND_THRESHOLD;
use crate::sample::Field;
use crate::storage::DEFAULT_HISTORY_CAPACITY;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Target interval between successful samples
    pub sample_period_ms: u64,
    /// Pause after a failed acquisition cycle or display push
    pub failure_backoff_ms: u64,
    pub render_period_ms: u64,
    /// Samples retained in memory
    pub history_capacity: usize,
    /// Directory for the CSV log
    pub log_dir: PathBuf,
    pub log_enabled: bool,
    pub display: DisplayConfig,
    pub pages: PagesConfig,
    pub sensors: SensorsConfig,
    /// Per-field overrides of the built-in indicators
    pub indicators: HashMap<Field, IndicatorConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 1000,
            failure_backoff_ms: 1000,
            render_period_ms: 100,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_dir: PathBuf::from("."),
            log_enabled: true,
            display: DisplayConfig::default(),
            pages: PagesConfig::default(),
            sensors: SensorsConfig::default(),
            indicators: HashMap::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PagesConfig {
    /// How long each page stays on screen
    pub page_seconds: u32,
    /// Number of recent samples averaged for the trend baseline
    pub trend_window: usize,
    /// Absolute change below which a trend is flat
    pub trend_threshold: f32,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            page_seconds: 4,
            trend_window: 5,
            trend_threshold: DEFAULT_TREND_THRESHOLD,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SensorsConfig {
    /// Whether a particulate sensor is fitted
    pub particulates: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { particulates: true }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub gauge_max: Option<f32>,
    pub bands: Option<StatusBands>,
}

impl MonitorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }

    pub fn render_period(&self) -> Duration {
        Duration::from_millis(self.render_period_ms)
    }

    pub fn display_size(&self) -> Size {
        Size::new(self.display.width, self.display.height)
    }

    /// Built-in indicators with the configured overrides applied.
    pub fn indicators(&self) -> Indicators {
        let mut indicators = Indicators::default();
        for (&field, overrides) in &self.indicators {
            let indicator = indicators.get_mut(field);
            if let Some(gauge_max) = overrides.gauge_max {
                indicator.gauge_max = gauge_max;
            }
            if let Some(bands) = &overrides.bands {
                indicator.bands = bands.clone();
            }
        }
        indicators
    }
}
