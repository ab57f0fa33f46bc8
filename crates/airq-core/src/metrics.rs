//! Status classification and trend assessment for sensor values
//!
//! Each displayed field carries an [`Indicator`]: the gauge full-scale value
//! and a set of [`StatusBands`] that map a reading onto good/warning/bad.

use serde::Deserialize;

use crate::sample::Field;

/// Three-tier status of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Within the comfortable range
    Good,
    /// Worth keeping an eye on
    Warning,
    /// Action needed
    Bad,
}

impl Status {
    /// Get the display label for this status
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Warning => "Warning",
            Self::Bad => "Bad",
        }
    }
}

/// One status band, starting at `from` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Band {
    pub from: f32,
    pub status: Status,
}

impl Band {
    pub const fn new(from: f32, status: Status) -> Self {
        Self { from, status }
    }
}

/// Half-open status intervals `[from_i, from_{i+1})`, the last one
/// open-ended.
///
/// Bands are kept sorted by lower bound. A value below the first bound,
/// or NaN, classifies as [`Status::Bad`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<Band>")]
pub struct StatusBands(Vec<Band>);

impl StatusBands {
    pub fn new(mut bands: Vec<Band>) -> Self {
        bands.sort_by(|a, b| a.from.total_cmp(&b.from));
        Self(bands)
    }

    /// Classify `value`. Total: every input yields exactly one status.
    pub fn classify(&self, value: f32) -> Status {
        self.0
            .iter()
            .rev()
            .find(|band| band.from <= value)
            .map_or(Status::Bad, |band| band.status)
    }

    pub fn bands(&self) -> &[Band] {
        &self.0
    }
}

impl From<Vec<Band>> for StatusBands {
    fn from(bands: Vec<Band>) -> Self {
        Self::new(bands)
    }
}

/// Direction of a value relative to its recent mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Flat,
    Rising,
    Falling,
}

impl Trend {
    /// Compare `current` with `baseline`.
    ///
    /// Differences smaller than `threshold` in either direction are flat.
    pub fn classify(current: f32, baseline: f32, threshold: f32) -> Self {
        let delta = current - baseline;
        if delta.abs() < threshold {
            Self::Flat
        } else if delta > 0.0 {
            Self::Rising
        } else {
            Self::Falling
        }
    }
}

/// Display parameters of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    /// Value at which the gauge bar is full
    pub gauge_max: f32,
    pub bands: StatusBands,
}

impl Indicator {
    /// Built-in indicator for `field`.
    pub fn default_for(field: Field) -> Self {
        use Status::{Bad, Good, Warning};

        let (gauge_max, bands): (f32, &[(f32, Status)]) = match field {
            Field::Temperature => (
                40.0,
                &[(15.0, Warning), (20.0, Good), (24.0, Warning), (28.0, Bad)],
            ),
            Field::Humidity => (
                100.0,
                &[(20.0, Warning), (30.0, Good), (60.0, Warning), (70.0, Bad)],
            ),
            Field::Co2 | Field::Eco2 => (2000.0, &[(0.0, Good), (800.0, Warning), (1200.0, Bad)]),
            Field::Tvoc => (1000.0, &[(0.0, Good), (220.0, Warning), (660.0, Bad)]),
            Field::Pm1 | Field::Pm2_5 => (50.0, &[(0.0, Good), (12.0, Warning), (35.0, Bad)]),
            Field::Pm10 => (200.0, &[(0.0, Good), (54.0, Warning), (154.0, Bad)]),
        };

        Self {
            gauge_max,
            bands: StatusBands::new(
                bands
                    .iter()
                    .map(|&(from, status)| Band::new(from, status))
                    .collect(),
            ),
        }
    }

    pub fn status(&self, value: f32) -> Status {
        self.bands.classify(value)
    }

    /// Fraction of the gauge to fill, clamped into `[0, 1]`.
    pub fn gauge_fraction(&self, value: f32) -> f32 {
        if self.gauge_max.is_nan() || self.gauge_max <= 0.0 || value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, self.gauge_max) / self.gauge_max
    }
}

/// Indicators for every field.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicators([Indicator; Field::COUNT]);

impl Default for Indicators {
    fn default() -> Self {
        Self(Field::ALL.map(Indicator::default_for))
    }
}

impl Indicators {
    pub fn get(&self, field: Field) -> &Indicator {
        &self.0[field.index()]
    }

    pub fn get_mut(&mut self, field: Field) -> &mut Indicator {
        &mut self.0[field.index()]
    }

    pub fn status(&self, field: Field, value: f32) -> Status {
        self.get(field).status(value)
    }
}
