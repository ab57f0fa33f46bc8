//! The composite sample record and its per-field projection.

use core::fmt::Display;

use serde::Deserialize;

use crate::sensors::{ClimateReadings, ParticulateReadings, VocReadings};

/// One synchronized set of sensor readings.
///
/// Produced only by the acquisition loop and never mutated once stored.
/// `timestamp` comes from the climate sensor read and is in seconds since
/// the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Temperature in °C
    pub temperature: f32,
    /// Relative humidity in %RH
    pub humidity: f32,
    /// CO2 concentration in ppm
    pub co2: u16,
    /// Total volatile organic compounds in ppb
    pub tvoc: u16,
    /// Equivalent CO2 in ppm
    pub eco2: u16,
    /// Particulate concentrations, absent when no particulate sensor is fitted
    pub particulates: Option<ParticulateReadings>,
    /// Capture time, seconds since epoch
    pub timestamp: f64,
}

impl Sample {
    /// Assemble a sample from the three sensor reads of one cycle.
    pub fn from_readings(
        voc: VocReadings,
        climate: ClimateReadings,
        particulates: Option<ParticulateReadings>,
    ) -> Self {
        Self {
            temperature: climate.temperature,
            humidity: climate.humidity,
            co2: climate.co2,
            tvoc: voc.tvoc,
            eco2: voc.eco2,
            particulates,
            timestamp: climate.timestamp,
        }
    }

    /// Project a single field out of this sample.
    pub fn value(&self, field: Field) -> Option<f32> {
        field.of(self)
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Sample] timestamp: {:.3}, temperature: {:.2}°C, humidity: {:.2}%, co2: {} ppm, tvoc: {} ppb, eco2: {} ppm",
            self.timestamp, self.temperature, self.humidity, self.co2, self.tvoc, self.eco2
        )?;
        if let Some(pm) = self.particulates {
            write!(
                f,
                ", pm1: {:.1}, pm2.5: {:.1}, pm10: {:.1} µg/m³",
                pm.pm1, pm.pm2_5, pm.pm10
            )?;
        }
        Ok(())
    }
}

/// Every measured field of a [`Sample`].
///
/// Deserializes from the log column name (`co2`, `pm2_5`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    Humidity,
    Co2,
    Tvoc,
    Eco2,
    Pm1,
    Pm2_5,
    Pm10,
}

impl Field {
    /// All fields in log column order.
    pub const ALL: [Field; 8] = [
        Field::Temperature,
        Field::Humidity,
        Field::Co2,
        Field::Tvoc,
        Field::Eco2,
        Field::Pm1,
        Field::Pm2_5,
        Field::Pm10,
    ];

    /// Number of fields.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this field in [`Field::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Temperature => 0,
            Self::Humidity => 1,
            Self::Co2 => 2,
            Self::Tvoc => 3,
            Self::Eco2 => 4,
            Self::Pm1 => 5,
            Self::Pm2_5 => 6,
            Self::Pm10 => 7,
        }
    }

    /// Read this field from a sample.
    ///
    /// Particulate fields are `None` when the sample carries no particulate
    /// reading.
    pub fn of(self, sample: &Sample) -> Option<f32> {
        match self {
            Self::Temperature => Some(sample.temperature),
            Self::Humidity => Some(sample.humidity),
            Self::Co2 => Some(f32::from(sample.co2)),
            Self::Tvoc => Some(f32::from(sample.tvoc)),
            Self::Eco2 => Some(f32::from(sample.eco2)),
            Self::Pm1 => sample.particulates.map(|pm| pm.pm1),
            Self::Pm2_5 => sample.particulates.map(|pm| pm.pm2_5),
            Self::Pm10 => sample.particulates.map(|pm| pm.pm10),
        }
    }

    /// Short label for the display
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "TEMP",
            Self::Humidity => "HUMID",
            Self::Co2 => "CO2",
            Self::Tvoc => "TVOC",
            Self::Eco2 => "eCO2",
            Self::Pm1 => "PM1.0",
            Self::Pm2_5 => "PM2.5",
            Self::Pm10 => "PM10",
        }
    }

    /// Unit suffix for the display
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "C",
            Self::Humidity => "%",
            Self::Co2 | Self::Eco2 => "PPM",
            Self::Tvoc => "PPB",
            Self::Pm1 | Self::Pm2_5 | Self::Pm10 => "UG/M3",
        }
    }

    /// Column name in the durable log
    pub const fn column(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Co2 => "co2",
            Self::Tvoc => "tvoc",
            Self::Eco2 => "eco2",
            Self::Pm1 => "pm1",
            Self::Pm2_5 => "pm2_5",
            Self::Pm10 => "pm10",
        }
    }

    /// Whether the field comes from the particulate sensor.
    pub const fn is_particulate(self) -> bool {
        matches!(self, Self::Pm1 | Self::Pm2_5 | Self::Pm10)
    }

    /// Number of decimals shown on the display.
    pub const fn decimals(self) -> usize {
        match self {
            Self::Temperature | Self::Humidity | Self::Pm1 | Self::Pm2_5 | Self::Pm10 => 1,
            Self::Co2 | Self::Tvoc | Self::Eco2 => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_at;

    #[test]
    fn test_field_indices_match_order() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_particulate_projection_absent_without_reading() {
        let mut sample = sample_at(10.0);
        sample.particulates = None;

        assert_eq!(Field::Pm2_5.of(&sample), None);
        assert_eq!(Field::Co2.of(&sample), Some(f32::from(sample.co2)));
    }

    #[test]
    fn test_from_readings_takes_climate_timestamp() {
        let sample = Sample::from_readings(
            VocReadings { eco2: 410, tvoc: 12 },
            ClimateReadings {
                co2: 650,
                temperature: 22.5,
                humidity: 41.0,
                timestamp: 1_700_000_000.5,
            },
            None,
        );

        assert_eq!(sample.timestamp, 1_700_000_000.5);
        assert_eq!(sample.co2, 650);
        assert_eq!(sample.eco2, 410);
        assert_eq!(sample.tvoc, 12);
    }
}
