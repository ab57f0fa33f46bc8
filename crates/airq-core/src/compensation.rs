//! Absolute humidity feedback from the climate sensor into the VOC sensor.
//!
//! The VOC sensor corrects its readings for water vapour when given the
//! absolute humidity in g/m³ as an 8.8 fixed-point number.

/// Magnus coefficients for saturation vapour pressure over water
const MAGNUS_A_HPA: f32 = 6.112;
const MAGNUS_B: f32 = 17.62;
const MAGNUS_C_CELSIUS: f32 = 243.12;

/// Water vapour conversion factor, g·K/J
const VAPOUR_FACTOR: f32 = 2.1674;

const KELVIN_OFFSET: f32 = 273.15;

/// One unit in 8.8 fixed point
const FIXED_POINT_SCALE: f32 = 256.0;

/// Absolute humidity in g/m³ for a temperature (°C) and relative humidity (%RH).
pub fn absolute_humidity(temperature: f32, relative_humidity: f32) -> f32 {
    let pvs = MAGNUS_A_HPA
        * ((MAGNUS_B * temperature) / (MAGNUS_C_CELSIUS + temperature)).exp();
    (relative_humidity * pvs * VAPOUR_FACTOR) / (temperature + KELVIN_OFFSET)
}

/// Absolute humidity encoded as 8.8 fixed point, truncated.
///
/// Out-of-range results saturate at the `u16` bounds (NaN maps to 0).
pub fn absolute_humidity_fixed_point(temperature: f32, relative_humidity: f32) -> u16 {
    // `as` from float saturates and truncates toward zero.
    (absolute_humidity(temperature, relative_humidity) * FIXED_POINT_SCALE) as u16
}
