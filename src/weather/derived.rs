//! # Derived Quantities
//!
//! Physical quantities computed from raw readings.
//!
//! ## Dew Point
//!
//! Magnus approximation with the Sonntag (1990) constants, evaluated in °C:
//!
//! `γ = ln(RH/100) + a·T / (b + T)`, `Td = b·γ / (a − γ)`
//!
//! with `a = 17.62` and `b = 243.12 °C`.
//!
//! ## Wind Chill
//!
//! NWS 2001 formula in °F and mph:
//!
//! `WC = 35.74 + 0.6215·T − 35.75·V^0.16 + 0.4275·T·V^0.16`
//!
//! Only defined for `T ≤ 50 °F` and `V ≥ 3 mph`; otherwise wind chill equals
//! the air temperature.

/// Magnus coefficient (dimensionless)
pub const MAGNUS_A: f32 = 17.62;

/// Magnus coefficient (°C)
pub const MAGNUS_B: f32 = 243.12;

/// Wind chill is only defined at or below this temperature (°F)
pub const WIND_CHILL_MAX_TEMP_F: f32 = 50.0;

/// Wind chill is only defined at or above this wind speed (mph)
pub const WIND_CHILL_MIN_WIND_MPH: f32 = 3.0;

/// Derived temperatures below this (°F) are treated as computation errors
pub const DERIVED_TEMP_FLOOR_F: f32 = -100.0;

/// Barometric readings at or below this (inHg) are rejected
pub const MIN_VALID_PRESSURE_INHG: f32 = 25.0;

/// Inches of mercury per millibar
const INHG_PER_MB: f32 = 0.02953;

pub fn fahrenheit_to_celsius(deg_f: f32) -> f32 {
    (deg_f - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(deg_c: f32) -> f32 {
    deg_c * 9.0 / 5.0 + 32.0
}

/// Dew point in °F from temperature (°F) and relative humidity (%)
///
/// Returns a non-finite value when humidity is not positive; callers treat
/// that the same as an implausible result.
///
/// # Examples
///
/// ```
/// use iss_weather_link::weather::derived::dew_point_f;
///
/// // Saturated air: dew point equals temperature
/// assert!((dew_point_f(68.0, 100.0) - 68.0).abs() < 0.01);
/// ```
pub fn dew_point_f(temp_f: f32, humidity: f32) -> f32 {
    let temp_c = fahrenheit_to_celsius(temp_f);
    let gamma = (humidity / 100.0).ln() + MAGNUS_A * temp_c / (MAGNUS_B + temp_c);
    let dew_c = MAGNUS_B * gamma / (MAGNUS_A - gamma);
    celsius_to_fahrenheit(dew_c)
}

/// Wind chill in °F from temperature (°F) and wind speed (mph)
pub fn wind_chill_f(temp_f: f32, wind_mph: f32) -> f32 {
    if temp_f > WIND_CHILL_MAX_TEMP_F || wind_mph < WIND_CHILL_MIN_WIND_MPH {
        return temp_f;
    }

    let v = wind_mph.powf(0.16);
    35.74 + 0.6215 * temp_f - 35.75 * v + 0.4275 * temp_f * v
}

/// True when a derived temperature can be stored
pub fn is_plausible_temp(deg_f: f32) -> bool {
    deg_f.is_finite() && deg_f >= DERIVED_TEMP_FLOOR_F
}

/// Sea-level pressure in inHg from station pressure (hPa) and elevation (m)
///
/// Rounded to two decimals, which is the resolution the reporting service accepts.
pub fn sea_level_pressure_inhg(station_hpa: f32, elevation_m: f32) -> f32 {
    let sea_level_mb = station_hpa / (1.0 - elevation_m / 44330.0).powf(5.255);
    (sea_level_mb * INHG_PER_MB * 100.0).round() / 100.0
}
