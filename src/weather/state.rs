//! # Weather State
//!
//! Current conditions as folded from the reading stream. Every field starts
//! as `None` ("no data yet") and only the aggregator can change it.

use serde::Serialize;

use super::rain::{tips_to_inches, RainCounter};
use super::wind::WindDirectionAverage;

/// Current conditions owned by [`super::aggregator::WeatherAggregator`]
#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    pub(crate) wind_speed: Option<f32>,
    pub(crate) wind_direction: Option<f32>,
    pub(crate) wind_gust: Option<f32>,
    pub(crate) outside_temp: Option<f32>,
    pub(crate) humidity: Option<f32>,
    pub(crate) pressure: Option<f32>,
    pub(crate) solar: Option<f32>,
    pub(crate) uv_index: Option<f32>,
    pub(crate) capacitor_volts: Option<f32>,
    pub(crate) battery_low: Option<bool>,

    pub(crate) dew_point: Option<f32>,
    pub(crate) wind_chill: Option<f32>,

    /// Bucket tips since the last daily reset
    pub(crate) rain_today_tips: u32,
    pub(crate) rain_rate: Option<f32>,
    pub(crate) rain_counter: RainCounter,

    pub(crate) wind_direction_avg: WindDirectionAverage,
}

impl WeatherState {
    pub(crate) fn with_wind_samples(samples: usize) -> Self {
        Self {
            wind_direction_avg: WindDirectionAverage::new(samples),
            ..Self::default()
        }
    }

    /// Wind speed in mph
    pub fn wind_speed(&self) -> Option<f32> {
        self.wind_speed
    }

    /// Latest wind direction in degrees
    pub fn wind_direction(&self) -> Option<f32> {
        self.wind_direction
    }

    /// Circular mean of recent wind directions in degrees
    pub fn average_wind_direction(&self) -> Option<f32> {
        self.wind_direction_avg.mean()
    }

    pub fn wind_gust(&self) -> Option<f32> {
        self.wind_gust
    }

    /// Outside temperature in °F
    pub fn outside_temp(&self) -> Option<f32> {
        self.outside_temp
    }

    /// Relative humidity in percent
    pub fn humidity(&self) -> Option<f32> {
        self.humidity
    }

    /// Sea-level pressure in inHg, supplied by the external barometer
    pub fn pressure(&self) -> Option<f32> {
        self.pressure
    }

    /// Solar radiation in W/m²
    pub fn solar(&self) -> Option<f32> {
        self.solar
    }

    pub fn uv_index(&self) -> Option<f32> {
        self.uv_index
    }

    pub fn capacitor_volts(&self) -> Option<f32> {
        self.capacitor_volts
    }

    /// Battery-low flag from the most recent frame
    pub fn transmitter_battery_low(&self) -> Option<bool> {
        self.battery_low
    }

    /// Dew point in °F
    pub fn dew_point(&self) -> Option<f32> {
        self.dew_point
    }

    /// Wind chill in °F
    pub fn wind_chill(&self) -> Option<f32> {
        self.wind_chill
    }

    /// Rain since the last daily reset, in inches
    pub fn rain_today(&self) -> f32 {
        tips_to_inches(self.rain_today_tips)
    }

    pub fn rain_today_tips(&self) -> u32 {
        self.rain_today_tips
    }

    /// Rain rate in inches/hour
    pub fn rain_rate(&self) -> Option<f32> {
        self.rain_rate
    }

    pub fn rain_counter(&self) -> RainCounter {
        self.rain_counter
    }

    pub fn got_temperature_data(&self) -> bool {
        self.outside_temp.is_some()
    }

    pub fn got_humidity_data(&self) -> bool {
        self.humidity.is_some()
    }

    pub fn got_dew_point_data(&self) -> bool {
        self.dew_point.is_some()
    }

    /// Read-only copy for the reporting path
    pub fn snapshot(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            average_wind_direction: self.average_wind_direction(),
            wind_gust: self.wind_gust,
            outside_temp: self.outside_temp,
            humidity: self.humidity,
            pressure: self.pressure,
            solar: self.solar,
            uv_index: self.uv_index,
            capacitor_volts: self.capacitor_volts,
            transmitter_battery_low: self.battery_low,
            dew_point: self.dew_point,
            wind_chill: self.wind_chill,
            rain_today: self.rain_today(),
            rain_rate: self.rain_rate,
            got_temperature_data: self.got_temperature_data(),
            got_humidity_data: self.got_humidity_data(),
            got_dew_point_data: self.got_dew_point_data(),
        }
    }
}

/// Point-in-time view of [`WeatherState`] for uploads and logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub wind_speed: Option<f32>,
    pub wind_direction: Option<f32>,
    pub average_wind_direction: Option<f32>,
    pub wind_gust: Option<f32>,
    pub outside_temp: Option<f32>,
    pub humidity: Option<f32>,
    pub pressure: Option<f32>,
    pub solar: Option<f32>,
    pub uv_index: Option<f32>,
    pub capacitor_volts: Option<f32>,
    pub transmitter_battery_low: Option<bool>,
    pub dew_point: Option<f32>,
    pub wind_chill: Option<f32>,
    pub rain_today: f32,
    pub rain_rate: Option<f32>,
    pub got_temperature_data: bool,
    pub got_humidity_data: bool,
    pub got_dew_point_data: bool,
}
