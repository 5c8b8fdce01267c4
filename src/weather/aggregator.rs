//! # Weather Aggregator
//!
//! Folds decoded readings into [`WeatherState`].
//!
//! Instantaneous fields use overwrite semantics, so applying the same
//! reading twice leaves the same state. The rain counter is the exception:
//! it accumulates tips through [`super::rain::RainCounter`].
//!
//! Derived quantities are recomputed only when all of their inputs are
//! present. An implausible result is reported as a [`StateWarning`] and
//! clears the derived field; the raw readings are stored regardless.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::derived::{dew_point_f, is_plausible_temp, wind_chill_f, MIN_VALID_PRESSURE_INHG};
use super::rain::{rain_rate_from_interval, RAIN_RATE_STALE_SECONDS};
use super::state::{WeatherSnapshot, WeatherState};
use crate::iss::protocol::{Payload, Reading, ReadingTag};

/// Derived value that failed its sanity check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateWarning {
    /// Dew point outside the plausible range
    DewPoint { value: f32, temp_f: f32, humidity: f32 },

    /// Wind chill outside the plausible range
    WindChill { value: f32, temp_f: f32, wind_mph: f32 },
}

/// What one `apply` call did, for logging by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// Reading type that was applied
    pub tag: ReadingTag,

    /// Rain counter effect, if this was a counter reading
    pub rain: Option<RainUpdate>,

    /// Derived-quantity problems found while applying
    pub warnings: Vec<StateWarning>,
}

/// Effect of a rain counter reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainUpdate {
    /// First counter value; stored as the baseline
    Baseline { counter: u8 },

    /// Tips added to today's total (may be 0)
    Accumulated { tips: u8 },
}

/// Stateful aggregator over the reading stream
#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    state: WeatherState,

    /// When the last rain-seconds reading arrived
    last_rain_interval_at: Option<Instant>,
}

impl Default for WeatherAggregator {
    fn default() -> Self {
        Self::new(super::wind::DEFAULT_WIND_DIRECTION_SAMPLES)
    }
}

impl WeatherAggregator {
    /// Create an aggregator averaging wind direction over `wind_direction_samples`
    #[must_use]
    pub fn new(wind_direction_samples: usize) -> Self {
        Self {
            state: WeatherState::with_wind_samples(wind_direction_samples),
            last_rain_interval_at: None,
        }
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.state.snapshot()
    }

    /// Apply a decoded reading
    pub fn apply(&mut self, reading: &Reading) -> ApplyOutcome {
        self.apply_at(reading, Instant::now())
    }

    /// Apply a decoded reading received at `now`
    pub fn apply_at(&mut self, reading: &Reading, now: Instant) -> ApplyOutcome {
        let state = &mut self.state;
        let mut outcome = ApplyOutcome {
            tag: reading.payload.tag(),
            rain: None,
            warnings: Vec::new(),
        };

        state.wind_speed = Some(reading.wind_speed_mph);
        state.wind_direction = Some(reading.wind_direction_deg);
        state.wind_direction_avg.push(reading.wind_direction_deg);
        state.battery_low = Some(reading.battery_low);

        match reading.payload {
            Payload::RainCounter(counter) => {
                outcome.rain = Some(match state.rain_counter.observe(counter) {
                    None => {
                        debug!("Rain counter baseline set to {}", counter);
                        RainUpdate::Baseline { counter }
                    }
                    Some(tips) => {
                        state.rain_today_tips += tips as u32;
                        if tips > 0 {
                            debug!("Rain counter {} added {} tips, today {:.2}\"", counter, tips, state.rain_today());
                        }
                        RainUpdate::Accumulated { tips }
                    }
                });
            }
            Payload::RainIntervalSeconds(seconds) => {
                state.rain_rate = Some(rain_rate_from_interval(seconds));
                self.last_rain_interval_at = Some(now);
            }
            Payload::Temperature(temp_f) => {
                state.outside_temp = Some(temp_f);
                Self::update_dew_point(state, &mut outcome.warnings);
            }
            Payload::Humidity(humidity) => {
                state.humidity = Some(humidity);
                Self::update_dew_point(state, &mut outcome.warnings);
            }
            Payload::WindGust(mph) => state.wind_gust = Some(mph),
            Payload::CapacitorVolts(volts) => state.capacitor_volts = Some(volts),
            Payload::SolarRadiation(watts) => state.solar = Some(watts),
            Payload::UvIndex(index) => state.uv_index = Some(index),
        }

        // Wind speed arrives in every frame, so wind chill follows every update
        Self::update_wind_chill(state, &mut outcome.warnings);

        outcome
    }

    fn update_dew_point(state: &mut WeatherState, warnings: &mut Vec<StateWarning>) {
        let (Some(temp_f), Some(humidity)) = (state.outside_temp, state.humidity) else {
            return;
        };

        let value = dew_point_f(temp_f, humidity);
        if is_plausible_temp(value) {
            state.dew_point = Some(value);
        } else {
            warn!("Invalid dew point {} from temp={} and humidity={}", value, temp_f, humidity);
            state.dew_point = None;
            warnings.push(StateWarning::DewPoint { value, temp_f, humidity });
        }
    }

    fn update_wind_chill(state: &mut WeatherState, warnings: &mut Vec<StateWarning>) {
        let (Some(temp_f), Some(wind_mph)) = (state.outside_temp, state.wind_speed) else {
            return;
        };

        let value = wind_chill_f(temp_f, wind_mph);
        if is_plausible_temp(value) {
            state.wind_chill = Some(value);
        } else {
            warn!("Invalid wind chill {} from temp={} and wind={}", value, temp_f, wind_mph);
            state.wind_chill = None;
            warnings.push(StateWarning::WindChill { value, temp_f, wind_mph });
        }
    }

    /// Zero the rain rate when no rain-seconds reading arrived for 15 minutes
    ///
    /// # Returns
    ///
    /// * `bool` - True if the rate was reset by this call
    pub fn decay_rain_rate(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_rain_interval_at else {
            return false;
        };

        let stale = Duration::from_secs_f32(RAIN_RATE_STALE_SECONDS);
        let is_stale = now.saturating_duration_since(last) >= stale;
        if is_stale && self.state.rain_rate.is_some_and(|rate| rate > 0.0) {
            debug!("No rain interval for {:?}, rain rate reset", stale);
            self.state.rain_rate = Some(0.0);
            return true;
        }
        false
    }

    /// Store a barometric reading from the external sensor
    ///
    /// # Returns
    ///
    /// * `bool` - False if the reading was rejected and the previous value kept
    pub fn set_pressure(&mut self, pressure_inhg: f32) -> bool {
        if !pressure_inhg.is_finite() || pressure_inhg <= MIN_VALID_PRESSURE_INHG {
            warn!("Rejected pressure reading {} inHg", pressure_inhg);
            return false;
        }
        self.state.pressure = Some(pressure_inhg);
        true
    }

    /// Start a new day: clear today's rain total
    ///
    /// The counter baseline is kept so the first tip after midnight still counts.
    pub fn reset_daily(&mut self) {
        debug!("Daily reset, rain today was {:.2}\"", self.state.rain_today());
        self.state.rain_today_tips = 0;
    }
}
