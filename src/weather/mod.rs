//! # Weather Module
//!
//! Current-conditions aggregation over decoded ISS readings.
//!
//! This module handles:
//! - Instantaneous fields (wind, gust, temperature, humidity, solar, UV, capacitor)
//! - Rain counter warm-up and wraparound, daily rain total
//! - Rain rate from tip intervals, with staleness decay
//! - Circular wind direction average
//! - Dew point and wind chill with sanity checks

pub mod aggregator;
pub mod derived;
pub mod rain;
pub mod state;
pub mod wind;

pub use aggregator::{ApplyOutcome, RainUpdate, StateWarning, WeatherAggregator};
pub use state::{WeatherSnapshot, WeatherState};
