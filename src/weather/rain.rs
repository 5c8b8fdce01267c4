//! # Rain Accumulation
//!
//! The ISS reports rain two ways:
//!
//! - A 7-bit bucket tip counter (0-127, wraps to 0) used for daily totals.
//! - Seconds since the last tip, used for the instantaneous rate.
//!
//! ## Counter warm-up
//!
//! The first counter value ever seen is only a baseline: the counter's
//! absolute value at startup says nothing about rain that fell today. Tips
//! are counted from the second sample on.
//!
//! ```
//! use iss_weather_link::weather::rain::RainCounter;
//!
//! let mut counter = RainCounter::default();
//! assert_eq!(counter.observe(50), None);    // baseline
//! assert_eq!(counter.observe(50), Some(0)); // no rain
//! assert_eq!(counter.observe(53), Some(3)); // 3 tips = 0.03"
//! ```

use crate::iss::protocol::{RAIN_COUNTER_MAX, RAIN_PER_TIP_INCHES};

/// Rain rate is undefined once the last tip is this old (seconds)
pub const RAIN_RATE_STALE_SECONDS: f32 = 15.0 * 60.0;

/// Counter modulus (values 0-127)
const RAIN_COUNTER_MODULUS: u16 = RAIN_COUNTER_MAX as u16 + 1;

/// Bucket tip counter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RainCounter {
    /// No counter value received since startup
    #[default]
    Unseen,

    /// Last counter value and how many samples have been observed
    Seen { previous: u8, samples: u32 },
}

impl RainCounter {
    /// Feed a new counter value
    ///
    /// # Returns
    ///
    /// * `None` - First sample; recorded as the baseline only
    /// * `Some(tips)` - Bucket tips since the previous sample (0 when unchanged)
    pub fn observe(&mut self, value: u8) -> Option<u8> {
        match *self {
            RainCounter::Unseen => {
                *self = RainCounter::Seen { previous: value, samples: 1 };
                None
            }
            RainCounter::Seen { previous, samples } => {
                let tips = tip_delta(previous, value);
                *self = RainCounter::Seen {
                    previous: value,
                    samples: samples.saturating_add(1),
                };
                Some(tips)
            }
        }
    }

    /// Last counter value, if any
    pub fn previous(&self) -> Option<u8> {
        match self {
            RainCounter::Unseen => None,
            RainCounter::Seen { previous, .. } => Some(*previous),
        }
    }

    /// Number of counter samples observed
    pub fn samples(&self) -> u32 {
        match self {
            RainCounter::Unseen => 0,
            RainCounter::Seen { samples, .. } => *samples,
        }
    }
}

/// Tips between two counter values, modulo 128
///
/// # Examples
///
/// ```
/// use iss_weather_link::weather::rain::tip_delta;
///
/// assert_eq!(tip_delta(126, 2), 4);
/// ```
pub fn tip_delta(previous: u8, current: u8) -> u8 {
    let delta = (current as u16 + RAIN_COUNTER_MODULUS - previous as u16) % RAIN_COUNTER_MODULUS;
    delta as u8
}

/// Convert bucket tips to inches
pub fn tips_to_inches(tips: u32) -> f32 {
    tips as f32 * RAIN_PER_TIP_INCHES
}

/// Rain rate in inches/hour from the seconds since the last tip
///
/// One tip in `s` seconds is `0.01 × 3600 / s` in/hr. Intervals of 15
/// minutes or more are too old to extrapolate and give 0.
pub fn rain_rate_from_interval(seconds: f32) -> f32 {
    if seconds <= 0.0 || seconds >= RAIN_RATE_STALE_SECONDS {
        return 0.0;
    }
    RAIN_PER_TIP_INCHES * 3600.0 / seconds
}
