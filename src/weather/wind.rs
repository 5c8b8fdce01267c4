//! # Wind Direction Averaging
//!
//! Windowed circular mean over the most recent directions. Each sample is
//! treated as a unit vector so the average wraps correctly at north:
//! 350° and 10° average to 0°, not 180°.

use std::collections::VecDeque;

/// Default number of directions in the averaging window
pub const DEFAULT_WIND_DIRECTION_SAMPLES: usize = 20;

/// Running circular mean of wind direction
#[derive(Debug, Clone)]
pub struct WindDirectionAverage {
    /// (sin, cos) of each direction in the window, oldest first
    samples: VecDeque<(f32, f32)>,
    capacity: usize,
}

impl Default for WindDirectionAverage {
    fn default() -> Self {
        Self::new(DEFAULT_WIND_DIRECTION_SAMPLES)
    }
}

impl WindDirectionAverage {
    /// Create an average over the last `capacity` directions (minimum 1)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a direction in degrees, evicting the oldest when the window is full
    pub fn push(&mut self, direction_deg: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }

        self.samples.push_back(direction_deg.to_radians().sin_cos());
    }

    /// Mean direction in [0, 360), or `None` before the first sample
    ///
    /// Directions that cancel out exactly (e.g. 90° and 270°) have no
    /// meaningful mean; `atan2` still returns a value in that case.
    pub fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }

        let (sum_sin, sum_cos) = self
            .samples
            .iter()
            .fold((0.0f32, 0.0f32), |(s, c), &(sin, cos)| (s + sin, c + cos));

        let degrees = sum_sin.atan2(sum_cos).to_degrees().rem_euclid(360.0);

        // rem_euclid of a tiny negative angle rounds up to exactly 360.0 in f32
        Some(if degrees >= 360.0 { 0.0 } else { degrees })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
