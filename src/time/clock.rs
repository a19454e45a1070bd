use hifitime::{Duration, Epoch};
use serde::{Deserialize, Serialize};

/// Largest offset, either side of now, the clock can be moved to.
pub const MAX_OFFSET_HOURS: f64 = 12.0;

/// Simulated hours that pass per real second while animating.
pub const ANIMATION_RATE: f64 = 0.5;

/// A time cursor expressed as an offset from wall-clock now.
///
/// The clock is a plain value. Calculators receive the instant it resolves
/// to and never hold on to the clock itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    offset_hours: f64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset_hours: f64) -> Self {
        let mut clock = Self::new();
        clock.set_offset(offset_hours);
        clock
    }

    pub fn offset_hours(&self) -> f64 {
        self.offset_hours
    }

    /// Scrubber input. Values outside ±12 h are clamped.
    pub fn set_offset(&mut self, offset_hours: f64) {
        self.offset_hours = if offset_hours.is_finite() {
            offset_hours.clamp(-MAX_OFFSET_HOURS, MAX_OFFSET_HOURS)
        } else {
            0.0
        };
    }

    pub fn step(&mut self, delta_hours: f64) {
        self.set_offset(self.offset_hours + delta_hours);
    }

    pub fn reset(&mut self) {
        self.offset_hours = 0.0;
    }

    /// Animation input: moves forward by `real_seconds * 0.5` hours and
    /// wraps back to -12 h once past +12 h.
    pub fn advance(&mut self, real_seconds: f64) {
        let next = self.offset_hours + real_seconds.max(0.0) * ANIMATION_RATE;
        self.offset_hours = if next > MAX_OFFSET_HOURS {
            -MAX_OFFSET_HOURS
        } else {
            next
        };
    }

    /// The simulated instant for a given wall-clock time.
    pub fn resolve(&self, wall_clock: Epoch) -> Epoch {
        wall_clock + Duration::from_seconds(self.offset_hours * 3600.0)
    }

    pub fn now(&self) -> crate::Result<Epoch> {
        Ok(self.resolve(Epoch::now()?))
    }
}
