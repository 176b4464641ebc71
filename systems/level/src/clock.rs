use std::time::Duration;

/// Smallest time scale a level may apply.
pub const MIN_TIME_SCALE: f32 = 0.01;

/// Scaled simulation time shared by every scheduler of a level run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationClock {
    now: Duration,
    time_scale: f32,
}

impl SimulationClock {
    /// Creates a clock at time zero running at normal speed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            time_scale: 1.0,
        }
    }

    /// Current simulation time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Multiplier applied to wall-clock steps.
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Advances the clock by `dt` scaled by the current time scale and
    /// returns the new simulation time.
    pub fn advance(&mut self, dt: Duration) -> Duration {
        let scaled = if self.time_scale == 1.0 {
            dt
        } else {
            Duration::try_from_secs_f64(dt.as_secs_f64() * f64::from(self.time_scale))
                .unwrap_or(Duration::MAX)
        };
        self.now = self.now.saturating_add(scaled);
        self.now
    }

    pub(crate) fn apply_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(MIN_TIME_SCALE);
    }

    pub(crate) fn reset_time_scale(&mut self) {
        self.time_scale = 1.0;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_scale_advances_exactly() {
        let mut clock = SimulationClock::new();
        let _ = clock.advance(Duration::from_millis(16));
        let now = clock.advance(Duration::from_millis(17));
        assert_eq!(now, Duration::from_millis(33));
    }

    #[test]
    fn scale_is_clamped_and_applied() {
        let mut clock = SimulationClock::new();
        clock.apply_time_scale(0.0);
        assert!((clock.time_scale() - MIN_TIME_SCALE).abs() < f32::EPSILON);

        clock.apply_time_scale(2.0);
        assert_eq!(clock.advance(Duration::from_millis(500)), Duration::from_secs(1));

        clock.reset_time_scale();
        assert_eq!(clock.advance(Duration::from_secs(1)), Duration::from_secs(2));
    }
}
