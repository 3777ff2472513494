//! Animation loop timing.
//!
//! Sprite playback lives outside the simulation; this timer only reports
//! when a looping animation of a given length wraps around, which is all the
//! actor states react to.

use serde::{Deserialize, Serialize};

/// Looping timer reporting loop ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationTimer {
    duration: f32,
    elapsed: f32,
}

impl AnimationTimer {
    const MIN_DURATION: f32 = 1e-3;

    /// Creates a timer for a loop of `duration` seconds.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(Self::MIN_DURATION),
            elapsed: 0.0,
        }
    }

    /// Loop length in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Time into the current loop.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Restarts the current loop.
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }

    /// Advances by `dt` and returns how many loops ended.
    pub fn tick(&mut self, dt: f32) -> u32 {
        self.elapsed += dt.max(0.0);
        let loops = (self.elapsed / self.duration).floor();
        self.elapsed -= loops * self.duration;
        loops as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reports_loop_end() {
        let mut timer = AnimationTimer::new(0.5);
        assert_eq!(timer.tick(0.25), 0);
        assert_eq!(timer.tick(0.25), 1);
        assert!(timer.elapsed() < 1e-6);
    }

    #[test]
    fn test_long_tick_reports_every_loop() {
        let mut timer = AnimationTimer::new(0.5);
        assert_eq!(timer.tick(1.25), 2);
        assert!((timer.elapsed() - 0.25).abs() < 1e-6);

        timer.restart();
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn test_degenerate_duration_terminates() {
        let mut timer = AnimationTimer::new(0.0);
        assert!(timer.duration() > 0.0);
        assert!(timer.tick(-1.0) == 0);
    }

    proptest! {
        #[test]
        fn prop_loops_account_for_all_time(
            duration in 0.05f32..2.0,
            steps in proptest::collection::vec(0.0f32..1.0, 1..32),
        ) {
            let mut timer = AnimationTimer::new(duration);
            let mut loops = 0u32;
            for dt in &steps {
                loops += timer.tick(*dt);
                prop_assert!(timer.elapsed() > -1e-3);
                prop_assert!(timer.elapsed() < duration + 1e-3);
            }

            let total: f32 = steps.iter().sum();
            let accounted = loops as f32 * duration + timer.elapsed();
            prop_assert!((accounted - total).abs() < 1e-2);
        }
    }
}
