//! Frame timing.
//!
//! The simulation always advances in fixed steps. Host frames of any length
//! feed an accumulator that hands out whole steps.

use std::time::{Duration, Instant};

/// Fixed timestep accumulator.
#[derive(Debug)]
pub struct FixedTimestep {
    /// Simulation step in seconds
    fixed_dt: f32,
    /// Longest host frame accepted, prevents spiral of death
    max_delta: f32,
    /// Most steps handed out per host frame
    max_steps: u32,
    /// Unsimulated time
    accumulator: f32,
    /// Time of last frame start
    last_frame: Instant,
    /// Steps handed out since creation or reset
    total_steps: u64,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl FixedTimestep {
    /// Create an accumulator stepping `fixed_dt` seconds at a time.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(0.001),
            max_delta: 0.25,
            max_steps: 8,
            accumulator: 0.0,
            last_frame: Instant::now(),
            total_steps: 0,
        }
    }

    /// Set the longest host frame accepted.
    #[must_use]
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta.max(self.fixed_dt);
        self
    }

    /// Set the most steps handed out per host frame.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Simulation step in seconds.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Wall-clock time since the previous call, clamped.
    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt.min(self.max_delta)
    }

    /// Accumulate a host frame and return how many fixed steps to run.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, self.max_delta);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < self.max_steps {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind after the step cap: drop the backlog.
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.total_steps += u64::from(count);
        count
    }

    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.fixed_dt).clamp(0.0, 1.0)
    }

    /// Steps handed out since creation or the last reset.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Sleep until `frame_budget` has passed since the last frame start.
    pub fn sleep_remainder(&self, frame_budget: Duration) {
        let elapsed = self.last_frame.elapsed();
        if elapsed < frame_budget {
            std::thread::sleep(frame_budget - elapsed);
        }
    }

    /// Reset timing (call after pause or loading).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.accumulator = 0.0;
        self.total_steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_steps_only() {
        let mut timing = FixedTimestep::new(0.25);

        assert_eq!(timing.accumulate(0.1), 0);
        assert!((timing.alpha() - 0.4).abs() < 1e-5);
        assert_eq!(timing.accumulate(0.2), 1);
        assert!((timing.alpha() - 0.2).abs() < 1e-5);
        assert_eq!(timing.total_steps(), 1);
    }

    #[test]
    fn test_matching_frame_gives_one_step() {
        let mut timing = FixedTimestep::new(0.125);
        for _ in 0..10 {
            assert_eq!(timing.accumulate(0.125), 1);
        }
        assert_eq!(timing.total_steps(), 10);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut timing = FixedTimestep::new(0.125).with_max_delta(0.5).with_max_steps(16);

        assert_eq!(timing.accumulate(10.0), 4);
        assert_eq!(timing.alpha(), 0.0);
    }

    #[test]
    fn test_step_cap_drops_backlog() {
        let mut timing = FixedTimestep::new(0.125).with_max_delta(1.0).with_max_steps(2);

        assert_eq!(timing.accumulate(1.0), 2);
        assert_eq!(timing.alpha(), 0.0);
        assert_eq!(timing.accumulate(0.0), 0);
    }

    #[test]
    fn test_negative_delta_ignored() {
        let mut timing = FixedTimestep::new(0.125);
        assert_eq!(timing.accumulate(-1.0), 0);
        assert_eq!(timing.alpha(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut timing = FixedTimestep::new(0.125);
        timing.accumulate(0.3);
        timing.reset();
        assert_eq!(timing.total_steps(), 0);
        assert_eq!(timing.alpha(), 0.0);
        assert!(timing.delta_time() < 0.25);
    }
}
