//! Frame timing.

use std::time::{Duration, Instant};

/// Longest step handed to the camera and animation; longer stalls (window drags,
/// breakpoints) are clamped so the camera does not jump.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Measures the time between frames and since startup.
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Instant,
    last_delta: Duration,
    frames: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            last_delta: Duration::ZERO,
            frames: 0,
        }
    }

    /// Marks the start of a new frame and returns the clamped time since the previous one.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last_tick).min(MAX_FRAME_DELTA);
        self.last_tick = now;
        self.last_delta = delta;
        self.frames += 1;
        delta
    }

    /// Delta of the most recent tick in seconds
    pub fn delta_secs(&self) -> f32 {
        self.last_delta.as_secs_f32()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_time_since_previous_tick() {
        let mut timer = FrameTimer::new();
        let start = timer.last_tick;
        let delta = timer.tick_at(start + Duration::from_millis(16));
        assert_eq!(delta, Duration::from_millis(16));
        assert!((timer.delta_secs() - 0.016).abs() < 1e-6);
        assert_eq!(timer.frame_count(), 1);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut timer = FrameTimer::new();
        let start = timer.last_tick;
        assert_eq!(timer.tick_at(start + Duration::from_secs(3)), MAX_FRAME_DELTA);
    }
}
