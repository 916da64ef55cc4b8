//! High-resolution timer for frame timing and profiling.

use std::time::{Duration, Instant};

/// High-resolution timer tracking total run time, per-frame delta and a
/// running frame counter.
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Instant,
    frame_index: u64,
}

impl FrameTimer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            frame_index: 0,
        }
    }

    /// Get the total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get the elapsed time in seconds since the timer was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Advance to the next frame and return the time elapsed since the
    /// previous call. This is the per-frame delta for a render loop.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        self.frame_index += 1;
        delta
    }

    /// Advance to the next frame and return the delta in seconds.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }

    /// Number of completed `tick()` calls.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Reset the timer to the current time and restart the frame count.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_tick = now;
        self.frame_index = 0;
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
    fn test_tick_advances_frame_index() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.frame_index(), 0);

        timer.tick();
        timer.tick();
        assert_eq!(timer.frame_index(), 2);
    }

    #[test]
    fn test_reset_clears_frame_index() {
        let mut timer = FrameTimer::new();
        timer.tick();
        timer.reset();
        assert_eq!(timer.frame_index(), 0);
    }

    #[test]
    fn test_delta_is_non_negative() {
        let mut timer = FrameTimer::new();
        assert!(timer.delta_secs() >= 0.0);
        assert!(timer.elapsed_secs() >= 0.0);
    }
}
