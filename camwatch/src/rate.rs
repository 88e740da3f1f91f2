// THEORY:
// The rate monitor turns consecutive frame timestamps into an instantaneous
// frames-per-second figure. It is intentionally unsmoothed: `fps = 1 / dt`.
//
// A zero or negative `dt` (two ticks within one clock step, or a clock that
// went backwards) would produce infinity or NaN. In that case the previous
// estimate is kept instead.

use log::info;
use std::time::Instant;

/// Draws a line of status text onto a frame.
pub trait TextOverlay<F> {
    fn put_status(&mut self, frame: &mut F, text: &str) -> crate::error::Result<()>;
}

/// Seconds elapsed since construction, from a monotonic clock.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// `1 / dt`, or `previous` when `dt` is not positive.
pub fn next_fps(previous: f64, dt_secs: f64) -> f64 {
    if dt_secs > 0.0 { 1.0 / dt_secs } else { previous }
}

pub fn status_line(model: &str, fps: f64) -> String {
    format!("Model: {} | FPS: {:.1}", model, fps)
}

pub struct RateMonitor {
    last_tick: f64,
    fps: f64,
    frames: u64,
    log_interval: u64,
}

impl RateMonitor {
    /// `start_secs` is the reference timestamp for the first tick.
    pub fn new(start_secs: f64, log_interval: u64) -> Self {
        Self {
            last_tick: start_secs,
            fps: 0.0,
            frames: 0,
            log_interval,
        }
    }

    /// Records a frame at `now_secs` and returns the updated estimate.
    pub fn tick(&mut self, now_secs: f64) -> f64 {
        self.fps = next_fps(self.fps, now_secs - self.last_tick);
        self.last_tick = now_secs;
        self.frames += 1;
        if self.log_interval > 0 && self.frames.is_multiple_of(self.log_interval) {
            info!("FPS: {:.1}", self.fps);
        }
        self.fps
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_inverse_of_delta() {
        assert_eq!(next_fps(0.0, 0.5), 2.0);
        assert_eq!(next_fps(7.0, 0.04), 25.0);
    }

    #[test]
    fn non_positive_delta_keeps_previous() {
        assert_eq!(next_fps(12.5, 0.0), 12.5);
        assert_eq!(next_fps(12.5, -0.01), 12.5);
    }

    #[test]
    fn sequence_with_a_stalled_tick_repeats_the_previous_value() {
        let mut monitor = RateMonitor::new(0.0, 30);
        let stamps = [0.1, 0.2, 0.2, 0.45, 0.40];

        let reported: Vec<f64> = stamps.iter().map(|&t| monitor.tick(t)).collect();

        assert!((reported[0] - 10.0).abs() < 1e-9);
        assert!((reported[1] - 10.0).abs() < 1e-9);
        assert_eq!(reported[2], reported[1]);
        assert!((reported[3] - 4.0).abs() < 1e-9);
        assert_eq!(reported[4], reported[3]);
        assert!(reported.iter().all(|f| f.is_finite()));
        assert_eq!(monitor.frames(), 5);
    }

    #[test]
    fn first_tick_at_start_time_stays_zero() {
        let mut monitor = RateMonitor::new(1.0, 30);
        assert_eq!(monitor.tick(1.0), 0.0);
        assert_eq!(monitor.fps(), 0.0);
    }

    #[test]
    fn status_line_format() {
        assert_eq!(status_line("yolov8n.onnx", 29.97), "Model: yolov8n.onnx | FPS: 30.0");
    }

    #[test]
    fn clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now_secs();
        let b = clock.now_secs();
        assert!(b >= a);
    }
}
