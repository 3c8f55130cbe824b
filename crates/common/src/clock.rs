//! Timestamp and timing utilities.
//!
//! Pointer events carry host-supplied timestamps in fractional
//! milliseconds. Nothing in the pipeline reads a wall clock; every duration
//! and velocity is derived from event timestamps so replays are
//! deterministic.

/// Milliseconds on the input source's monotonic clock.
pub type Timestamp = f64;

/// Convert milliseconds to seconds.
pub fn ms_to_secs(ms: Timestamp) -> f64 {
    ms / 1_000.0
}

/// Elapsed milliseconds between two timestamps. Never negative, so an
/// out-of-order sample reads as "no time passed".
pub fn elapsed_ms(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).max(0.0)
}

/// Minimum-interval gate for event sampling.
#[derive(Debug, Clone)]
pub struct RateController {
    interval_ms: f64,
    last_tick: Option<Timestamp>,
}

impl RateController {
    /// Create a controller that lets one tick through per `interval_ms`.
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            last_tick: None,
        }
    }

    /// Create a controller targeting the given Hz rate.
    pub fn from_hz(target_hz: u32) -> Self {
        Self::new(1_000.0 / target_hz.max(1) as f64)
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, now: Timestamp) -> bool {
        match self.last_tick {
            None => {
                self.last_tick = Some(now);
                true
            }
            Some(last) if now >= last + self.interval_ms => {
                self.last_tick = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Target interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Forget the last tick so the next call passes.
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}
