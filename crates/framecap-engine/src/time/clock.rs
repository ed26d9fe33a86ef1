use std::time::{Duration, Instant};

/// Monotonic time source measured in milliseconds.
///
/// Sub-millisecond resolution is expected but not guaranteed. Values are only
/// meaningful relative to other readings of the same clock.
pub trait Clock {
    fn now(&self) -> f64;
}

/// `Instant`-backed clock; readings are milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Converts a reading of this clock back into an `Instant`.
    ///
    /// Negative or non-finite readings map to the clock origin.
    pub fn instant_at(&self, millis: f64) -> Instant {
        if !millis.is_finite() || millis <= 0.0 {
            return self.origin;
        }
        self.origin + Duration::from_secs_f64(millis / 1000.0)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_never_go_backwards() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let now = clock.now();
            assert!(now >= prev);
            prev = now;
        }
    }

    #[test]
    fn instant_at_round_trips_through_origin() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.instant_at(-5.0), clock.origin);
        assert_eq!(clock.instant_at(f64::NAN), clock.origin);
        let later = clock.instant_at(250.0);
        assert_eq!(later.duration_since(clock.origin), Duration::from_millis(250));
    }
}
