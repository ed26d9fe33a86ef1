/// Running measurement of how often an event fires.
///
/// Timestamps are milliseconds from any monotonic [`Clock`](super::Clock).
/// The meter keeps only the first/last sample and a count, so it is cheap
/// enough to feed from every tick.
#[derive(Debug, Clone, Default)]
pub struct RateMeter {
    first: Option<f64>,
    last: Option<f64>,
    count: u64,
}

impl RateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every sample recorded so far.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records one occurrence at `time`.
    pub fn record(&mut self, time: f64) {
        if self.first.is_none() {
            self.first = Some(time);
        }
        self.last = Some(time);
        self.count = self.count.wrapping_add(1);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean spacing between recorded samples, in milliseconds.
    ///
    /// Needs at least two samples.
    pub fn average_period(&self) -> Option<f64> {
        let (first, last) = (self.first?, self.last?);
        if self.count < 2 {
            return None;
        }
        Some((last - first) / (self.count - 1) as f64)
    }

    /// Occurrences per second derived from [`average_period`](Self::average_period).
    pub fn rate(&self) -> Option<f64> {
        let period = self.average_period()?;
        if period <= 0.0 {
            return None;
        }
        Some(1000.0 / period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_meter_has_no_rate() {
        let meter = RateMeter::new();
        assert_eq!(meter.count(), 0);
        assert!(meter.average_period().is_none());
        assert!(meter.rate().is_none());
    }

    #[test]
    fn single_sample_has_no_period() {
        let mut meter = RateMeter::new();
        meter.record(10.0);
        assert_eq!(meter.count(), 1);
        assert!(meter.average_period().is_none());
    }

    #[test]
    fn evenly_spaced_samples() {
        let mut meter = RateMeter::new();
        for i in 0..11 {
            meter.record(i as f64 * 50.0);
        }
        assert_eq!(meter.average_period(), Some(50.0));
        assert_eq!(meter.rate(), Some(20.0));
    }

    #[test]
    fn reset_clears_samples() {
        let mut meter = RateMeter::new();
        meter.record(1.0);
        meter.record(2.0);
        meter.reset();
        assert_eq!(meter.count(), 0);
        assert!(meter.average_period().is_none());
    }
}
