use super::spin::{CancelToken, SpinBudget, SpinOutcome, spin_for};
use super::{Arming, Decision, Pacer, TimerSlot, Wake};
use crate::time::Clock;

/// Acceptance tolerance as a fraction of the period.
pub const PRECISION_RATIO: f64 = 0.006;

/// Divisor applied to an overshoot before it is taken off the wait delay.
///
/// Larger values correct drift more slowly but oscillate less.
pub const DRIFT_DAMPING: f64 = 70.0;

/// Fixed-period ticks from an imprecise one-shot timer.
///
/// Three corrections are blended so the cadence converges instead of
/// drifting:
/// - wake-ups within `precision` of the deadline are accepted as-is
/// - late wake-ups shave `overshoot / DRIFT_DAMPING` off the next wait
/// - early wake-ups spin the remaining slack away, growing the spin budget
///   whenever it turns out too small for the host
#[derive(Debug, Clone)]
pub struct FixedFps {
    interval: f64,
    wait_delay: f64,
    precision: f64,
    budget: SpinBudget,
    last_time: f64,
    ignore_next: bool,
    instant_tick: bool,
}

impl FixedFps {
    pub fn new(limit: u32, now: f64) -> Self {
        let interval = 1000.0 / limit.max(1) as f64;
        Self {
            interval,
            wait_delay: interval,
            precision: PRECISION_RATIO * interval,
            budget: SpinBudget::default(),
            last_time: now,
            ignore_next: false,
            instant_tick: false,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Current adaptive delay between an accepted tick and the next wake-up.
    /// Never negative.
    pub fn wait_delay(&self) -> f64 {
        self.wait_delay
    }

    pub fn max_loops(&self) -> u32 {
        self.budget.loops()
    }

    /// Drops the next wake-up without ticking.
    pub fn skip_next_cycle(&mut self) {
        self.ignore_next = true;
    }

    /// Makes the wake-up after the next accepted tick fire immediately.
    pub fn request_instant_tick(&mut self) {
        self.instant_tick = true;
    }

    fn should_tick<C: Clock + ?Sized>(
        &mut self,
        elapsed: f64,
        clock: &C,
        cancel: &CancelToken,
    ) -> bool {
        if self.ignore_next {
            self.ignore_next = false;
            return false;
        }

        let decision_start = clock.now();

        // Clock did not advance (or produced garbage): never stall on it.
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return true;
        }

        if elapsed > self.interval - self.precision {
            let overshoot = elapsed - self.interval + self.precision;
            self.wait_delay = (self.wait_delay - (overshoot / DRIFT_DAMPING).max(0.0)).max(0.0);
            return true;
        }

        let start = clock.now();
        let hang_for = self.interval - elapsed - (start - decision_start);
        let outcome = spin_for(clock, hang_for, self.budget.loops(), cancel);
        if outcome == SpinOutcome::Exhausted && self.budget.grow() {
            log::debug!(
                "fixed-fps: spin budget exhausted, growing to {} loops",
                self.budget.loops()
            );
        }
        true
    }

    fn next_delay(&mut self, tick_duration: f64) -> f64 {
        if self.instant_tick {
            self.instant_tick = false;
            return 0.0;
        }
        let delay = self.wait_delay - tick_duration;
        if delay < 0.0 { self.interval } else { delay }
    }

    fn wake<C: Clock + ?Sized>(&mut self, clock: &C, cancel: &CancelToken) -> Wake {
        let now = clock.now();
        let elapsed = now - self.last_time;

        if !self.should_tick(elapsed, clock, cancel) {
            self.last_time = now;
            return Wake::Skip {
                next_in: self.interval,
            };
        }

        let accepted_at = clock.now();
        self.last_time = accepted_at;
        let tick_duration = accepted_at - now;
        log::trace!("fixed-fps: tick after {elapsed:.3} ms, decision took {tick_duration:.3} ms");

        Wake::Tick {
            time: accepted_at,
            next_in: self.next_delay(tick_duration),
        }
    }
}

impl Pacer for FixedFps {
    fn arming(&self) -> Arming {
        Arming {
            repeating: None,
            once: Some(self.interval),
        }
    }

    /// Host frames carry no cadence here; the one-shot timer drives ticks.
    fn on_invoked(&mut self, _time: Option<f64>) -> Decision {
        Decision::Idle
    }

    fn on_timer<C: Clock + ?Sized>(
        &mut self,
        slot: TimerSlot,
        clock: &C,
        cancel: &CancelToken,
    ) -> Wake {
        match slot {
            TimerSlot::Once => self.wake(clock, cancel),
            TimerSlot::Repeating => Wake::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Manually driven clock; every reading costs `step` ms.
    struct TestClock {
        now: Cell<f64>,
        step: f64,
    }

    impl TestClock {
        fn new(step: f64) -> Self {
            Self {
                now: Cell::new(0.0),
                step,
            }
        }

        fn set(&self, t: f64) {
            self.now.set(t);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> f64 {
            let t = self.now.get();
            self.now.set(t + self.step);
            t
        }
    }

    fn wake(s: &mut FixedFps, clock: &TestClock) -> Wake {
        s.on_timer(TimerSlot::Once, clock, &CancelToken::new())
    }

    #[test]
    fn derived_constants() {
        let s = FixedFps::new(10, 0.0);
        assert_eq!(s.interval(), 100.0);
        assert_eq!(s.wait_delay(), 100.0);
        assert!((s.precision() - 0.6).abs() < 1e-12);
        assert_eq!(s.max_loops(), 2);
        assert_eq!(s.arming().once, Some(100.0));
    }

    #[test]
    fn host_frames_are_absorbed() {
        let mut s = FixedFps::new(10, 0.0);
        assert_eq!(s.on_invoked(Some(500.0)), Decision::Idle);
    }

    #[test]
    fn on_time_wake_ticks_and_corrects_drift() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 0.0);

        clock.set(100.0);
        let Wake::Tick { time, next_in } = wake(&mut s, &clock) else {
            panic!("expected a tick");
        };
        assert_eq!(time, 100.0);
        // overshoot = 100 - 100 + 0.6
        let expected = 100.0 - 0.6 / DRIFT_DAMPING;
        assert!((s.wait_delay() - expected).abs() < 1e-9);
        assert!((next_in - expected).abs() < 1e-9);
    }

    #[test]
    fn late_wake_shrinks_wait_delay_proportionally() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 0.0);

        clock.set(107.0);
        assert!(matches!(wake(&mut s, &clock), Wake::Tick { .. }));
        let expected = 100.0 - 7.6 / DRIFT_DAMPING;
        assert!((s.wait_delay() - expected).abs() < 1e-9);
    }

    #[test]
    fn early_wake_spins_to_deadline() {
        let clock = TestClock::new(0.01);
        let mut s = FixedFps::new(10, 0.0);
        // Large enough budget for a 3 ms spin at 0.01 ms per read.
        for _ in 0..10 {
            s.budget.grow();
        }

        clock.set(97.0);
        let Wake::Tick { time, next_in } = wake(&mut s, &clock) else {
            panic!("expected a tick");
        };
        assert!(time >= 99.99 && time < 100.1, "tick at {time}");
        // Spin time is taken off the next wait.
        assert!(next_in < 98.0 && next_in > 96.0, "next_in {next_in}");
        assert_eq!(s.wait_delay(), 100.0);
    }

    #[test]
    fn exhausted_spin_grows_budget_and_still_ticks() {
        let clock = TestClock::new(0.01);
        let mut s = FixedFps::new(10, 0.0);

        clock.set(90.0);
        assert!(matches!(wake(&mut s, &clock), Wake::Tick { .. }));
        assert_eq!(s.max_loops(), 4);
    }

    #[test]
    fn clock_not_advancing_accepts_immediately() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 50.0);

        clock.set(50.0);
        let Wake::Tick { time, next_in } = wake(&mut s, &clock) else {
            panic!("expected a tick");
        };
        assert_eq!(time, 50.0);
        assert_eq!(next_in, 100.0);
        assert_eq!(s.max_loops(), 2);
    }

    #[test]
    fn negative_delay_falls_back_to_interval() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 0.0);
        s.wait_delay = -5.0;

        clock.set(100.0);
        let Wake::Tick { next_in, .. } = wake(&mut s, &clock) else {
            panic!("expected a tick");
        };
        assert_eq!(next_in, 100.0);
    }

    #[test]
    fn drift_correction_never_drives_wait_delay_negative() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(100, 0.0);

        for t in [1000.0, 3000.0, 6000.0] {
            clock.set(t);
            assert!(matches!(wake(&mut s, &clock), Wake::Tick { .. }));
        }
        assert_eq!(s.wait_delay(), 0.0);
    }

    #[test]
    fn skip_next_cycle_absorbs_one_wake() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 0.0);
        s.skip_next_cycle();

        clock.set(100.0);
        assert_eq!(wake(&mut s, &clock), Wake::Skip { next_in: 100.0 });
        // Skipped cycle does not count as an overshoot on the next one.
        clock.set(200.0);
        assert!(matches!(wake(&mut s, &clock), Wake::Tick { .. }));
        assert!(s.wait_delay() > 99.99);
    }

    #[test]
    fn instant_tick_rearms_with_zero_delay_once() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 0.0);
        s.request_instant_tick();

        clock.set(100.0);
        let Wake::Tick { next_in, .. } = wake(&mut s, &clock) else {
            panic!("expected a tick");
        };
        assert_eq!(next_in, 0.0);

        clock.set(200.0);
        let Wake::Tick { next_in, .. } = wake(&mut s, &clock) else {
            panic!("expected a tick");
        };
        assert!(next_in > 0.0);
    }

    #[test]
    fn cancelled_spin_still_accepts() {
        let clock = TestClock::new(0.01);
        let mut s = FixedFps::new(10, 0.0);
        let token = CancelToken::new();
        token.cancel();

        clock.set(50.0);
        let wake = s.on_timer(TimerSlot::Once, &clock, &token);
        let Wake::Tick { time, .. } = wake else {
            panic!("expected a tick");
        };
        assert!(time < 51.0, "cancelled spin must not wait, ticked at {time}");
        assert_eq!(s.max_loops(), 2);
    }

    #[test]
    fn repeating_slot_is_not_ours() {
        let clock = TestClock::new(0.0);
        let mut s = FixedFps::new(10, 0.0);
        let out = s.on_timer(TimerSlot::Repeating, &clock, &CancelToken::new());
        assert_eq!(out, Wake::Ignore);
    }
}
