//! Bounded busy-waiting.
//!
//! Timers are only accurate to a millisecond or two; the fixed-rate strategy
//! burns the remaining slack in a spin loop instead. Every spin is bounded by
//! an iteration budget and checks a cancellation token on each iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::time::Clock;

/// Budget a fresh strategy starts with.
pub const INITIAL_SPIN_LOOPS: u32 = 2;

/// Hard ceiling for budget growth.
pub const SPIN_LOOP_CEILING: u32 = 32768 * 4;

/// Cooperative cancellation for an in-flight spin.
///
/// Clones share state, so a handle given to another thread can stop a spin
/// the owning context is stuck in.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SpinOutcome {
    /// The requested duration elapsed.
    Reached,
    /// The iteration budget ran out first.
    Exhausted,
    /// The token was cancelled mid-spin.
    Cancelled,
}

/// Adaptive iteration budget.
///
/// Starts tiny and doubles each time a spin runs out of iterations, so slow
/// hosts converge on a budget that covers their per-iteration cost without a
/// calibration pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SpinBudget {
    loops: u32,
}

impl Default for SpinBudget {
    fn default() -> Self {
        Self {
            loops: INITIAL_SPIN_LOOPS,
        }
    }
}

impl SpinBudget {
    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Doubles the budget up to [`SPIN_LOOP_CEILING`]. Returns whether it grew.
    pub fn grow(&mut self) -> bool {
        if self.loops >= SPIN_LOOP_CEILING {
            return false;
        }
        self.loops = self.loops.saturating_mul(2).min(SPIN_LOOP_CEILING);
        true
    }
}

/// Spins until `duration` ms have passed on `clock`, reading the clock at
/// most `max_loops` times.
pub fn spin_for<C: Clock + ?Sized>(
    clock: &C,
    duration: f64,
    max_loops: u32,
    cancel: &CancelToken,
) -> SpinOutcome {
    let start = clock.now();
    let mut now = start;
    let mut loops = 0u32;

    while now - start < duration && loops < max_loops {
        if cancel.is_cancelled() {
            return SpinOutcome::Cancelled;
        }
        std::hint::spin_loop();
        now = clock.now();
        loops += 1;
    }

    if now - start < duration {
        SpinOutcome::Exhausted
    } else {
        SpinOutcome::Reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Clock that advances a fixed step per reading.
    struct StepClock {
        now: Cell<f64>,
        step: f64,
        reads: Cell<u32>,
    }

    impl StepClock {
        fn new(step: f64) -> Self {
            Self {
                now: Cell::new(0.0),
                step,
                reads: Cell::new(0),
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> f64 {
            let t = self.now.get();
            self.now.set(t + self.step);
            self.reads.set(self.reads.get() + 1);
            t
        }
    }

    #[test]
    fn reaches_deadline_within_budget() {
        let clock = StepClock::new(0.25);
        let out = spin_for(&clock, 1.0, 100, &CancelToken::new());
        assert_eq!(out, SpinOutcome::Reached);
        // One read for the start plus four steps of 0.25 ms.
        assert_eq!(clock.reads.get(), 5);
    }

    #[test]
    fn runs_out_of_budget() {
        let clock = StepClock::new(0.1);
        let out = spin_for(&clock, 10.0, 4, &CancelToken::new());
        assert_eq!(out, SpinOutcome::Exhausted);
        assert_eq!(clock.reads.get(), 5);
    }

    #[test]
    fn non_positive_duration_returns_immediately() {
        let clock = StepClock::new(0.1);
        assert_eq!(spin_for(&clock, 0.0, 4, &CancelToken::new()), SpinOutcome::Reached);
        assert_eq!(spin_for(&clock, -3.0, 4, &CancelToken::new()), SpinOutcome::Reached);
    }

    #[test]
    fn cancelled_token_stops_spin() {
        let clock = StepClock::new(0.1);
        let token = CancelToken::new();
        token.clone().cancel();
        assert_eq!(spin_for(&clock, 10.0, 1000, &token), SpinOutcome::Cancelled);
        assert_eq!(clock.reads.get(), 1);
    }

    #[test]
    fn budget_doubles_up_to_ceiling() {
        let mut budget = SpinBudget::default();
        assert_eq!(budget.loops(), INITIAL_SPIN_LOOPS);
        assert!(budget.grow());
        assert_eq!(budget.loops(), 4);

        let mut grown = 0;
        while budget.grow() {
            grown += 1;
        }
        assert_eq!(budget.loops(), SPIN_LOOP_CEILING);
        assert_eq!(grown, 15);
        assert!(!budget.grow());
    }
}
