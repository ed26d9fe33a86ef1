//! Pacing strategies.
//!
//! A strategy never touches the host directly. Host frames and animation
//! frames produce a [`Decision`], timer firings produce a [`Wake`], and the
//! scheduler context carries them out (including re-arming the unthrottled
//! frame pump on [`Decision::Defer`]).

mod fixed_fps;
mod forked_fps;
mod max_fps;
pub mod spin;

pub use fixed_fps::{DRIFT_DAMPING, FixedFps, PRECISION_RATIO};
pub use forked_fps::ForkedFps;
pub use max_fps::{FrameGate, MaxFps};

use crate::config::{FramerateConfig, FramerateMode};
use crate::time::Clock;
use spin::CancelToken;

/// Outcome of a host-frame or animation-frame invocation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Decision {
    /// Run the original tick at this timestamp.
    Tick(f64),
    /// Draw only.
    Render,
    /// Too early; keep the unthrottled pump alive and ask again.
    Defer,
    /// Nothing to do; the cadence is driven elsewhere.
    Idle,
}

/// Outcome of a timer firing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Wake {
    /// Run the full original tick, then re-arm the one-shot timer.
    Tick { time: f64, next_in: f64 },
    /// Run a logic-only tick.
    Logic(f64),
    /// Drop this cycle, then re-arm the one-shot timer.
    Skip { next_in: f64 },
    /// The firing does not belong to this strategy.
    Ignore,
}

/// Which of the context's two timer slots fired.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimerSlot {
    Repeating,
    Once,
}

/// Timers a strategy needs armed at install time, as delays in ms.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Arming {
    pub repeating: Option<f64>,
    pub once: Option<f64>,
}

/// Capability shared by every strategy.
pub trait Pacer {
    fn arming(&self) -> Arming {
        Arming::default()
    }

    fn on_invoked(&mut self, time: Option<f64>) -> Decision;

    fn on_timer<C: Clock + ?Sized>(
        &mut self,
        _slot: TimerSlot,
        _clock: &C,
        _cancel: &CancelToken,
    ) -> Wake {
        Wake::Ignore
    }
}

/// The installed strategy. Chosen once per install, never per invocation.
#[derive(Debug)]
pub enum Strategy {
    MaxFps(MaxFps),
    FixedFps(FixedFps),
    ForkedFps(ForkedFps),
}

impl Strategy {
    /// Builds the strategy for `config`, or `None` when pacing is disabled.
    pub fn for_config(config: &FramerateConfig, now: f64) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let limit = config.limit;
        Some(match config.mode {
            FramerateMode::MaxFps => Strategy::MaxFps(MaxFps::new(limit, now)),
            FramerateMode::FixedFps => Strategy::FixedFps(FixedFps::new(limit, now)),
            FramerateMode::ForkedFps => Strategy::ForkedFps(ForkedFps::new(limit, now)),
        })
    }

    pub fn mode(&self) -> FramerateMode {
        match self {
            Strategy::MaxFps(_) => FramerateMode::MaxFps,
            Strategy::FixedFps(_) => FramerateMode::FixedFps,
            Strategy::ForkedFps(_) => FramerateMode::ForkedFps,
        }
    }

    pub fn as_fixed_mut(&mut self) -> Option<&mut FixedFps> {
        match self {
            Strategy::FixedFps(s) => Some(s),
            _ => None,
        }
    }
}

impl Pacer for Strategy {
    fn arming(&self) -> Arming {
        match self {
            Strategy::MaxFps(s) => s.arming(),
            Strategy::FixedFps(s) => s.arming(),
            Strategy::ForkedFps(s) => s.arming(),
        }
    }

    fn on_invoked(&mut self, time: Option<f64>) -> Decision {
        match self {
            Strategy::MaxFps(s) => s.on_invoked(time),
            Strategy::FixedFps(s) => s.on_invoked(time),
            Strategy::ForkedFps(s) => s.on_invoked(time),
        }
    }

    fn on_timer<C: Clock + ?Sized>(
        &mut self,
        slot: TimerSlot,
        clock: &C,
        cancel: &CancelToken,
    ) -> Wake {
        match self {
            Strategy::MaxFps(s) => s.on_timer(slot, clock, cancel),
            Strategy::FixedFps(s) => s.on_timer(slot, clock, cancel),
            Strategy::ForkedFps(s) => s.on_timer(slot, clock, cancel),
        }
    }
}

/// Treats missing or non-finite timestamps as absent.
fn usable_time(time: Option<f64>) -> Option<f64> {
    time.filter(|t| t.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_builds_nothing() {
        let config = FramerateConfig::new(0, FramerateMode::FixedFps);
        assert!(Strategy::for_config(&config, 0.0).is_none());
    }

    #[test]
    fn mode_selects_variant() {
        for mode in FramerateMode::ALL {
            let config = FramerateConfig::new(30, mode);
            let strategy = Strategy::for_config(&config, 0.0).unwrap();
            assert_eq!(strategy.mode(), mode);
        }
    }

    #[test]
    fn arming_per_variant() {
        let build = |mode| Strategy::for_config(&FramerateConfig::new(20, mode), 0.0).unwrap();

        assert_eq!(build(FramerateMode::MaxFps).arming(), Arming::default());
        assert_eq!(
            build(FramerateMode::FixedFps).arming(),
            Arming { repeating: None, once: Some(50.0) }
        );
        assert_eq!(
            build(FramerateMode::ForkedFps).arming(),
            Arming { repeating: Some(50.0), once: None }
        );
    }
}
