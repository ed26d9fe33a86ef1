//! Deterministic host simulation.
//!
//! `SimHost` implements every host trait in virtual time so pacing can be
//! exercised without a window or wall clock:
//! - reading the clock costs a configurable amount of virtual time, so spin
//!   loops make progress
//! - timers fire with seeded jitter around their nominal deadline
//! - host frames land on a vsync grid, either continuously or on request
//! - unthrottled frames land `pump_latency_ms` after being requested
//!
//! [`run_until`] is the event loop.

mod driver;
mod host;
mod jitter;

pub use driver::{run_for, run_until};
pub use host::{SimEvent, SimHost, TickRecord};

use crate::host::TickRoute;

/// How the simulated runtime schedules its own frames.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameDriving {
    /// Every vsync boundary invokes the tick slot.
    Continuous,
    /// Only the boundary after an original tick requested a frame.
    OnRequest,
}

/// Smallest allowed pump latency; zero would spin the loop in place.
pub const MIN_PUMP_LATENCY_MS: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub frame_period_ms: f64,
    pub frame_driving: FrameDriving,
    pub pump_latency_ms: f64,
    /// Virtual time consumed by every clock reading.
    pub clock_read_cost_ms: f64,
    /// Timers fire uniformly within `±timer_jitter_ms` of their deadline.
    pub timer_jitter_ms: f64,
    pub seed: u64,
    pub initial_route: TickRoute,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: 1000.0 / 60.0,
            frame_driving: FrameDriving::OnRequest,
            pump_latency_ms: 0.5,
            clock_read_cost_ms: 0.01,
            timer_jitter_ms: 0.0,
            seed: 0x5eed_f00d,
            initial_route: TickRoute::Original,
        }
    }
}

impl SimConfig {
    /// A host invoking its tick slot every `period_ms`, whether asked to or not.
    pub fn continuous(period_ms: f64) -> Self {
        Self {
            frame_period_ms: period_ms,
            frame_driving: FrameDriving::Continuous,
            ..Self::default()
        }
    }

    pub fn with_jitter(mut self, jitter_ms: f64) -> Self {
        self.timer_jitter_ms = jitter_ms;
        self
    }
}
