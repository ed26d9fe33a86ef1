//! Time subsystem.
//!
//! Provides the monotonic clock abstraction used by every pacing strategy,
//! plus a small rate meter for observing the cadence a host actually achieves.
//! Intended usage:
//! - hosts implement (or wrap) a [`Clock`]; [`MonotonicClock`] covers native hosts
//! - call `RateMeter::record()` once per delivered tick to track the achieved rate

mod clock;
mod rate_meter;

pub use clock::{Clock, MonotonicClock};
pub use rate_meter::RateMeter;
