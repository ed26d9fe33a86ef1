//! Strategy installation and event routing.
//!
//! [`SchedulerContext`] owns the active strategy, its timer handles and the
//! host's original tick route. It is the only place that talks to the host
//! on a strategy's behalf.

mod context;

pub use context::{SchedulerContext, TimerSet};
