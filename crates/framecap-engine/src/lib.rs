//! Framecap engine crate.
//!
//! Frame pacing for a host runtime that owns the main loop. The host exposes a
//! tick slot, a clock, timers and an unthrottled frame pump (see [`host`]);
//! an [`FpsManager`](manager::FpsManager) reroutes the slot through one of the
//! pacing strategies in [`pacing`] and keeps the original tick reachable.

pub mod config;
pub mod host;
pub mod manager;
pub mod pacing;
pub mod scheduler;
pub mod time;

pub mod logging;
pub mod sim;
pub mod window;
