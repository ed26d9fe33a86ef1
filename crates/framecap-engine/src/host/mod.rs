//! Host runtime contracts.
//!
//! The scheduler never owns an event loop. Everything it needs from the host
//! (the tick slot it overrides, deferred timers, an unthrottled frame hook
//! and a clock) is expressed as a trait here, and the host answers by calling
//! back into [`FpsManager`](crate::manager::FpsManager) entry points.

mod discovery;
mod slot;
mod timer;

pub use discovery::HostDiscovery;
pub use slot::{DedupeField, HostTickSlot, TickKind, TickRoute};
pub use timer::{TimerFacility, TimerHandle, TimerQueue};

use crate::time::Clock;

/// Schedules one callback at the next frame opportunity, with no throttling.
///
/// Fire-and-forget: the host answers each accepted request with exactly one
/// `on_animation_frame` call. Hosts may coalesce requests while one is
/// pending; the pending request is tracked by [`DedupeField::Update`].
pub trait AnimationFrameProvider {
    fn request_unlimited_frame(&mut self);
}

/// Everything a pacing strategy can touch.
pub trait Host: Clock + TimerFacility + AnimationFrameProvider + HostTickSlot {}

impl<T> Host for T where T: Clock + TimerFacility + AnimationFrameProvider + HostTickSlot {}
