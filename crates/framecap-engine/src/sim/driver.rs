use super::{SimEvent, SimHost};
use crate::manager::FpsManager;

/// Delivers every simulated event up to virtual time `end`.
///
/// Returns the number of events delivered.
pub fn run_until(manager: &mut FpsManager<SimHost>, end: f64) -> usize {
    let mut delivered = 0;
    while let Some(event) = manager.host_mut().next_event(end) {
        match event {
            SimEvent::HostFrame(t) => manager.on_host_frame(Some(t)),
            SimEvent::AnimationFrame(t) => manager.on_animation_frame(t),
            SimEvent::Timer(handle) => manager.on_timer(handle),
        }
        delivered += 1;
    }
    delivered
}

/// Runs the simulation for `duration_ms` past the current virtual time.
pub fn run_for(manager: &mut FpsManager<SimHost>, duration_ms: f64) -> usize {
    let end = manager.host().elapsed() + duration_ms;
    run_until(manager, end)
}
