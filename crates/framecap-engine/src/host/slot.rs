use crate::config::FramerateMode;

/// Which callback currently occupies the host's tick slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickRoute {
    /// The host's own, unwrapped tick.
    Original,
    /// A pacing strategy sits in front of the original tick.
    Paced(FramerateMode),
}

/// Flavor of an original-tick invocation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickKind {
    /// Update and draw.
    Full,
    /// Logic-only update; drawing is left to a separate `render()` call.
    SkipRender,
}

/// Host-internal frame-request bookkeeping ids.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DedupeField {
    /// Pending regular frame request (issued by the original tick).
    Render,
    /// Pending unthrottled frame request (issued by the pacing pump).
    Update,
}

/// The mutable tick slot of a host runtime.
pub trait HostTickSlot {
    fn tick_route(&self) -> TickRoute;

    fn set_tick_route(&mut self, route: TickRoute);

    /// Runs the host's original tick. `time` is never lower than the time
    /// passed to the previous call.
    fn tick(&mut self, time: f64, kind: TickKind);

    /// Draws a frame without advancing host state.
    fn render(&mut self);

    /// Sets a dedupe id back to "unset" so the next request is not suppressed
    /// by a stale pending one.
    fn reset_dedupe(&mut self, field: DedupeField);
}
