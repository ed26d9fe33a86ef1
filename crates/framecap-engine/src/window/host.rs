use winit::window::Window;

use crate::host::{
    AnimationFrameProvider, DedupeField, HostTickSlot, TickKind, TickRoute, TimerFacility,
    TimerHandle, TimerQueue,
};
use crate::time::{Clock, MonotonicClock, RateMeter};

/// Host runtime backed by a `winit` window and the wall clock.
///
/// Redraw requests play the role of host frames; the unthrottled pump is
/// serviced from `about_to_wait` with the event loop in `Poll`.
#[derive(Debug)]
pub struct WindowHost {
    clock: MonotonicClock,
    timers: TimerQueue,
    window: Option<Window>,
    route: TickRoute,

    redraw_pending: bool,
    pump_pending: bool,

    ticks: RateMeter,
    draws: RateMeter,
}

impl WindowHost {
    pub fn new() -> Self {
        Self {
            clock: MonotonicClock::new(),
            timers: TimerQueue::new(),
            window: None,
            route: TickRoute::Original,
            redraw_pending: false,
            pump_pending: false,
            ticks: RateMeter::new(),
            draws: RateMeter::new(),
        }
    }

    pub fn clock(&self) -> &MonotonicClock {
        &self.clock
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    /// Hands the host its window and starts the host's own frame loop.
    pub fn attach_window(&mut self, window: Window) {
        self.window = Some(window);
        self.redraw_pending = false;
        self.request_redraw();
    }

    pub fn detach_window(&mut self) -> Option<Window> {
        self.redraw_pending = false;
        self.window.take()
    }

    /// Called when the window delivers `RedrawRequested`.
    pub fn redraw_delivered(&mut self) {
        self.redraw_pending = false;
    }

    /// Consumes a pending unthrottled-frame request.
    pub fn take_pump(&mut self) -> bool {
        std::mem::take(&mut self.pump_pending)
    }

    pub fn pump_pending(&self) -> bool {
        self.pump_pending
    }

    pub fn pop_due_timer(&mut self, now: f64) -> Option<TimerHandle> {
        self.timers.pop_due(now)
    }

    pub fn next_timer_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Tick and draw rates since the previous call, then starts a new window.
    pub fn take_rates(&mut self) -> (Option<f64>, Option<f64>) {
        let rates = (self.ticks.rate(), self.draws.rate());
        self.ticks.reset();
        self.draws.reset();
        rates
    }

    fn request_redraw(&mut self) {
        if self.redraw_pending {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
            self.redraw_pending = true;
        }
    }
}

impl Default for WindowHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WindowHost {
    fn now(&self) -> f64 {
        self.clock.now()
    }
}

impl TimerFacility for WindowHost {
    fn schedule_once(&mut self, delay_ms: f64) -> TimerHandle {
        let now = self.clock.now();
        self.timers.schedule_once(now, delay_ms)
    }

    fn schedule_repeating(&mut self, interval_ms: f64) -> TimerHandle {
        let now = self.clock.now();
        self.timers.schedule_repeating(now, interval_ms)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

impl AnimationFrameProvider for WindowHost {
    fn request_unlimited_frame(&mut self) {
        self.pump_pending = true;
    }
}

impl HostTickSlot for WindowHost {
    fn tick_route(&self) -> TickRoute {
        self.route
    }

    fn set_tick_route(&mut self, route: TickRoute) {
        self.route = route;
    }

    fn tick(&mut self, time: f64, kind: TickKind) {
        self.ticks.record(time);
        if kind == TickKind::Full {
            self.draws.record(time);
        }
        self.request_redraw();
    }

    fn render(&mut self) {
        let now = self.clock.now();
        self.draws.record(now);
    }

    fn reset_dedupe(&mut self, field: DedupeField) {
        match field {
            DedupeField::Render => self.redraw_pending = false,
            DedupeField::Update => self.pump_pending = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_requests_collapse_into_one() {
        let mut host = WindowHost::new();
        host.request_unlimited_frame();
        host.request_unlimited_frame();
        assert!(host.take_pump());
        assert!(!host.take_pump());
    }

    #[test]
    fn reset_dedupe_drops_pending_pump() {
        let mut host = WindowHost::new();
        host.request_unlimited_frame();
        host.reset_dedupe(DedupeField::Update);
        assert!(!host.pump_pending());
    }

    #[test]
    fn timers_run_on_the_wall_clock() {
        let mut host = WindowHost::new();
        let h = host.schedule_once(0.0);
        let deadline = host.next_timer_deadline().unwrap();
        assert!(deadline <= host.now());
        assert_eq!(host.pop_due_timer(host.now()), Some(h));
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn logic_ticks_do_not_count_as_draws() {
        let mut host = WindowHost::new();
        for i in 0..5 {
            host.tick(i as f64 * 10.0, TickKind::SkipRender);
        }
        for i in 0..3 {
            host.tick(i as f64 * 20.0, TickKind::Full);
        }
        let (ticks, draws) = host.take_rates();
        assert!(ticks.is_some());
        assert!((draws.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(host.take_rates(), (None, None));
    }
}
