use std::cell::Cell;

use super::jitter::Jitter;
use super::{FrameDriving, MIN_PUMP_LATENCY_MS, SimConfig};
use crate::host::{
    AnimationFrameProvider, DedupeField, HostTickSlot, TickKind, TickRoute, TimerFacility,
    TimerHandle, TimerQueue,
};
use crate::time::Clock;

/// One original-tick invocation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TickRecord {
    pub time: f64,
    pub kind: TickKind,
}

/// Next thing the simulated event loop delivers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SimEvent {
    HostFrame(f64),
    AnimationFrame(f64),
    Timer(TimerHandle),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FrameKind {
    Host,
    Pump,
}

#[derive(Debug, Copy, Clone)]
enum Source {
    Timer,
    Vsync,
    Frame(usize, FrameKind),
}

impl Source {
    fn rank(self) -> u8 {
        match self {
            Source::Timer => 0,
            Source::Vsync | Source::Frame(_, FrameKind::Host) => 1,
            Source::Frame(_, FrameKind::Pump) => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingFrame {
    at: f64,
    id: u64,
    kind: FrameKind,
}

/// Virtual-time host runtime.
#[derive(Debug)]
pub struct SimHost {
    config: SimConfig,
    now: Cell<f64>,
    timers: TimerQueue,
    jitter: Jitter,
    route: TickRoute,

    render_request: Option<u64>,
    update_request: Option<u64>,
    next_request_id: u64,
    frames: Vec<PendingFrame>,
    next_vsync: f64,

    ticks: Vec<TickRecord>,
    renders: Vec<f64>,
    host_frames: u64,
    pump_frames: u64,
}

impl SimHost {
    pub fn new(config: SimConfig) -> Self {
        let jitter = Jitter::new(config.seed, config.timer_jitter_ms);
        let mut host = Self {
            now: Cell::new(0.0),
            timers: TimerQueue::new(),
            jitter,
            route: config.initial_route,
            render_request: None,
            update_request: None,
            next_request_id: 0,
            frames: Vec::new(),
            next_vsync: config.frame_period_ms,
            ticks: Vec::new(),
            renders: Vec::new(),
            host_frames: 0,
            pump_frames: 0,
            config,
        };
        // The runtime starts its own loop before anything overrides it.
        host.request_host_frame();
        host
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current virtual time, without paying the read cost.
    pub fn elapsed(&self) -> f64 {
        self.now.get()
    }

    pub fn ticks(&self) -> &[TickRecord] {
        &self.ticks
    }

    /// Timestamps of full (update + draw) ticks.
    pub fn full_tick_times(&self) -> Vec<f64> {
        self.tick_times(TickKind::Full)
    }

    /// Timestamps of logic-only ticks.
    pub fn logic_tick_times(&self) -> Vec<f64> {
        self.tick_times(TickKind::SkipRender)
    }

    /// Virtual times at which `render()` was called.
    pub fn renders(&self) -> &[f64] {
        &self.renders
    }

    pub fn host_frames(&self) -> u64 {
        self.host_frames
    }

    pub fn pump_frames(&self) -> u64 {
        self.pump_frames
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn has_pending_pump(&self) -> bool {
        self.frames.iter().any(|f| f.kind == FrameKind::Pump)
    }

    /// Whether the render / update dedupe ids are currently set.
    pub fn dedupe_ids_set(&self) -> (bool, bool) {
        (self.render_request.is_some(), self.update_request.is_some())
    }

    /// Advances virtual time to the next event at or before `end`.
    ///
    /// Ties go to timers, then host frames, then unthrottled frames. When
    /// nothing is due by `end`, time moves to `end` and `None` is returned.
    pub fn next_event(&mut self, end: f64) -> Option<SimEvent> {
        let mut next: Option<(f64, Source)> = None;
        let mut offer = |at: f64, source: Source| {
            if next.is_none_or(|(t, s)| at < t || (at == t && source.rank() < s.rank())) {
                next = Some((at, source));
            }
        };
        if let Some(at) = self.timers.next_deadline() {
            offer(at, Source::Timer);
        }
        if self.config.frame_driving == FrameDriving::Continuous {
            offer(self.next_vsync, Source::Vsync);
        }
        if let Some((idx, frame)) = self.earliest_frame() {
            offer(frame.at, Source::Frame(idx, frame.kind));
        }

        let Some((at, source)) = next.filter(|(at, _)| *at <= end) else {
            if self.now.get() < end {
                self.now.set(end);
            }
            return None;
        };
        if self.now.get() < at {
            self.now.set(at);
        }
        let now = self.now.get();

        match source {
            Source::Timer => {
                let handle = self.timers.pop_due(now)?;
                if self.timers.contains(handle) {
                    let lateness = self.jitter.sample();
                    self.timers.set_lateness(handle, lateness);
                }
                Some(SimEvent::Timer(handle))
            }
            Source::Vsync => {
                self.next_vsync += self.config.frame_period_ms;
                self.host_frames += 1;
                Some(SimEvent::HostFrame(now))
            }
            Source::Frame(idx, _) => {
                let frame = self.frames.swap_remove(idx);
                Some(self.deliver_frame(frame, now))
            }
        }
    }

    fn deliver_frame(&mut self, frame: PendingFrame, now: f64) -> SimEvent {
        match frame.kind {
            FrameKind::Host => {
                if self.render_request == Some(frame.id) {
                    self.render_request = None;
                }
                self.host_frames += 1;
                SimEvent::HostFrame(now)
            }
            FrameKind::Pump => {
                if self.update_request == Some(frame.id) {
                    self.update_request = None;
                }
                self.pump_frames += 1;
                SimEvent::AnimationFrame(now)
            }
        }
    }

    fn earliest_frame(&self) -> Option<(usize, PendingFrame)> {
        self.frames
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.at.total_cmp(&b.at).then(a.id.cmp(&b.id)))
            .map(|(i, f)| (i, f.clone()))
    }

    fn request_host_frame(&mut self) {
        if self.config.frame_driving == FrameDriving::Continuous || self.render_request.is_some() {
            return;
        }
        let period = self.config.frame_period_ms;
        let at = ((self.now.get() / period).floor() + 1.0) * period;
        let id = self.next_id();
        self.render_request = Some(id);
        self.frames.push(PendingFrame {
            at,
            id,
            kind: FrameKind::Host,
        });
    }

    fn next_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn tick_times(&self, kind: TickKind) -> Vec<f64> {
        self.ticks
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.time)
            .collect()
    }
}

impl Clock for SimHost {
    fn now(&self) -> f64 {
        let t = self.now.get();
        self.now.set(t + self.config.clock_read_cost_ms);
        t
    }
}

impl TimerFacility for SimHost {
    fn schedule_once(&mut self, delay_ms: f64) -> TimerHandle {
        let handle = self.timers.schedule_once(self.now.get(), delay_ms);
        let lateness = self.jitter.sample();
        self.timers.set_lateness(handle, lateness);
        handle
    }

    fn schedule_repeating(&mut self, interval_ms: f64) -> TimerHandle {
        let handle = self.timers.schedule_repeating(self.now.get(), interval_ms);
        let lateness = self.jitter.sample();
        self.timers.set_lateness(handle, lateness);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

impl AnimationFrameProvider for SimHost {
    fn request_unlimited_frame(&mut self) {
        if self.update_request.is_some() {
            return;
        }
        let id = self.next_id();
        self.update_request = Some(id);
        self.frames.push(PendingFrame {
            at: self.now.get() + self.config.pump_latency_ms.max(MIN_PUMP_LATENCY_MS),
            id,
            kind: FrameKind::Pump,
        });
    }
}

impl HostTickSlot for SimHost {
    fn tick_route(&self) -> TickRoute {
        self.route
    }

    fn set_tick_route(&mut self, route: TickRoute) {
        self.route = route;
    }

    fn tick(&mut self, time: f64, kind: TickKind) {
        self.ticks.push(TickRecord { time, kind });
        self.request_host_frame();
    }

    fn render(&mut self) {
        self.renders.push(self.now.get());
    }

    fn reset_dedupe(&mut self, field: DedupeField) {
        match field {
            DedupeField::Render => self.render_request = None,
            DedupeField::Update => self.update_request = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SimConfig {
        SimConfig {
            clock_read_cost_ms: 0.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn reading_the_clock_costs_time() {
        let host = SimHost::new(SimConfig::default());
        let a = host.now();
        let b = host.now();
        assert!((b - a - 0.01).abs() < 1e-12);
    }

    #[test]
    fn host_frames_land_on_the_vsync_grid() {
        let mut host = SimHost::new(quiet());
        let period = host.config().frame_period_ms;
        assert_eq!(host.next_event(100.0), Some(SimEvent::HostFrame(period)));

        host.tick(period, TickKind::Full);
        host.tick(period, TickKind::Full);
        assert_eq!(host.next_event(100.0), Some(SimEvent::HostFrame(2.0 * period)));
        assert_eq!(host.next_event(100.0), None);
        assert_eq!(host.elapsed(), 100.0);
    }

    #[test]
    fn pump_requests_are_deduped_until_delivered() {
        let mut host = SimHost::new(quiet());
        host.request_unlimited_frame();
        host.request_unlimited_frame();
        assert!(matches!(host.next_event(1.0), Some(SimEvent::AnimationFrame(_))));
        assert_eq!(host.next_event(1.0), None);

        host.request_unlimited_frame();
        assert!(host.has_pending_pump());
    }

    #[test]
    fn reset_dedupe_allows_a_second_request() {
        let mut host = SimHost::new(quiet());
        host.request_unlimited_frame();
        host.reset_dedupe(DedupeField::Update);
        host.request_unlimited_frame();
        assert_eq!(host.pump_frames(), 0);

        let pumps = std::iter::from_fn(|| host.next_event(1.0)).count();
        assert_eq!(pumps, 2);
        assert_eq!(host.pump_frames(), 2);
    }

    #[test]
    fn timers_win_ties_with_frames() {
        let mut host = SimHost::new(SimConfig {
            frame_period_ms: 10.0,
            ..quiet()
        });
        let h = host.schedule_once(10.0);
        assert_eq!(host.next_event(20.0), Some(SimEvent::Timer(h)));
        assert_eq!(host.next_event(20.0), Some(SimEvent::HostFrame(10.0)));
    }

    #[test]
    fn continuous_driving_ignores_requests() {
        let mut host = SimHost::new(SimConfig {
            clock_read_cost_ms: 0.0,
            ..SimConfig::continuous(5.0)
        });
        host.tick(0.0, TickKind::Full);
        let frames = std::iter::from_fn(|| host.next_event(50.0)).count();
        assert_eq!(frames, 10);
        assert_eq!(host.host_frames(), 10);
    }
}
