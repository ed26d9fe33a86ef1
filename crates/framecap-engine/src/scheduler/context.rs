use std::cell::Cell;

use anyhow::{Result, bail};

use crate::config::{FramerateConfig, FramerateMode};
use crate::host::{DedupeField, Host, HostTickSlot, TickKind, TickRoute, TimerHandle};
use crate::pacing::spin::CancelToken;
use crate::pacing::{Decision, Pacer, Strategy, TimerSlot, Wake};

thread_local! {
    static SLOT_CLAIMED: Cell<bool> = const { Cell::new(false) };
}

/// Timer handles owned by the installed strategy.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TimerSet {
    repeating: Option<TimerHandle>,
    once: Option<TimerHandle>,
}

impl TimerSet {
    pub fn repeating(&self) -> Option<TimerHandle> {
        self.repeating
    }

    pub fn once(&self) -> Option<TimerHandle> {
        self.once
    }

    pub fn is_empty(&self) -> bool {
        self.repeating.is_none() && self.once.is_none()
    }

    fn slot_of(&self, handle: TimerHandle) -> Option<TimerSlot> {
        if self.repeating == Some(handle) {
            Some(TimerSlot::Repeating)
        } else if self.once == Some(handle) {
            Some(TimerSlot::Once)
        } else {
            None
        }
    }
}

/// Owner of the single pacing stream of an event-loop thread.
///
/// Only one context may be attached per thread; the claim is released when
/// the context is dropped.
#[derive(Debug)]
pub struct SchedulerContext {
    original_route: TickRoute,
    active: Option<Strategy>,
    timers: TimerSet,
    cancel: CancelToken,
    last_tick: Option<f64>,
}

impl SchedulerContext {
    /// Captures the host's current tick route as the original tick.
    pub fn attach<H: HostTickSlot + ?Sized>(host: &H) -> Result<Self> {
        if SLOT_CLAIMED.with(|claimed| claimed.replace(true)) {
            bail!("a scheduler context is already attached on this thread");
        }
        Ok(Self {
            original_route: host.tick_route(),
            active: None,
            timers: TimerSet::default(),
            cancel: CancelToken::new(),
            last_tick: None,
        })
    }

    pub fn original_route(&self) -> TickRoute {
        self.original_route
    }

    pub fn active_mode(&self) -> Option<FramerateMode> {
        self.active.as_ref().map(Strategy::mode)
    }

    pub fn strategy(&self) -> Option<&Strategy> {
        self.active.as_ref()
    }

    pub fn timers(&self) -> TimerSet {
        self.timers
    }

    /// Handle that aborts the active strategy's spin from elsewhere.
    ///
    /// A cancelled strategy stops producing ticks until the next install.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replaces whatever is installed with the strategy for `config`.
    pub fn install<H: Host + ?Sized>(&mut self, host: &mut H, config: &FramerateConfig) {
        self.teardown(host);

        let now = host.now();
        let Some(strategy) = Strategy::for_config(config, now) else {
            host.set_tick_route(self.original_route);
            log::debug!("pacing disabled; original tick restored");
            return;
        };

        let arming = strategy.arming();
        self.cancel = CancelToken::new();
        if let Some(interval) = arming.repeating {
            self.timers.repeating = Some(host.schedule_repeating(interval));
        }
        if let Some(delay) = arming.once {
            self.timers.once = Some(host.schedule_once(delay));
        }

        let mode = strategy.mode();
        host.set_tick_route(TickRoute::Paced(mode));
        self.active = Some(strategy);
        log::debug!("installed {mode} pacing at {} fps", config.limit);

        self.dispatch(host, Some(now));
    }

    /// Cancels the active strategy's timers and drops it. Idempotent.
    pub fn teardown<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(handle) = self.timers.repeating.take() {
            host.cancel(handle);
        }
        if let Some(handle) = self.timers.once.take() {
            host.cancel(handle);
        }
        self.cancel.cancel();

        if let Some(strategy) = self.active.take() {
            log::debug!("tore down {} pacing", strategy.mode());
        }

        host.reset_dedupe(DedupeField::Render);
        host.reset_dedupe(DedupeField::Update);
    }

    /// Tears down and hands the tick slot back to the original tick.
    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.teardown(host);
        host.set_tick_route(self.original_route);
    }

    /// Forces the next fixed-rate wake-up to fire immediately after the
    /// coming tick. Returns `false` unless fixed-rate pacing is active.
    pub fn request_resync(&mut self) -> bool {
        match self.active.as_mut().and_then(Strategy::as_fixed_mut) {
            Some(fixed) => {
                fixed.request_instant_tick();
                true
            }
            None => false,
        }
    }

    /// Drops the next fixed-rate wake-up. Returns `false` unless fixed-rate
    /// pacing is active.
    pub fn skip_next_cycle(&mut self) -> bool {
        match self.active.as_mut().and_then(Strategy::as_fixed_mut) {
            Some(fixed) => {
                fixed.skip_next_cycle();
                true
            }
            None => false,
        }
    }

    /// The host invoked its tick slot.
    pub fn on_host_frame<H: Host + ?Sized>(&mut self, host: &mut H, time: Option<f64>) {
        if self.active.is_none() {
            let t = time.filter(|t| t.is_finite()).unwrap_or_else(|| host.now());
            self.forward_tick(host, t, TickKind::Full);
            return;
        }
        self.dispatch(host, time);
    }

    /// An unthrottled frame requested on a deferral arrived.
    pub fn on_animation_frame<H: Host + ?Sized>(&mut self, host: &mut H, time: f64) {
        if self.active.is_none() {
            log::trace!("animation frame with no active strategy ignored");
            return;
        }
        self.dispatch(host, Some(time));
    }

    /// A timer fired.
    pub fn on_timer<H: Host + ?Sized>(&mut self, host: &mut H, handle: TimerHandle) {
        let Some(slot) = self.timers.slot_of(handle) else {
            log::trace!("stale timer {} ignored", handle.raw());
            return;
        };
        if slot == TimerSlot::Once {
            self.timers.once = None;
        }
        let Some(strategy) = self.active.as_mut() else {
            return;
        };

        let wake = strategy.on_timer(slot, &*host, &self.cancel);
        if self.cancel.is_cancelled() {
            log::debug!("pacing cancelled mid-wait; dropping stale wake-up");
            return;
        }

        match wake {
            Wake::Tick { time, next_in } => {
                self.forward_tick(host, time, TickKind::Full);
                self.rearm_once(host, next_in);
            }
            Wake::Logic(time) => {
                host.reset_dedupe(DedupeField::Render);
                self.forward_tick(host, time, TickKind::SkipRender);
            }
            Wake::Skip { next_in } => self.rearm_once(host, next_in),
            Wake::Ignore => {}
        }
    }

    fn dispatch<H: Host + ?Sized>(&mut self, host: &mut H, time: Option<f64>) {
        let Some(strategy) = self.active.as_mut() else {
            return;
        };
        if self.cancel.is_cancelled() {
            log::trace!("pacing cancelled; {} invocation dropped", strategy.mode());
            return;
        }
        match strategy.on_invoked(time) {
            Decision::Tick(t) => self.forward_tick(host, t, TickKind::Full),
            Decision::Render => host.render(),
            Decision::Defer => host.request_unlimited_frame(),
            Decision::Idle => {}
        }
    }

    fn rearm_once<H: Host + ?Sized>(&mut self, host: &mut H, delay: f64) {
        self.timers.once = Some(host.schedule_once(delay));
    }

    /// Runs the original tick, never with a timestamp older than the last one.
    fn forward_tick<H: Host + ?Sized>(&mut self, host: &mut H, time: f64, kind: TickKind) {
        let t = match self.last_tick {
            Some(prev) if time < prev => prev,
            _ => time,
        };
        self.last_tick = Some(t);
        host.tick(t, kind);
    }
}

impl Drop for SchedulerContext {
    fn drop(&mut self) {
        self.cancel.cancel();
        SLOT_CLAIMED.with(|claimed| claimed.set(false));
    }
}
