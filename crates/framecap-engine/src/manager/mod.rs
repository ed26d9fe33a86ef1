//! The user-facing pacing instance.
//!
//! `FpsManager` owns the host handle, the validated configuration and the
//! scheduler context. Configuration changes go through validating setters;
//! the host's event loop feeds it frames, animation frames and timer firings.

mod events;

pub use events::FramerateEvent;

use anyhow::{Context, Result};

use crate::config::{
    FramerateConfig, FramerateMode, InitProperties, Snapshot, validate_limit,
};
use crate::host::{Host, HostDiscovery, TimerHandle};
use crate::scheduler::SchedulerContext;
use events::Listeners;

pub struct FpsManager<H: Host> {
    host: H,
    config: FramerateConfig,
    scheduler: SchedulerContext,
    listeners: Listeners,
}

impl<H: Host> FpsManager<H> {
    /// Resolves the host runtime and installs pacing for the stored properties.
    pub fn new(props: &InitProperties, discovery: HostDiscovery<H>) -> Result<Self> {
        let host = discovery
            .resolve()
            .context("fps manager cannot start without the real host runtime")?;
        let scheduler = SchedulerContext::attach(&host)?;
        let config = FramerateConfig::from_properties(props);

        let mut manager = Self {
            host,
            config,
            scheduler,
            listeners: Listeners::default(),
        };
        manager.reinstall();
        log::info!(
            "fps manager ready: limit={} mode={}",
            manager.config.limit,
            manager.config.label()
        );
        Ok(manager)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> FramerateConfig {
        self.config
    }

    pub fn scheduler(&self) -> &SchedulerContext {
        &self.scheduler
    }

    pub fn current_limit(&self) -> u32 {
        self.config.limit
    }

    /// Mode name, or `"disabled"` while the limit is 0.
    pub fn current_mode_or_disabled(&self) -> &'static str {
        self.config.label()
    }

    /// Registers a listener for configuration changes.
    pub fn subscribe(&mut self, listener: impl FnMut(&FramerateEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Sets the cap. Non-finite, fractional, negative and unchanged values are
    /// ignored. Returns whether the configuration changed.
    pub fn set_limit(&mut self, limit: f64) -> bool {
        let Some(limit) = validate_limit(limit) else {
            log::trace!("rejected framerate limit {limit}");
            return false;
        };
        if limit == self.config.limit {
            return false;
        }

        self.config.limit = limit;
        self.reinstall();
        log::info!("framerate limit set to {limit} ({})", self.config.label());
        self.listeners.emit(FramerateEvent::LimitChanged { limit });
        true
    }

    /// Selects a mode by selector index (0 max-fps, 1 fixed-fps, 2 forked-fps).
    pub fn set_mode_index(&mut self, index: f64) -> bool {
        match FramerateMode::from_index(index) {
            Some(mode) => self.set_mode(mode),
            None => {
                log::trace!("rejected framerate mode index {index}");
                false
            }
        }
    }

    pub fn set_mode(&mut self, mode: FramerateMode) -> bool {
        if mode == self.config.mode {
            return false;
        }

        self.config.mode = mode;
        self.reinstall();
        log::info!("framerate mode set to {mode}");
        self.listeners.emit(FramerateEvent::ModeChanged { mode });
        true
    }

    /// Same as `set_limit(0.0)`.
    pub fn disable(&mut self) -> bool {
        self.set_limit(0.0)
    }

    pub fn save(&self) -> Snapshot {
        Snapshot::from(self.config)
    }

    pub fn save_json(&self) -> Result<String> {
        self.save().to_json()
    }

    /// Restores a saved configuration and reinstalls pacing to match.
    /// Listeners are not notified.
    pub fn load(&mut self, snapshot: &Snapshot) {
        self.config = snapshot.to_config();
        self.reinstall();
        log::debug!(
            "loaded framerate snapshot: limit={} mode={}",
            self.config.limit,
            self.config.mode
        );
    }

    /// Decodes and loads a snapshot. A malformed document leaves the current
    /// configuration untouched.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let snapshot = Snapshot::from_json(json)?;
        self.load(&snapshot);
        Ok(())
    }

    /// See [`SchedulerContext::request_resync`].
    pub fn request_resync(&mut self) -> bool {
        self.scheduler.request_resync()
    }

    /// Host event loop: the tick slot was invoked.
    pub fn on_host_frame(&mut self, time: Option<f64>) {
        self.scheduler.on_host_frame(&mut self.host, time);
    }

    /// Host event loop: an unthrottled animation frame arrived.
    pub fn on_animation_frame(&mut self, time: f64) {
        self.scheduler.on_animation_frame(&mut self.host, time);
    }

    /// Host event loop: a timer fired.
    pub fn on_timer(&mut self, handle: TimerHandle) {
        self.scheduler.on_timer(&mut self.host, handle);
    }

    fn reinstall(&mut self) {
        self.scheduler.install(&mut self.host, &self.config);
    }
}

impl<H: Host> Drop for FpsManager<H> {
    fn drop(&mut self) {
        self.scheduler.detach(&mut self.host);
    }
}
