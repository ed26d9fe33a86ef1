use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use super::host::WindowHost;
use crate::config::{FramerateMode, InitProperties};
use crate::host::{Host, HostDiscovery};
use crate::manager::FpsManager;
use crate::time::Clock;

/// Limit change applied by the arrow keys.
pub const LIMIT_STEP: u32 = 5;

/// How often the window title is refreshed with measured rates, in ms.
const TITLE_REFRESH_MS: f64 = 500.0;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "framecap".to_string(),
            initial_size: LogicalSize::new(640.0, 360.0),
        }
    }
}

/// Keyboard controls of the interactive window.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyAction {
    RaiseLimit,
    LowerLimit,
    CycleMode,
    Disable,
}

impl KeyAction {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::ArrowUp => Some(Self::RaiseLimit),
            KeyCode::ArrowDown => Some(Self::LowerLimit),
            KeyCode::KeyM => Some(Self::CycleMode),
            KeyCode::Digit0 | KeyCode::Numpad0 => Some(Self::Disable),
            _ => None,
        }
    }

    /// Applies the action through the manager's validating setters.
    pub fn apply<H: Host>(self, manager: &mut FpsManager<H>) -> bool {
        let limit = manager.current_limit();
        match self {
            Self::RaiseLimit => manager.set_limit(limit.saturating_add(LIMIT_STEP) as f64),
            Self::LowerLimit => manager.set_limit(limit.saturating_sub(LIMIT_STEP) as f64),
            Self::CycleMode => {
                let next = (manager.config().mode.index() + 1) % FramerateMode::ALL.len();
                manager.set_mode(FramerateMode::ALL[next])
            }
            Self::Disable => manager.disable(),
        }
    }
}

/// Entry point for the interactive runtime.
pub struct Runtime;

impl Runtime {
    pub fn run(config: RuntimeConfig, props: InitProperties) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let manager = FpsManager::new(&props, HostDiscovery::exposed(WindowHost::new()))?;
        let mut state = AppState::new(config, manager);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct AppState {
    config: RuntimeConfig,
    manager: FpsManager<WindowHost>,
    window_id: Option<WindowId>,
    last_title_refresh: f64,
    exit_requested: bool,
}

impl AppState {
    fn new(config: RuntimeConfig, manager: FpsManager<WindowHost>) -> Self {
        Self {
            config,
            manager,
            window_id: None,
            last_title_refresh: 0.0,
            exit_requested: false,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        self.window_id = Some(window.id());
        self.manager.host_mut().attach_window(window);
        Ok(())
    }

    fn fire_due_timers(&mut self) {
        let now = self.manager.host().now();
        while let Some(handle) = self.manager.host_mut().pop_due_timer(now) {
            self.manager.on_timer(handle);
        }
    }

    fn refresh_title(&mut self) {
        let now = self.manager.host().now();
        if now - self.last_title_refresh < TITLE_REFRESH_MS {
            return;
        }
        self.last_title_refresh = now;

        let (ticks, draws) = self.manager.host_mut().take_rates();
        let title = format_title(
            &self.config.title,
            self.manager.current_limit(),
            self.manager.current_mode_or_disabled(),
            ticks,
            draws,
        );
        if let Some(window) = self.manager.host().window() {
            window.set_title(&title);
        }
    }

    fn control_flow(&self) -> ControlFlow {
        let host = self.manager.host();
        if host.pump_pending() {
            return ControlFlow::Poll;
        }
        let title_due = self.last_title_refresh + TITLE_REFRESH_MS;
        let deadline = host
            .next_timer_deadline()
            .map_or(title_due, |d| d.min(title_due));
        ControlFlow::WaitUntil(host.clock().instant_at(deadline))
    }

    fn on_key(&mut self, code: KeyCode) {
        let Some(action) = KeyAction::from_key(code) else {
            return;
        };
        if action.apply(&mut self.manager) {
            log::info!(
                "{action:?}: limit={} mode={}",
                self.manager.current_limit(),
                self.manager.current_mode_or_disabled()
            );
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window_id.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            log::error!("failed to create initial window: {e:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        self.fire_due_timers();

        if self.manager.host_mut().take_pump() {
            let now = self.manager.host().now();
            self.manager.on_animation_frame(now);
        }

        self.refresh_title();
        event_loop.set_control_flow(self.control_flow());
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window_id != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.manager.host_mut().detach_window();
                self.window_id = None;
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.on_key(code);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.manager.host_mut().redraw_delivered();
                let now = self.manager.host().now();
                self.manager.on_host_frame(Some(now));
            }

            _ => {}
        }
    }
}

/// Window title showing the configuration and the measured rates.
pub fn format_title(
    base: &str,
    limit: u32,
    label: &str,
    ticks: Option<f64>,
    draws: Option<f64>,
) -> String {
    let rate = |r: Option<f64>| r.map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
    let cap = if limit == 0 {
        label.to_string()
    } else {
        format!("{label} @ {limit}")
    };
    format!("{base} | {cap} | tick {} | draw {}", rate(ticks), rate(draws))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimConfig, SimHost};

    fn manager(limit: f64) -> FpsManager<SimHost> {
        let props = InitProperties::with_max_framerate(limit);
        FpsManager::new(&props, HostDiscovery::exposed(SimHost::new(SimConfig::default())))
            .unwrap()
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(KeyAction::from_key(KeyCode::ArrowUp), Some(KeyAction::RaiseLimit));
        assert_eq!(KeyAction::from_key(KeyCode::KeyM), Some(KeyAction::CycleMode));
        assert_eq!(KeyAction::from_key(KeyCode::Numpad0), Some(KeyAction::Disable));
        assert_eq!(KeyAction::from_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn arrows_step_the_limit() {
        let mut m = manager(30.0);
        assert!(KeyAction::RaiseLimit.apply(&mut m));
        assert_eq!(m.current_limit(), 35);
        assert!(KeyAction::LowerLimit.apply(&mut m));
        assert!(KeyAction::LowerLimit.apply(&mut m));
        assert_eq!(m.current_limit(), 25);
    }

    #[test]
    fn lowering_below_zero_stops_at_disabled() {
        let mut m = manager(3.0);
        assert!(KeyAction::LowerLimit.apply(&mut m));
        assert_eq!(m.current_mode_or_disabled(), "disabled");
        assert!(!KeyAction::LowerLimit.apply(&mut m));
    }

    #[test]
    fn mode_cycles_through_all_three() {
        let mut m = manager(30.0);
        let seen: Vec<_> = (0..3)
            .map(|_| {
                KeyAction::CycleMode.apply(&mut m);
                m.config().mode
            })
            .collect();
        assert_eq!(
            seen,
            [FramerateMode::FixedFps, FramerateMode::ForkedFps, FramerateMode::MaxFps]
        );
    }

    #[test]
    fn title_shows_cap_and_rates() {
        assert_eq!(
            format_title("demo", 30, "max-fps", Some(29.96), None),
            "demo | max-fps @ 30 | tick 30.0 | draw -"
        );
        assert_eq!(
            format_title("demo", 0, "disabled", Some(120.0), Some(120.0)),
            "demo | disabled | tick 120.0 | draw 120.0"
        );
    }
}
