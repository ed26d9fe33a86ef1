//! Framerate configuration.
//!
//! `FramerateConfig` is the validated `(limit, mode)` pair the scheduler is
//! built from. Raw numbers coming from actions, stored properties or the CLI
//! go through [`validate_limit`] / [`FramerateMode::from_index`] first; the
//! types themselves cannot hold an invalid value.

mod mode;
mod snapshot;

pub use mode::{FramerateMode, UnknownModeError};
pub use snapshot::Snapshot;

/// Label reported instead of a mode name while pacing is off.
pub const DISABLED_LABEL: &str = "disabled";

/// Validated pacing configuration. A limit of 0 disables pacing.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FramerateConfig {
    pub limit: u32,
    pub mode: FramerateMode,
}

impl FramerateConfig {
    pub fn new(limit: u32, mode: FramerateMode) -> Self {
        Self { limit, mode }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// Mode name, or [`DISABLED_LABEL`] when the limit is 0.
    pub fn label(&self) -> &'static str {
        if self.is_enabled() {
            self.mode.as_str()
        } else {
            DISABLED_LABEL
        }
    }

    /// Builds the startup config from stored properties.
    ///
    /// An invalid stored limit disables pacing rather than failing startup.
    pub fn from_properties(props: &InitProperties) -> Self {
        let limit = match props.max_framerate {
            None => 0,
            Some(raw) => validate_limit(raw).unwrap_or_else(|| {
                log::warn!("ignoring invalid stored max framerate {raw}; pacing disabled");
                0
            }),
        };
        Self::new(limit, props.mode.unwrap_or_default())
    }
}

/// Properties the host stores for a manager instance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InitProperties {
    /// The `max_framerate` property (0 or absent disables pacing).
    pub max_framerate: Option<f64>,
    /// Initial mode; `max-fps` when absent.
    pub mode: Option<FramerateMode>,
}

impl InitProperties {
    pub fn with_max_framerate(limit: f64) -> Self {
        Self {
            max_framerate: Some(limit),
            ..Self::default()
        }
    }
}

/// Accepts finite, integer-valued, non-negative limits that fit in a `u32`.
pub fn validate_limit(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}
