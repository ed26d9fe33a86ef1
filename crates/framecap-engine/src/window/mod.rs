//! Interactive window host.
//!
//! Owns the `winit` EventLoop and Window and feeds their redraws, timers and
//! keyboard input to an [`FpsManager`](crate::manager::FpsManager).

mod host;
mod runtime;

pub use host::WindowHost;
pub use runtime::{KeyAction, LIMIT_STEP, Runtime, RuntimeConfig, format_title};
