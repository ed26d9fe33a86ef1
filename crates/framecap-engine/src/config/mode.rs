use std::fmt;
use std::str::FromStr;

/// Pacing strategy selector.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FramerateMode {
    /// Drop host frames that arrive sooner than the cap allows.
    #[default]
    MaxFps,
    /// Timer-driven ticks at a precise fixed period.
    FixedFps,
    /// Timer-driven logic ticks plus a separately gated render path.
    ForkedFps,
}

impl FramerateMode {
    /// Every mode, in selector-index order.
    pub const ALL: [FramerateMode; 3] = [
        FramerateMode::MaxFps,
        FramerateMode::FixedFps,
        FramerateMode::ForkedFps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FramerateMode::MaxFps => "max-fps",
            FramerateMode::FixedFps => "fixed-fps",
            FramerateMode::ForkedFps => "forked-fps",
        }
    }

    pub fn index(self) -> usize {
        match self {
            FramerateMode::MaxFps => 0,
            FramerateMode::FixedFps => 1,
            FramerateMode::ForkedFps => 2,
        }
    }

    /// Maps a selector index to a mode.
    ///
    /// Non-finite, fractional, negative and out-of-range values yield `None`.
    pub fn from_index(index: f64) -> Option<Self> {
        if !index.is_finite() || index < 0.0 || index.fract() != 0.0 {
            return None;
        }
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for FramerateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FramerateMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownModeError { name: s.to_string() })
    }
}

/// A mode name that is not one of `max-fps`, `fixed-fps`, `forked-fps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModeError {
    pub name: String,
}

impl fmt::Display for UnknownModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown framerate mode {:?} (expected max-fps, fixed-fps or forked-fps)",
            self.name
        )
    }
}

impl std::error::Error for UnknownModeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for mode in FramerateMode::ALL {
            assert_eq!(mode.as_str().parse::<FramerateMode>(), Ok(mode));
            assert_eq!(mode.to_string(), mode.as_str());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "turbo".parse::<FramerateMode>().unwrap_err();
        assert_eq!(err.name, "turbo");
        assert!(err.to_string().contains("turbo"));
    }

    #[test]
    fn index_lookup() {
        assert_eq!(FramerateMode::from_index(0.0), Some(FramerateMode::MaxFps));
        assert_eq!(FramerateMode::from_index(1.0), Some(FramerateMode::FixedFps));
        assert_eq!(FramerateMode::from_index(2.0), Some(FramerateMode::ForkedFps));
        for mode in FramerateMode::ALL {
            assert_eq!(FramerateMode::from_index(mode.index() as f64), Some(mode));
        }
    }

    #[test]
    fn bad_indices() {
        for bad in [3.0, 5.0, -1.0, 0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(FramerateMode::from_index(bad), None, "{bad}");
        }
    }
}
