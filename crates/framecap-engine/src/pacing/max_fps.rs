use super::{Decision, Pacer, usable_time};

/// Elapsed-vs-interval gate shared by the frame-driven strategies.
///
/// The interval is `1000 / (limit + 1)`, slightly shorter than the nominal
/// period.
#[derive(Debug, Clone)]
pub struct FrameGate {
    interval: f64,
    last_frame_time: f64,
}

impl FrameGate {
    pub fn new(limit: u32, now: f64) -> Self {
        Self {
            interval: 1000.0 / (limit as f64 + 1.0),
            last_frame_time: now,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn last_frame_time(&self) -> f64 {
        self.last_frame_time
    }

    /// Returns the accepted timestamp, or `None` when it is too early.
    pub fn admit(&mut self, time: Option<f64>) -> Option<f64> {
        let t = usable_time(time).unwrap_or(self.last_frame_time);
        if t - self.last_frame_time <= self.interval {
            return None;
        }
        self.last_frame_time = t;
        Some(t)
    }
}

/// Caps the host's own frame rate by refusing frames that come too soon.
#[derive(Debug, Clone)]
pub struct MaxFps {
    gate: FrameGate,
}

impl MaxFps {
    pub fn new(limit: u32, now: f64) -> Self {
        Self {
            gate: FrameGate::new(limit, now),
        }
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }
}

impl Pacer for MaxFps {
    fn on_invoked(&mut self, time: Option<f64>) -> Decision {
        match self.gate.admit(time) {
            Some(t) => Decision::Tick(t),
            None => Decision::Defer,
        }
    }
}
