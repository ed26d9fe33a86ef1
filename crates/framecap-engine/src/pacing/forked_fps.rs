use super::max_fps::FrameGate;
use super::spin::CancelToken;
use super::{Arming, Decision, Pacer, TimerSlot, Wake};
use crate::time::Clock;

/// Separate logic and render cadences.
///
/// A repeating timer advances game state at exactly `1000 / limit` ms with
/// logic-only ticks, while host frames pass through a [`FrameGate`] and only
/// draw. Visuals stay display-synced; state advances on a fixed clock.
#[derive(Debug, Clone)]
pub struct ForkedFps {
    logic_interval: f64,
    next_logic_due: f64,
    gate: FrameGate,
}

impl ForkedFps {
    pub fn new(limit: u32, now: f64) -> Self {
        let logic_interval = 1000.0 / limit.max(1) as f64;
        Self {
            logic_interval,
            next_logic_due: now + logic_interval,
            gate: FrameGate::new(limit, now),
        }
    }

    pub fn logic_interval(&self) -> f64 {
        self.logic_interval
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// Nominal deadline of the next logic tick.
    pub fn next_logic_due(&self) -> f64 {
        self.next_logic_due
    }
}

impl Pacer for ForkedFps {
    fn arming(&self) -> Arming {
        Arming {
            repeating: Some(self.logic_interval),
            once: None,
        }
    }

    fn on_invoked(&mut self, time: Option<f64>) -> Decision {
        // A due logic tick goes first.
        if let Some(t) = time.filter(|t| t.is_finite()) {
            if t >= self.next_logic_due {
                return Decision::Defer;
            }
        }
        match self.gate.admit(time) {
            Some(_) => Decision::Render,
            None => Decision::Defer,
        }
    }

    fn on_timer<C: Clock + ?Sized>(
        &mut self,
        slot: TimerSlot,
        clock: &C,
        _cancel: &CancelToken,
    ) -> Wake {
        if slot != TimerSlot::Repeating {
            return Wake::Ignore;
        }
        let now = clock.now();
        self.next_logic_due += self.logic_interval;
        if self.next_logic_due <= now {
            self.next_logic_due = now + self.logic_interval;
        }
        Wake::Logic(now)
    }
}
