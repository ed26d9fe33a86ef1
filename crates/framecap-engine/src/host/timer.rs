/// Opaque id of a scheduled timer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Deferred callback execution.
///
/// The host answers each firing by calling `on_timer(handle)`. Cancelling an
/// unknown or already-fired one-shot handle is a no-op.
pub trait TimerFacility {
    fn schedule_once(&mut self, delay_ms: f64) -> TimerHandle;
    fn schedule_repeating(&mut self, interval_ms: f64) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Shortest period a repeating timer may use, in milliseconds.
pub const MIN_REPEAT_INTERVAL_MS: f64 = 1.0;

#[derive(Debug, Clone)]
struct Entry {
    handle: TimerHandle,
    due: f64,
    period: Option<f64>,
    lateness: f64,
}

impl Entry {
    fn fire_at(&self) -> f64 {
        self.due + self.lateness
    }
}

/// Deadline bookkeeping shared by host implementations.
///
/// `due` is the nominal deadline; hosts that model timer imprecision add a
/// per-firing `lateness` that does not shift the nominal schedule of
/// repeating timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<Entry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn schedule_once(&mut self, now: f64, delay_ms: f64) -> TimerHandle {
        self.push(now + sanitize_delay(delay_ms), None)
    }

    pub fn schedule_repeating(&mut self, now: f64, interval_ms: f64) -> TimerHandle {
        let period = sanitize_delay(interval_ms).max(MIN_REPEAT_INTERVAL_MS);
        self.push(now + period, Some(period))
    }

    /// Returns whether a timer was removed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Delays the next firing of `handle` past its nominal deadline.
    pub fn set_lateness(&mut self, handle: TimerHandle, lateness_ms: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.handle == handle) {
            entry.lateness = if lateness_ms.is_finite() { lateness_ms } else { 0.0 };
        }
    }

    /// Earliest time any timer wants to fire.
    pub fn next_deadline(&self) -> Option<f64> {
        self.earliest().map(|i| self.entries[i].fire_at())
    }

    /// Takes the earliest timer whose firing time is `<= now`.
    ///
    /// One-shot timers are removed; repeating timers advance by one period
    /// (never into the past, so a stalled host does not replay a burst).
    pub fn pop_due(&mut self, now: f64) -> Option<TimerHandle> {
        let idx = self.earliest()?;
        if self.entries[idx].fire_at() > now {
            return None;
        }

        let handle = self.entries[idx].handle;
        match self.entries[idx].period {
            Some(period) => {
                let entry = &mut self.entries[idx];
                entry.due += period;
                if entry.due <= now {
                    entry.due = now + period;
                }
                entry.lateness = 0.0;
            }
            None => {
                self.entries.swap_remove(idx);
            }
        }
        Some(handle)
    }

    fn push(&mut self, due: f64, period: Option<f64>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            due,
            period,
            lateness: 0.0,
        });
        handle
    }

    fn earliest(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.fire_at()
                    .total_cmp(&b.fire_at())
                    .then(a.handle.cmp(&b.handle))
            })
            .map(|(i, _)| i)
    }
}

fn sanitize_delay(delay_ms: f64) -> f64 {
    if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 }
}
