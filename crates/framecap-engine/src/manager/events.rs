use crate::config::FramerateMode;

/// Notification fired after a setter changed the configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramerateEvent {
    LimitChanged { limit: u32 },
    ModeChanged { mode: FramerateMode },
}

pub(crate) type Listener = Box<dyn FnMut(&FramerateEvent)>;

/// Registered change listeners, called in subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Vec<Listener>,
}

impl Listeners {
    pub(crate) fn push(&mut self, listener: Listener) {
        self.inner.push(listener);
    }

    pub(crate) fn emit(&mut self, event: FramerateEvent) {
        for listener in &mut self.inner {
            listener(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}
