use std::fmt;

/// Opaque handle returned by [`TimerHost::set_timeout`].
///
/// Ownership: whoever receives it must call [`TimerHost::clear_timeout`]
/// at most once if the timer is to be cancelled before it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer({})", self.0)
    }
}

/// A host callback: `FnOnce` because every timer fires at most once.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstraction over the host's deferred-callback primitives.
///
/// This is the entire external surface the core relies on: schedule a
/// callback after `ms` milliseconds (or on the next tick), and cancel a
/// pending one. No other capability is assumed of the environment this
/// library runs in — no threads, no preemption, no I/O.
pub trait TimerHost: Send + Sync + 'static {
    fn set_timeout(&self, cb: TimerCallback, ms: u64) -> TimerId;

    /// Schedule `cb` to run on the next tick. Default falls back to
    /// `set_timeout(cb, 0)`, per the spec.
    fn set_immediate(&self, cb: TimerCallback) -> TimerId {
        self.set_timeout(cb, 0)
    }

    /// Idempotent: clearing an id that already fired (or was already
    /// cleared) is a no-op.
    fn clear_timeout(&self, id: TimerId);
}
