use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use interlace_types::{TimerCallback, TimerHost, TimerId};
use tokio::task::AbortHandle;

/// A [`TimerHost`] backed by the current tokio runtime's real clock.
/// Each `set_timeout` spawns a task that sleeps and then runs the
/// callback; `clear_timeout` aborts that task if it hasn't fired yet.
/// `handles` is kept behind its own `Arc` so the spawned task can prune
/// its own entry once the callback runs — otherwise a timer that's
/// allowed to fire normally (the common case) would never be removed
/// and `handles` would grow for the life of the host.
#[derive(Default)]
pub struct TokioTimerHost {
    handles: Arc<Mutex<HashMap<u64, AbortHandle>>>,
    next_id: std::sync::atomic::AtomicU64,
}

impl TokioTimerHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerHost for TokioTimerHost {
    fn set_timeout(&self, cb: TimerCallback, ms: u64) -> TimerId {
        let raw = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let id = TimerId::new(raw);

        let handles = self.handles.clone();
        let task = tokio::spawn(async move {
            if ms > 0 {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            } else {
                tokio::task::yield_now().await;
            }
            cb();
            handles.lock().unwrap().remove(&raw);
        });
        self.handles.lock().unwrap().insert(raw, task.abort_handle());
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(handle) = self.handles.lock().unwrap().remove(&id.raw()) {
            handle.abort();
        }
    }
}
