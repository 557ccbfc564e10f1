use std::sync::Mutex;

use interlace_types::{AsyncError, Wid};

use crate::capability::{AsyncCapability, Resume};

/// A nested handler that records every wid started under it and, on an
/// unscoped `cancel()`, narrows the blast radius to exactly those wids
/// before delegating to `inner`.
///
/// This gives `cancel()` a structured meaning: only strands started
/// within the nearest enclosing cancelable scope are affected, not
/// arbitrary outer work. Nest these freely — `firstof` wraps one around
/// each call so a winner can cancel only its sibling.
pub struct Cancelable<C> {
    inner: C,
    local: Mutex<Vec<Wid>>,
}

impl<C: AsyncCapability> Cancelable<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            local: Mutex::new(Vec::new()),
        }
    }
}

impl<C: AsyncCapability> AsyncCapability for Cancelable<C> {
    fn await_id(&self) -> Wid {
        self.inner.await_id()
    }

    async fn await_op<T>(
        &self,
        wid: Wid,
        setup: impl FnOnce(Resume<T>) + Send + 'static,
    ) -> Result<T, AsyncError>
    where
        T: Send + 'static,
    {
        if !wid.is_exit() {
            self.local.lock().unwrap().push(wid);
        }
        let result = self.inner.await_op(wid, setup).await;
        // `await_op` only ever returns once `wid` is done (normally or via
        // cancel), so it is always safe to drop it from the local set here.
        self.local.lock().unwrap().retain(|w| *w != wid);
        result
    }

    fn cancel(&self, targets: Option<Vec<Wid>>) {
        match targets {
            None => {
                let local = self.local.lock().unwrap().clone();
                self.inner.cancel(Some(local));
            }
            Some(ws) => self.inner.cancel(Some(ws)),
        }
    }
}
