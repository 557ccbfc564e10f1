use std::collections::HashMap;
use std::sync::Mutex;

use interlace_types::{AsyncError, Wid, WidAllocator};
use tokio::sync::{mpsc, oneshot};

use crate::capability::{AsyncCapability, Msg, Resume};

#[derive(Default)]
struct Registry {
    live: HashMap<Wid, oneshot::Sender<()>>,
}

/// The outermost implementation of the async capability (`async-handle`).
///
/// Owns the global await registry for one root invocation: the live set
/// of `(wid, cancel-trigger)` pairs, inserted on await and removed on
/// completion or cancellation. Per the design notes, create one
/// `RootHandle` per independent top-level computation — it is not
/// process-wide state.
pub struct RootHandle {
    registry: Mutex<Registry>,
    wids: WidAllocator,
}

impl Default for RootHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl RootHandle {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            wids: WidAllocator::new(),
        }
    }

    /// Snapshot of currently-live wids. Used by
    /// [`crate::cancelable::Cancelable`] to narrow an unscoped cancel.
    pub(crate) fn live_wids(&self) -> Vec<Wid> {
        self.registry.lock().unwrap().live.keys().copied().collect()
    }
}

impl AsyncCapability for RootHandle {
    fn await_id(&self) -> Wid {
        self.wids.alloc()
    }

    async fn await_op<T>(
        &self,
        wid: Wid,
        setup: impl FnOnce(Resume<T>) + Send + 'static,
    ) -> Result<T, AsyncError>
    where
        T: Send + 'static,
    {
        debug_assert!(
            !wid.is_exit(),
            "wid-exit must never be registered or awaited through await_op"
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<Msg<T>>();
        let mut cancel_rx = {
            let (ctx, crx) = oneshot::channel();
            self.registry.lock().unwrap().live.insert(wid, ctx);
            crx
        };

        setup(Resume { tx });
        tracing::trace!(%wid, "await registered");

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => break Err(AsyncError::Cancel),
                msg = rx.recv() => match msg {
                    Some(m) if m.done => break m.outcome,
                    Some(_) => continue,
                    // setup dropped its sink without ever resolving: treat
                    // as a silent exit rather than hanging forever.
                    None => break Err(AsyncError::Cancel),
                },
            }
        };

        // Whichever path won, the wid is no longer live. A callback that
        // fires after this point finds nothing in the registry and its
        // send on a closed channel is a silent no-op — the at-most-once
        // resume invariant the registry membership check is there for.
        self.registry.lock().unwrap().live.remove(&wid);
        tracing::trace!(%wid, ok = outcome.is_ok(), "await settled");
        outcome
    }

    fn cancel(&self, targets: Option<Vec<Wid>>) {
        let mut reg = self.registry.lock().unwrap();
        let keys = targets.unwrap_or_else(|| reg.live.keys().copied().collect());
        let mut cancelled = 0;
        for wid in keys {
            if let Some(tx) = reg.live.remove(&wid) {
                // Receiver may already be gone if the await completed in
                // the same instant; sending into a closed channel is a
                // harmless no-op, matching cancel idempotence.
                let _ = tx.send(());
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::debug!(cancelled, "delivered cancel to pending awaits");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(flavor = "current_thread")]
    async fn await_op_resolves_on_first_done_invocation() {
        let root = RootHandle::new();
        let wid = root.await_id();
        let out = root
            .await_op::<u32>(wid, |resume| resume.resume(Ok(7), true))
            .await;
        assert_eq!(out.unwrap(), 7);
        assert!(root.live_wids().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cancel_delivers_cancel_error_and_is_idempotent() {
        let root = Arc::new(RootHandle::new());
        let wid = root.await_id();

        let (hold_tx, hold_rx) = oneshot::channel::<Resume<()>>();
        let root_for_task = root.clone();
        let handle = tokio::spawn(async move {
            root_for_task
                .await_op::<()>(wid, move |resume| {
                    let _ = hold_tx.send(resume);
                })
                .await
        });

        // give the setup closure a chance to register before canceling
        tokio::task::yield_now().await;
        root.cancel(Some(vec![wid]));
        root.cancel(Some(vec![wid])); // idempotent: second call is a no-op

        let out = handle.await.unwrap();
        assert!(matches!(out, Err(AsyncError::Cancel)));

        // the late resume (host callback firing after cancel) is dropped
        let resume = hold_rx.await.unwrap();
        resume.resume(Ok(()), true);
        assert!(root.live_wids().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn rcount_style_multi_resume_only_resolves_on_done() {
        let root = RootHandle::new();
        let wid = root.await_id();
        let out = root
            .await_op::<u32>(wid, |resume| {
                resume.resume(Ok(1), false);
                resume.resume(Ok(2), true);
            })
            .await;
        assert_eq!(out.unwrap(), 2);
    }
}
