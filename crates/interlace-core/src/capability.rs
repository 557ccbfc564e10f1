use std::future::Future;
use std::sync::Arc;

use interlace_types::{AsyncError, Wid};

/// The three operations every handler in the stack implements, by
/// delegation or by interposition: `awaitId`, `await`, `cancel`.
///
/// Implementors are [`crate::root::RootHandle`] (the outermost layer,
/// owning the live registry), [`crate::cancelable::Cancelable`] (narrows
/// `cancel(None)` to its own scope), and [`crate::scope::Scope`] (bundles
/// a capability with a [`interlace_types::TimerHost`] for the combinators
/// that need one). `Arc<C>` forwards transparently so handlers can be
/// shared across concurrently spawned strands.
pub trait AsyncCapability: Send + Sync {
    /// Allocate a fresh [`Wid`] scoped to the enclosing root. Pure
    /// allocation; never suspends.
    fn await_id(&self) -> Wid;

    /// Register `wid` as pending, run `setup` against a [`Resume`] sink,
    /// and resolve to the first outcome delivered with `done = true`.
    ///
    /// `setup` may invoke the sink more than once (see [`crate::wrappers`]);
    /// every invocation before the last is discarded. An invocation that
    /// arrives after cancellation or after completion is silently dropped.
    fn await_op<T>(
        &self,
        wid: Wid,
        setup: impl FnOnce(Resume<T>) + Send + 'static,
    ) -> impl Future<Output = Result<T, AsyncError>> + Send
    where
        T: Send + 'static;

    /// Cancel the listed wids, or every await live in the innermost
    /// cancelable scope (root, absent one) when `targets` is `None`.
    /// Returns immediately; never suspends, never fails.
    fn cancel(&self, targets: Option<Vec<Wid>>);
}

impl<C: AsyncCapability + ?Sized> AsyncCapability for Arc<C> {
    fn await_id(&self) -> Wid {
        (**self).await_id()
    }

    async fn await_op<T>(
        &self,
        wid: Wid,
        setup: impl FnOnce(Resume<T>) + Send + 'static,
    ) -> Result<T, AsyncError>
    where
        T: Send + 'static,
    {
        (**self).await_op(wid, setup).await
    }

    fn cancel(&self, targets: Option<Vec<Wid>>) {
        (**self).cancel(targets)
    }
}

/// The resume sink handed to a `setup` closure — the host-invocable
/// callback `cb` of the spec's `await` operation.
///
/// Cloneable because some host shapes (e.g. `setTimeout` returning a
/// timer id synchronously, then firing later) invoke their callback more
/// than once; each clone shares the same underlying channel.
pub struct Resume<T> {
    pub(crate) tx: tokio::sync::mpsc::UnboundedSender<Msg<T>>,
}

impl<T> Clone for Resume<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

pub(crate) struct Msg<T> {
    pub(crate) outcome: Result<T, AsyncError>,
    pub(crate) done: bool,
}

impl<T: Send + 'static> Resume<T> {
    /// Deliver one result. An erroneous outcome forces `done = true`,
    /// matching the spec's sticky-done rule. Sending after the owning
    /// await has already resolved (or been cancelled) is inert — the
    /// receiving side has been dropped, and the send is simply ignored.
    pub fn resume(&self, outcome: Result<T, AsyncError>, done: bool) {
        let done = done || outcome.is_err();
        let _ = self.tx.send(Msg { outcome, done });
    }
}
