use std::future::Future;
use std::sync::Arc;

use interlace_types::{AsyncError, TimerHost, Wid};

use crate::capability::{AsyncCapability, Resume};
use crate::cancelable::Cancelable;
use crate::root::RootHandle;

/// Bundles an [`AsyncCapability`] with the [`TimerHost`] the combinators
/// in this crate need to schedule work against. Every public entry point
/// (`wait`, `timeout`, `fork`, ...) takes a `&Scope<C>` rather than the
/// capability alone, the same way the spec threads a host reference
/// alongside the handler stack.
#[derive(Clone)]
pub struct Scope<C> {
    capability: C,
    timers: Arc<dyn TimerHost>,
}

impl<C: AsyncCapability> Scope<C> {
    pub fn new(capability: C, timers: Arc<dyn TimerHost>) -> Self {
        Self { capability, timers }
    }

    pub fn timers(&self) -> &Arc<dyn TimerHost> {
        &self.timers
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    /// Wrap this scope's capability in a fresh [`Cancelable`] layer,
    /// producing a new scope whose unscoped `cancel()` only reaches work
    /// started through it. `fork`, `interleaved`, and `firstof` all build
    /// on this to give each concurrent strand its own cancellation blast
    /// radius. Wrapped in `Arc` so the nested scope can be cloned across
    /// the tasks those combinators spawn.
    pub fn nested(&self) -> Scope<Arc<Cancelable<C>>>
    where
        C: Clone,
    {
        Scope {
            capability: Arc::new(Cancelable::new(self.capability.clone())),
            timers: self.timers.clone(),
        }
    }
}

impl Scope<Arc<RootHandle>> {
    /// A fresh top-level scope: a new [`RootHandle`] paired with `timers`.
    /// This is the usual entry point for running a whole computation.
    pub fn root(timers: Arc<dyn TimerHost>) -> Self {
        Self {
            capability: Arc::new(RootHandle::new()),
            timers,
        }
    }
}

impl<C: AsyncCapability> AsyncCapability for Scope<C> {
    fn await_id(&self) -> Wid {
        self.capability.await_id()
    }

    fn await_op<T>(
        &self,
        wid: Wid,
        setup: impl FnOnce(Resume<T>) + Send + 'static,
    ) -> impl Future<Output = Result<T, AsyncError>> + Send
    where
        T: Send + 'static,
    {
        self.capability.await_op(wid, setup)
    }

    fn cancel(&self, targets: Option<Vec<Wid>>) {
        self.capability.cancel(targets)
    }
}
