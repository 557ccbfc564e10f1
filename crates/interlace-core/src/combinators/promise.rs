use std::mem;
use std::sync::{Arc, Mutex};

use interlace_types::AsyncError;

use crate::capability::{AsyncCapability, Resume};

enum PromiseState<T> {
    Pending(Vec<Box<dyn FnOnce(T) + Send>>),
    Resolved(T),
}

/// Single-assignment cell with FIFO listeners, resolved at most once.
///
/// Mirrors the spec's `Promise<T>`: any number of strands may
/// [`Promise::wait_value`] before resolution and each receives its own
/// copy of the value the moment [`Promise::resolve`] runs; a strand that
/// waits after resolution is satisfied immediately.
pub struct Promise<T> {
    state: Mutex<PromiseState<T>>,
}

impl<T: Clone + Send + 'static> Promise<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PromiseState::Pending(Vec::new())),
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), PromiseState::Resolved(_))
    }

    /// Resolve with `value`. Returns [`AsyncError::AlreadyResolved`] on a
    /// second call rather than overwriting the stored value.
    pub fn resolve(&self, value: T) -> Result<(), AsyncError> {
        let mut st = self.state.lock().unwrap();
        if matches!(&*st, PromiseState::Resolved(_)) {
            return Err(AsyncError::AlreadyResolved);
        }
        let old = mem::replace(&mut *st, PromiseState::Resolved(value.clone()));
        drop(st);
        if let PromiseState::Pending(listeners) = old {
            for listener in listeners {
                listener(value.clone());
            }
        }
        Ok(())
    }

    /// Suspend the calling strand until this promise resolves, or until
    /// an enclosing cancel reaches the wid this registers.
    pub async fn wait_value<C: AsyncCapability>(self: &Arc<Self>, cap: &C) -> Result<T, AsyncError> {
        {
            let st = self.state.lock().unwrap();
            if let PromiseState::Resolved(v) = &*st {
                return Ok(v.clone());
            }
        }

        let wid = cap.await_id();
        let this = self.clone();
        cap.await_op(wid, move |resume: Resume<T>| {
            let mut st = this.state.lock().unwrap();
            if let PromiseState::Resolved(v) = &*st {
                let v = v.clone();
                drop(st);
                resume.resume(Ok(v), true);
                return;
            }
            if let PromiseState::Pending(listeners) = &mut *st {
                listeners.push(Box::new(move |v| resume.resume(Ok(v), true)));
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::RootHandle;

    #[tokio::test(flavor = "current_thread")]
    async fn waiter_registered_before_resolve_gets_value() {
        let root = Arc::new(RootHandle::new());
        let promise = Promise::<u32>::new();

        let p = promise.clone();
        let r = root.clone();
        let waiter = tokio::spawn(async move { p.wait_value(&*r).await });
        tokio::task::yield_now().await;

        promise.resolve(99).unwrap();
        assert_eq!(waiter.await.unwrap().unwrap(), 99);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waiter_after_resolve_is_satisfied_immediately() {
        let root = RootHandle::new();
        let promise = Promise::<u32>::new();
        promise.resolve(7).unwrap();
        assert_eq!(promise.wait_value(&root).await.unwrap(), 7);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn double_resolve_is_rejected() {
        let promise = Promise::<u32>::new();
        promise.resolve(1).unwrap();
        assert!(matches!(
            promise.resolve(2),
            Err(AsyncError::AlreadyResolved)
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn multiple_waiters_all_see_the_same_value() {
        let root = Arc::new(RootHandle::new());
        let promise = Promise::<u32>::new();

        let p1 = promise.clone();
        let r1 = root.clone();
        let w1 = tokio::spawn(async move { p1.wait_value(&*r1).await });
        let p2 = promise.clone();
        let r2 = root.clone();
        let w2 = tokio::spawn(async move { p2.wait_value(&*r2).await });
        tokio::task::yield_now().await;

        promise.resolve(5).unwrap();
        assert_eq!(w1.await.unwrap().unwrap(), 5);
        assert_eq!(w2.await.unwrap().unwrap(), 5);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn listeners_are_notified_in_attachment_order() {
        let root = Arc::new(RootHandle::new());
        let promise = Promise::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut waiters = Vec::new();
        for tag in ["l1", "l2", "l3"] {
            let p = promise.clone();
            let r = root.clone();
            let log = log.clone();
            waiters.push(tokio::spawn(async move {
                p.wait_value(&*r).await.unwrap();
                log.lock().unwrap().push(tag);
            }));
            // force each waiter to register its listener, in order, before
            // moving on to the next one.
            tokio::task::yield_now().await;
        }

        promise.resolve(0).unwrap();
        for w in waiters {
            w.await.unwrap();
        }

        assert_eq!(*log.lock().unwrap(), vec!["l1", "l2", "l3"]);
    }
}
