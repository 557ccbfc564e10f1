use std::future::Future;
use std::sync::{Arc, Mutex};

use interlace_types::{AsyncError, TimerHost, TimerId};

use crate::capability::{AsyncCapability, Resume};
use crate::scope::Scope;

/// Suspend until the next tick, yielding to any other ready strand.
pub async fn yield_now<C: AsyncCapability>(scope: &Scope<C>) -> Result<(), AsyncError> {
    let wid = scope.await_id();
    let timers = scope.timers().clone();
    scope
        .await_op(wid, move |resume: Resume<()>| {
            timers.set_immediate(Box::new(move || resume.resume(Ok(()), true)));
        })
        .await
}

/// A single non-cancelable timeout: fire-and-forget, no bookkeeping to
/// release on cancellation. Used directly by [`wait`] for the mid-range
/// tier, and by callers who know in advance they'll never need to cut
/// the wait short.
async fn single_wait<C: AsyncCapability>(scope: &Scope<C>, ms: u64) -> Result<(), AsyncError> {
    let wid = scope.await_id();
    let timers = scope.timers().clone();
    scope
        .await_op(wid, move |resume: Resume<()>| {
            timers.set_timeout(Box::new(move || resume.resume(Ok(()), true)), ms);
        })
        .await
}

/// Tiered wait: waits over 200ms pay for [`cancelable_wait`]'s
/// release-on-cancel bookkeeping, a zero-length wait is just [`yield_now`],
/// and everything in between is a plain, non-cancelable timeout. Mirrors
/// the policy that short waits aren't worth the cancel overhead while long
/// ones need it.
pub async fn wait<C>(scope: &Scope<C>, ms: u64) -> Result<(), AsyncError>
where
    C: AsyncCapability + Clone + 'static,
{
    if ms > 200 {
        let (_handle, fut) = cancelable_wait(scope.clone(), ms);
        fut.await
    } else if ms == 0 {
        yield_now(scope).await
    } else {
        single_wait(scope, ms).await
    }
}

struct Armed {
    timers: Arc<dyn TimerHost>,
    id: TimerId,
    resume: Resume<()>,
}

/// A handle to wake a [`cancelable_wait`] early, short-circuiting its timer.
#[derive(Clone)]
pub struct WaitHandle {
    armed: Arc<Mutex<Option<Armed>>>,
}

impl WaitHandle {
    /// Resolve the wait immediately. A no-op if it already fired or was
    /// already woken.
    pub fn wake(&self) {
        if let Some(armed) = self.armed.lock().unwrap().take() {
            armed.timers.clear_timeout(armed.id);
            armed.resume.resume(Ok(()), true);
        }
    }
}

/// Like [`wait`]'s long-wait tier, but returns a [`WaitHandle`] that can
/// resolve the wait before its timer elapses — the building block
/// `timeout` and `firstof` use internally to cut a loser's wait short.
///
/// Whatever exit path the returned future takes (fired, woken, or
/// cancelled from outside), the underlying host timer is cleared exactly
/// once: cancellation never leaves a dangling timer attributable to this
/// call.
pub fn cancelable_wait<C>(
    scope: Scope<C>,
    ms: u64,
) -> (WaitHandle, impl Future<Output = Result<(), AsyncError>>)
where
    C: AsyncCapability + Clone + 'static,
{
    let armed: Arc<Mutex<Option<Armed>>> = Arc::new(Mutex::new(None));
    let handle = WaitHandle {
        armed: armed.clone(),
    };

    let fut = async move {
        let wid = scope.await_id();
        let timers = scope.timers().clone();
        let armed_for_cleanup = armed.clone();

        let result = scope
            .await_op(wid, move |resume: Resume<()>| {
                let armed_for_fire = armed.clone();
                let timers_for_store = timers.clone();
                let id = timers.set_timeout(
                    Box::new(move || {
                        if let Some(armed) = armed_for_fire.lock().unwrap().take() {
                            armed.resume.resume(Ok(()), true);
                        }
                    }),
                    ms,
                );
                *armed.lock().unwrap() = Some(Armed {
                    timers: timers_for_store,
                    id,
                    resume,
                });
            })
            .await;

        // Only a cancellation that beat the timer leaves this non-empty —
        // the fire callback and `WaitHandle::wake` both already take it.
        if let Some(armed) = armed_for_cleanup.lock().unwrap().take() {
            armed.timers.clear_timeout(armed.id);
        }
        result
    };

    (handle, fut)
}
