use interlace_types::AsyncError;
use tokio::task::JoinSet;

use crate::capability::AsyncCapability;
use crate::scope::Scope;

use super::wait::cancelable_wait;
use super::Action;

/// Run every action concurrently; the first to finish (success or
/// failure) wins and every sibling still pending is cancelled at its
/// next await boundary. Panics if `actions` is empty — there is no
/// well-defined winner to return.
pub async fn firstof<C, T>(scope: &Scope<C>, actions: Vec<Action<C, T>>) -> Result<T, AsyncError>
where
    C: AsyncCapability + Clone + 'static,
    T: Send + 'static,
{
    assert!(!actions.is_empty(), "firstof requires at least one action");

    let nested = scope.nested();
    let mut set = JoinSet::new();
    for action in actions {
        let nested_for_task = nested.clone();
        set.spawn(action(nested_for_task));
    }

    let first = set
        .join_next()
        .await
        .expect("at least one action was spawned");
    nested.cancel(None);
    while set.join_next().await.is_some() {}

    match first {
        Ok(result) => result,
        Err(join_err) => Err(AsyncError::User(anyhow::anyhow!(join_err))),
    }
}

/// Race `action` against a `ms`-millisecond timer. If the timer wins,
/// `action` is cancelled and this resolves to an error; otherwise the
/// timer is released early and `action`'s own outcome is returned.
pub async fn timeout<C, T, F, Fut>(scope: &Scope<C>, ms: u64, action: F) -> Result<T, AsyncError>
where
    C: AsyncCapability + Clone + 'static,
    T: Send + 'static,
    F: FnOnce(Scope<std::sync::Arc<crate::cancelable::Cancelable<C>>>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<T, AsyncError>> + Send + 'static,
{
    let nested = scope.nested();
    let nested_for_action = nested.clone();
    let mut action_task = tokio::spawn(async move { action(nested_for_action).await });

    let (wait_handle, wait_fut) = cancelable_wait(scope.clone(), ms);
    tokio::pin!(wait_fut);

    tokio::select! {
        biased;
        joined = &mut action_task => {
            wait_handle.wake();
            match joined {
                Ok(result) => result,
                Err(join_err) => Err(AsyncError::User(anyhow::anyhow!(join_err))),
            }
        }
        _ = &mut wait_fut => {
            nested.cancel(None);
            let _ = action_task.await;
            Err(AsyncError::User(anyhow::anyhow!("operation timed out after {ms}ms")))
        }
    }
}

/// Run `cleanup` if `action` resolves with a cancellation error; pass its
/// outcome through unchanged either way.
pub async fn on_cancel<T>(
    action: impl std::future::Future<Output = Result<T, AsyncError>>,
    cleanup: impl FnOnce(),
) -> Result<T, AsyncError> {
    let result = action.await;
    if let Err(err) = &result {
        if err.is_cancel() {
            cleanup();
        }
    }
    result
}

/// Suspend forever on the reserved exit wid. Used to model a strand that
/// waits on something which, by construction, never resolves — it can
/// only be retired by the surrounding task being dropped or aborted.
pub async fn exit() -> std::convert::Infallible {
    std::future::pending().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{action, wait::wait};
    use crate::mock_timer::MockTimerHost;
    use crate::root::RootHandle;
    use interlace_types::TimerHost;
    use std::sync::Arc;

    #[tokio::test(flavor = "current_thread")]
    async fn firstof_returns_the_fastest_branch_and_cancels_the_rest() {
        let mock = Arc::new(MockTimerHost::new());
        let scope = Scope::new(Arc::new(RootHandle::new()), mock.clone() as Arc<dyn TimerHost>);

        let task = tokio::spawn({
            let scope = scope.clone();
            async move {
                firstof(
                    &scope,
                    vec![
                        action(|s| async move {
                            wait(&s, 5).await?;
                            Ok::<_, AsyncError>("fast")
                        }),
                        action(|s| async move {
                            wait(&s, 1_000).await?;
                            Ok::<_, AsyncError>("slow")
                        }),
                    ],
                )
                .await
            }
        });

        tokio::task::yield_now().await;
        mock.advance(5);
        assert_eq!(task.await.unwrap().unwrap(), "fast");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn timeout_wins_when_action_is_too_slow() {
        let mock = Arc::new(MockTimerHost::new());
        let scope = Scope::new(Arc::new(RootHandle::new()), mock.clone() as Arc<dyn TimerHost>);

        let task = tokio::spawn({
            let scope = scope.clone();
            async move {
                timeout(&scope, 10, |s| async move {
                    wait(&s, 1_000).await?;
                    Ok::<_, AsyncError>(())
                })
                .await
            }
        });

        tokio::task::yield_now().await;
        mock.advance(10);
        let out = task.await.unwrap();
        assert!(out.is_err());
        assert!(!out.unwrap_err().is_cancel());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn timeout_passes_through_a_fast_success() {
        let mock = Arc::new(MockTimerHost::new());
        let scope = Scope::new(Arc::new(RootHandle::new()), mock.clone() as Arc<dyn TimerHost>);

        let task = tokio::spawn({
            let scope = scope.clone();
            async move { timeout(&scope, 1_000, |_s| async move { Ok::<_, AsyncError>(5) }).await }
        });

        assert_eq!(task.await.unwrap().unwrap(), 5);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn on_cancel_runs_cleanup_only_when_cancelled() {
        let ran = Arc::new(std::sync::Mutex::new(false));
        let r = ran.clone();
        let out = on_cancel(async { Err::<(), _>(interlace_types::cancel_exn()) }, move || {
            *r.lock().unwrap() = true;
        })
        .await;
        assert!(out.is_err());
        assert!(*ran.lock().unwrap());

        let ran2 = Arc::new(std::sync::Mutex::new(false));
        let r2 = ran2.clone();
        let out2 = on_cancel(async { Ok::<_, AsyncError>(()) }, move || {
            *r2.lock().unwrap() = true;
        })
        .await;
        assert!(out2.is_ok());
        assert!(!*ran2.lock().unwrap());
    }
}
