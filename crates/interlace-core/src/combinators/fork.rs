use std::future::Future;
use std::sync::Arc;

use interlace_types::AsyncError;

use crate::capability::AsyncCapability;
use crate::cancelable::Cancelable;
use crate::scope::Scope;

/// A strand spawned by [`fork`]: runs concurrently with its parent from
/// the moment `fork` returns, under its own cancellation scope.
pub struct ForkHandle<C, T> {
    cancel_scope: Scope<Arc<Cancelable<C>>>,
    join: tokio::task::JoinHandle<Result<T, AsyncError>>,
}

impl<C: AsyncCapability, T> ForkHandle<C, T> {
    /// Cancel every await currently pending inside the forked strand. Has
    /// no effect on work the strand isn't suspended on at the moment.
    pub fn cancel(&self) {
        self.cancel_scope.cancel(None);
    }

    /// Wait for the forked strand to finish and take its result. A panic
    /// inside the strand surfaces as [`AsyncError::User`] rather than
    /// propagating as a Rust panic here.
    pub async fn join(self) -> Result<T, AsyncError> {
        match self.join.await {
            Ok(result) => result,
            Err(join_err) => Err(AsyncError::User(anyhow::anyhow!(join_err))),
        }
    }
}

/// Start `action` as an independent concurrent strand and return
/// immediately with a [`ForkHandle`] to cancel or join it later.
pub fn fork<C, T, F, Fut>(scope: &Scope<C>, action: F) -> ForkHandle<C, T>
where
    C: AsyncCapability + Clone + 'static,
    T: Send + 'static,
    F: FnOnce(Scope<Arc<Cancelable<C>>>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, AsyncError>> + Send + 'static,
{
    let nested = scope.nested();
    let nested_for_task = nested.clone();
    let join = tokio::spawn(async move { action(nested_for_task).await });
    ForkHandle {
        cancel_scope: nested,
        join,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::wait::wait;
    use crate::mock_timer::MockTimerHost;
    use crate::root::RootHandle;
    use interlace_types::TimerHost;

    #[tokio::test(flavor = "current_thread")]
    async fn forked_strand_runs_concurrently_and_joins() {
        let mock = Arc::new(MockTimerHost::new());
        let scope = Scope::new(Arc::new(RootHandle::new()), mock.clone() as Arc<dyn TimerHost>);

        let handle = fork(&scope, |s| async move {
            wait(&s, 5).await?;
            Ok::<_, AsyncError>(11)
        });

        mock.advance(5);
        assert_eq!(handle.join().await.unwrap(), 11);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn canceling_a_fork_before_it_resolves_yields_cancel_error() {
        let mock = Arc::new(MockTimerHost::new());
        let scope = Scope::new(Arc::new(RootHandle::new()), mock.clone() as Arc<dyn TimerHost>);

        let handle = fork(&scope, |s| async move {
            wait(&s, 1_000).await?;
            Ok::<_, AsyncError>(0)
        });

        tokio::task::yield_now().await;
        handle.cancel();
        let out = handle.join().await;
        assert!(matches!(out, Err(AsyncError::Cancel)));
    }
}
