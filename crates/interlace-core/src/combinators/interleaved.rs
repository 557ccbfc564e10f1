use std::collections::HashMap;
use std::sync::Arc;

use interlace_types::AsyncError;
use tokio::task::{Id, JoinSet};

use crate::capability::AsyncCapability;
use crate::scope::Scope;

use super::Action;

/// Spawn every action into `set`, returning a map from each spawned
/// task's [`Id`] back to its position in `actions` — needed because a
/// panicking task surfaces as a bare `JoinError` with no return value to
/// carry an index of its own.
fn spawn_indexed<C, T>(
    set: &mut JoinSet<Result<T, AsyncError>>,
    nested: &Scope<Arc<crate::cancelable::Cancelable<C>>>,
    actions: Vec<Action<C, T>>,
) -> HashMap<Id, usize>
where
    C: AsyncCapability + Clone + 'static,
    T: Send + 'static,
{
    let mut ids = HashMap::with_capacity(actions.len());
    for (idx, action) in actions.into_iter().enumerate() {
        let abort = set.spawn(action(nested.clone()));
        ids.insert(abort.id(), idx);
    }
    ids
}

/// Run every action in `actions` concurrently and wait for all of them.
///
/// All actions share one cancellation scope: the first to fail cancels
/// every sibling still pending (at its next await boundary) and that
/// first error is returned. Results are returned in the same order the
/// actions were given, regardless of which finishes first.
pub async fn interleaved<C, T>(scope: &Scope<C>, actions: Vec<Action<C, T>>) -> Result<Vec<T>, AsyncError>
where
    C: AsyncCapability + Clone + 'static,
    T: Send + 'static,
{
    let nested = scope.nested();
    let mut set = JoinSet::new();
    let count = actions.len();
    let ids = spawn_indexed(&mut set, &nested, actions);

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(count).collect();
    let mut first_err = None;
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, Ok(value))) => slots[ids[&id]] = Some(value),
            Ok((_, Err(err))) => {
                if first_err.is_none() {
                    nested.cancel(None);
                    first_err = Some(err);
                }
            }
            Err(join_err) => {
                if first_err.is_none() {
                    nested.cancel(None);
                    first_err = Some(AsyncError::User(anyhow::anyhow!(join_err)));
                }
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        // every slot is filled when no error occurred: every task above
        // either filled its slot or tripped `first_err`.
        None => Ok(slots.into_iter().map(|v| v.expect("slot filled")).collect()),
    }
}

/// Like [`interleaved`], but never short-circuits: every action runs to
/// completion and its individual outcome (success or error) is reported,
/// in the same order the actions were given.
pub async fn interleavedx<C, T>(scope: &Scope<C>, actions: Vec<Action<C, T>>) -> Vec<Result<T, AsyncError>>
where
    C: AsyncCapability + Clone + 'static,
    T: Send + 'static,
{
    let nested = scope.nested();
    let mut set = JoinSet::new();
    let count = actions.len();
    let ids = spawn_indexed(&mut set, &nested, actions);

    let mut slots: Vec<Option<Result<T, AsyncError>>> =
        std::iter::repeat_with(|| None).take(count).collect();
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => slots[ids[&id]] = Some(outcome),
            Err(join_err) => {
                let idx = ids[&join_err.id()];
                slots[idx] = Some(Err(AsyncError::User(anyhow::anyhow!(join_err))));
            }
        }
    }
    slots.into_iter().map(|v| v.expect("slot filled")).collect()
}
