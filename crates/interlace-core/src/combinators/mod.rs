mod firstof;
mod fork;
mod interleaved;
pub mod promise;
mod wait;

pub use firstof::{exit, firstof, on_cancel, timeout};
pub use fork::{ForkHandle, fork};
pub use interleaved::{interleaved, interleavedx};
pub use promise::Promise;
pub use wait::{WaitHandle, cancelable_wait, wait, yield_now};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use interlace_types::AsyncError;

use crate::cancelable::Cancelable;
use crate::scope::Scope;

/// A boxed concurrent branch as used by [`interleaved`], [`interleavedx`],
/// and [`firstof`]: these combinators hold heterogeneous branches in one
/// `Vec`, so each branch is boxed rather than carried as a bare generic
/// type parameter.
pub type Action<C, T> =
    Box<dyn FnOnce(Scope<Arc<Cancelable<C>>>) -> BoxFuture<Result<T, AsyncError>> + Send>;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Box an async closure into an [`Action`]. A thin convenience for call
/// sites building a `Vec<Action<C, T>>` by hand.
pub fn action<C, T, F, Fut>(f: F) -> Action<C, T>
where
    C: 'static,
    T: 'static,
    F: FnOnce(Scope<Arc<Cancelable<C>>>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, AsyncError>> + Send + 'static,
{
    Box::new(move |scope| Box::pin(f(scope)))
}
