pub mod capability;
pub mod cancelable;
pub mod combinators;
pub mod mock_timer;
pub mod root;
pub mod scope;
pub mod tokio_timer;
pub mod wrappers;

pub use capability::{AsyncCapability, Resume};
pub use cancelable::Cancelable;
pub use combinators::{
    Action, BoxFuture, ForkHandle, Promise, WaitHandle, action, cancelable_wait, exit, firstof,
    fork, interleaved, interleavedx, on_cancel, timeout, wait, yield_now,
};
pub use mock_timer::MockTimerHost;
pub use root::RootHandle;
pub use scope::Scope;
pub use tokio_timer::TokioTimerHost;
pub use wrappers::{await0, await1, await_exn0, await_exn1, awaitx, awaitx0, awaitx1};

pub use interlace_types::{AsyncError, ErrorTag, TimerCallback, TimerHost, TimerId, Wid, cancel_exn};
