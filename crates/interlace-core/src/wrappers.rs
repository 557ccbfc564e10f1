use interlace_types::AsyncError;

use crate::capability::{AsyncCapability, Resume};

/// `setup` gets a zero-argument callback; calling it resolves the await
/// with `()`. Matches host APIs shaped like `on('end', cb)`.
pub async fn await0<C: AsyncCapability>(
    cap: &C,
    setup: impl FnOnce(Box<dyn FnOnce() + Send>) + Send + 'static,
) -> Result<(), AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, move |resume: Resume<()>| {
        setup(Box::new(move || resume.resume(Ok(()), true)));
    })
    .await
}

/// `setup` gets a one-argument callback; the argument becomes the
/// await's resolved value. Matches host APIs shaped like
/// `readFile(path, cb)` where `cb` only ever carries a value.
pub async fn await1<C: AsyncCapability, T: Send + 'static>(
    cap: &C,
    setup: impl FnOnce(Box<dyn FnOnce(T) + Send>) + Send + 'static,
) -> Result<T, AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, move |resume: Resume<T>| {
        setup(Box::new(move |value| resume.resume(Ok(value), true)));
    })
    .await
}

/// Raw multi-invocation form: `setup` receives the [`Resume`] sink
/// directly and may call it any number of times before the one marked
/// `done`. This is [`AsyncCapability::await_op`] under a name matching
/// its sibling wrappers.
pub async fn awaitx<C: AsyncCapability, T: Send + 'static>(
    cap: &C,
    setup: impl FnOnce(Resume<T>) + Send + 'static,
) -> Result<T, AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, setup).await
}

/// Multi-invocation, zero-argument form: every call to the callback before
/// the last is a liveness ping, only the final one (`last = true`)
/// resolves the await.
pub async fn awaitx0<C: AsyncCapability>(
    cap: &C,
    setup: impl FnOnce(Box<dyn Fn(bool) + Send>) + Send + 'static,
) -> Result<(), AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, move |resume: Resume<()>| {
        setup(Box::new(move |last| resume.resume(Ok(()), last)));
    })
    .await
}

/// Multi-invocation, one-argument form: each call carries the latest
/// value; only the call marked `last = true` resolves the await with it.
pub async fn awaitx1<C: AsyncCapability, T: Send + 'static>(
    cap: &C,
    setup: impl FnOnce(Box<dyn Fn(T, bool) + Send>) + Send + 'static,
) -> Result<T, AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, move |resume: Resume<T>| {
        setup(Box::new(move |value, last| resume.resume(Ok(value), last)));
    })
    .await
}

/// Node-style err-first callback, zero-value form: `None` resolves `()`,
/// `Some(err)` rejects the await with it.
pub async fn await_exn0<C: AsyncCapability>(
    cap: &C,
    setup: impl FnOnce(Box<dyn FnOnce(Option<AsyncError>) + Send>) + Send + 'static,
) -> Result<(), AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, move |resume: Resume<()>| {
        setup(Box::new(move |err| match err {
            None => resume.resume(Ok(()), true),
            Some(e) => resume.resume(Err(e), true),
        }));
    })
    .await
}

/// Node-style err-first callback carrying a value on success.
pub async fn await_exn1<C: AsyncCapability, T: Send + 'static>(
    cap: &C,
    setup: impl FnOnce(Box<dyn FnOnce(Result<T, AsyncError>) + Send>) + Send + 'static,
) -> Result<T, AsyncError> {
    let wid = cap.await_id();
    cap.await_op(wid, move |resume: Resume<T>| {
        setup(Box::new(move |res| resume.resume(res, true)));
    })
    .await
}
