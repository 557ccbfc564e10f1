use thiserror::Error;

/// Coarse category for an [`AsyncError`], mirroring the host's exception
/// taxonomy extension: user code matches on the tag without downcasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorTag {
    /// Produced only by a `cancel` delivered to a pending await.
    Cancel,
    /// Everything else: an error raised by user action code.
    User,
}

/// The error propagated through a suspended strand.
///
/// `Cancel` is the distinguished, pattern-matchable cancellation outcome
/// described in the spec's error taxonomy; `User` carries whatever the
/// action raised. `AlreadyResolved` is specific to [`crate`]-level promise
/// misuse and is delivered to the caller of `resolve`, never to an
/// `await`-er.
#[derive(Debug, Error)]
pub enum AsyncError {
    #[error("Cancel")]
    Cancel,
    #[error(transparent)]
    User(#[from] anyhow::Error),
    #[error("promise was already resolved")]
    AlreadyResolved,
}

impl AsyncError {
    /// Classify this error the way user code is expected to: by tag, not
    /// by downcasting.
    pub fn tag(&self) -> ErrorTag {
        match self {
            AsyncError::Cancel => ErrorTag::Cancel,
            AsyncError::User(_) | AsyncError::AlreadyResolved => ErrorTag::User,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, AsyncError::Cancel)
    }
}

/// The canonical cancellation error instance (`cancel-exn` in the spec).
///
/// `AsyncError::Cancel` carries no payload, so this is just a constructor;
/// kept as a named function so call sites read the same as the spec's
/// `cancel-exn`.
pub fn cancel_exn() -> AsyncError {
    AsyncError::Cancel
}
