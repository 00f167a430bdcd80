use thiserror::Error;

/// Errors surfaced by a wait invocation.
///
/// Fatal deal-side classifications (`Rejected`, `Failing`, `Errored`) and
/// collaborator failures (`Transport`) abort the current wait immediately and
/// are never retried here; retry, if desired, is the caller's responsibility
/// via re-invocation.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The deal proposal was rejected by the provider.
    #[error("deal proposal rejected")]
    Rejected,

    /// The deal entered the failing state.
    #[error("deal failing")]
    Failing,

    /// The deal entered the error state, carrying its diagnostic message.
    #[error("deal errored: {0}")]
    Errored(String),

    /// The deadline elapsed before any terminal classification was observed.
    #[error("timed out waiting for deal update")]
    Timeout,

    /// A collaborator query or subscription failed; passed through opaquely.
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for operations that can fail with a [`WatchError`].
pub type WatchResult<T> = Result<T, WatchError>;
