//! Store error types.

/// Errors produced by [`RecordStore`](crate::RecordStore) and
/// [`SessionProvider`](crate::SessionProvider) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying backend failure (transport, protocol, storage).
    #[error("store backend error: {0}")]
    Backend(String),

    /// The named collection does not exist on this store.
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    /// No session is configured for the requested alias.
    #[error("no session configured for alias '{0}'")]
    UnknownAlias(String),

    /// Internal mutex was poisoned by a panicked thread.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StoreError>;
