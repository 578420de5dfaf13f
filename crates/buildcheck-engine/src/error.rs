//! Engine error taxonomy.
//!
//! `Config`, `StoreWrite`, and `Session` are the typed failure classes of a
//! run; `Store` wraps transport failures from the record store and
//! `Infrastructure` wraps opaque host-side errors (task joins and similar
//! plumbing).

use buildcheck_store::StoreError;

/// Categorized engine error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A precondition is unmet: no build found, loaders run out of order,
    /// unknown job name or operation. Fatal where raised during setup.
    #[error("{0}")]
    Config(String),

    /// A record store write reported partial or total failure on a summary
    /// row. Fatal for the job or run whose summary it is.
    #[error("{0}")]
    StoreWrite(String),

    /// Session resolution failed. Fatal at run setup.
    #[error("session error: {0}")]
    Session(String),

    /// Transport or backend failure from the record store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Host-side plumbing failure (task join, runtime).
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn store_write(message: impl Into<String>) -> Self {
        Self::StoreWrite(message.into())
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }
}

/// Convenience alias used throughout this crate.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
