//! Session handles and the session provider seam.
//!
//! Authentication proper happens outside this crate; a [`SessionProvider`]
//! turns an alias into a ready-to-use [`Session`] bound to one remote
//! endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use buildcheck_types::RecordId;

use crate::error::{self, StoreError};
use crate::store::RecordStore;

/// An open session against one remote endpoint.
#[derive(Clone)]
pub struct Session {
    pub alias: String,
    pub username: String,
    /// The authenticated user's record identifier; stamped as the owner of
    /// rows this session writes.
    pub user_id: RecordId,
    pub store: Arc<dyn RecordStore>,
}

impl Session {
    #[must_use]
    pub fn new(
        alias: impl Into<String>,
        username: impl Into<String>,
        user_id: RecordId,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            alias: alias.into(),
            username: username.into(),
            user_id,
            store,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("alias", &self.alias)
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Opens sessions by alias. Failure is fatal at run setup.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open a session for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownAlias`] for an unconfigured alias, or
    /// [`StoreError::Backend`] when the endpoint can't be reached.
    async fn connect(&self, alias: &str) -> error::Result<Session>;
}

/// Provider over a fixed alias-to-session map, used by tests and fixture
/// workspaces.
#[derive(Default)]
pub struct StaticSessionProvider {
    sessions: HashMap<String, Session>,
}

impl StaticSessionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its alias.
    pub fn register(&mut self, session: Session) {
        self.sessions.insert(session.alias.clone(), session);
    }

    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.register(session);
        self
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn connect(&self, alias: &str) -> error::Result<Session> {
        self.sessions
            .get(alias)
            .cloned()
            .ok_or_else(|| StoreError::UnknownAlias(alias.to_string()))
    }
}
