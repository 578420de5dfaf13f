//! Record store boundary for buildcheck.
//!
//! [`RecordStore`] defines the contract against the remote record store;
//! [`MemoryStore`] is the in-process backend used by tests and fixture
//! workspaces. The write-response adapter in [`response`] normalizes the
//! store's single-row and per-row write shapes into one uniform view.

pub mod error;
pub mod memory;
pub mod query;
pub mod response;
pub mod session;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Filter, QueryResponse, QuerySpec};
pub use response::{IndexedWriteError, WriteError, WriteResponse, WriteResult};
pub use session::{Session, SessionProvider, StaticSessionProvider};
pub use store::{CollectionSchema, RecordStore};
