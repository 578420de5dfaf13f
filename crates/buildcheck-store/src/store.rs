//! Record store trait definition.

use async_trait::async_trait;

use buildcheck_types::{Record, RecordId};

use crate::error;
use crate::query::{QueryResponse, QuerySpec};
use crate::response::WriteResponse;

/// Field names a collection exposes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSchema {
    pub fields: Vec<String>,
}

/// Contract against the remote record store.
///
/// These calls are the engine's only suspension points; implementations
/// must be `Send + Sync` for use behind `Arc<dyn RecordStore>` by
/// concurrently running jobs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch records matching a query descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) on transport or backend
    /// failure. Row-level problems are not errors; they simply don't match.
    async fn query(&self, spec: &QuerySpec) -> error::Result<QueryResponse>;

    /// Write new rows. The response carries one outcome per input row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) on transport or backend
    /// failure; row-level write failures are reported in the response.
    async fn insert(&self, collection: &str, records: Vec<Record>)
        -> error::Result<WriteResponse>;

    /// Update one existing row, matched by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) on transport or backend
    /// failure; a missing row is a row-level failure in the response.
    async fn update(&self, collection: &str, record: Record) -> error::Result<WriteResponse>;

    /// Write rows matched on `match_field`: existing rows update, rows
    /// without a match value insert.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) on transport or backend
    /// failure; row-level write failures are reported in the response.
    async fn upsert(
        &self,
        collection: &str,
        records: Vec<Record>,
        match_field: &str,
    ) -> error::Result<WriteResponse>;

    /// Delete rows by identifier. The response carries one outcome per id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) on transport or backend
    /// failure.
    async fn delete(&self, collection: &str, ids: Vec<RecordId>) -> error::Result<WriteResponse>;

    /// Describe a collection's fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) on transport or backend
    /// failure.
    async fn describe(&self, collection: &str) -> error::Result<CollectionSchema>;
}
