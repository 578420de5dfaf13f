//! In-memory [`RecordStore`] backend.
//!
//! Backs fixture workspaces and tests. Uses a single `Mutex` around the
//! collection map; assigns sequential identifiers and stamps the owner
//! field on rows written without one, mirroring how a hosted record store
//! attributes rows to the authenticated user.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use buildcheck_types::record::fields;
use buildcheck_types::{Record, RecordId};

use crate::error::{self, StoreError};
use crate::query::{QueryResponse, QuerySpec};
use crate::response::{WriteError, WriteResponse, WriteResult};
use crate::store::{CollectionSchema, RecordStore};

#[derive(Default)]
struct Inner {
    next_id: u64,
    collections: HashMap<String, Vec<Record>>,
    schemas: HashMap<String, Vec<String>>,
    failing_record_types: HashSet<String>,
}

/// In-memory record store.
pub struct MemoryStore {
    user_id: RecordId,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store owned by `user_id`.
    #[must_use]
    pub fn new(user_id: impl Into<RecordId>) -> Self {
        Self {
            user_id: user_id.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Load rows into a collection, assigning identifiers to rows that
    /// don't carry one.
    pub fn seed(&self, collection: &str, records: impl IntoIterator<Item = Record>) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for mut record in records {
            if record.id.is_none() {
                inner.next_id += 1;
                record.id = Some(RecordId::new(format!("gen-{}", inner.next_id)));
            }
            inner
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(record);
        }
    }

    /// Declare the field list `describe` reports for a collection.
    pub fn declare_schema<I, S>(&self, collection: &str, field_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.schemas.insert(
            collection.to_string(),
            field_names.into_iter().map(Into::into).collect(),
        );
    }

    /// Test hook: report row-level write failure for any row tagged with
    /// this record-type identifier.
    pub fn fail_writes_for_record_type(&self, record_type_id: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.failing_record_types.insert(record_type_id.into());
    }

    /// Snapshot of a collection's rows.
    #[must_use]
    pub fn rows(&self, collection: &str) -> Vec<Record> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.collections.get(collection).cloned().unwrap_or_default()
    }

    fn lock(&self) -> error::Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn injected_failure(inner: &Inner, record: &Record) -> Option<WriteResult> {
        let rt = record.get_str(fields::RECORD_TYPE_ID)?;
        inner.failing_record_types.contains(rt).then(|| {
            WriteResult::failed(WriteError::new("WRITE_FAILED", "injected write failure"))
        })
    }

    fn project(record: &Record, field_names: Option<&Vec<String>>) -> Record {
        let Some(names) = field_names else {
            return record.clone();
        };
        let mut out = Record::new();
        out.id = record.id.clone();
        for name in names {
            if name == fields::ID {
                continue;
            }
            if let Some(value) = record.get(name) {
                out.set(name, value.clone());
            }
        }
        out
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(&self, spec: &QuerySpec) -> error::Result<QueryResponse> {
        let inner = self.lock()?;
        let rows = inner.collections.get(&spec.collection);
        let matched: Vec<&Record> = rows
            .into_iter()
            .flatten()
            .filter(|r| spec.filter.as_ref().is_none_or(|f| f.matches(r)))
            .collect();
        let total = matched.len();
        let records = matched
            .into_iter()
            .take(spec.limit.unwrap_or(usize::MAX))
            .map(|r| Self::project(r, spec.fields.as_ref()))
            .collect();
        Ok(QueryResponse { records, total })
    }

    async fn insert(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> error::Result<WriteResponse> {
        let mut inner = self.lock()?;
        let mut results = Vec::with_capacity(records.len());
        for mut record in records {
            if let Some(failure) = Self::injected_failure(&inner, &record) {
                results.push(failure);
                continue;
            }
            inner.next_id += 1;
            let id = RecordId::new(format!("gen-{}", inner.next_id));
            record.id = Some(id.clone());
            if record.get(fields::OWNER_ID).is_none() {
                record.set(fields::OWNER_ID, self.user_id.as_str());
            }
            inner
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(record);
            results.push(WriteResult::ok(id));
        }
        Ok(WriteResponse(results))
    }

    async fn update(&self, collection: &str, record: Record) -> error::Result<WriteResponse> {
        let mut inner = self.lock()?;
        if let Some(failure) = Self::injected_failure(&inner, &record) {
            return Ok(failure.into());
        }
        let Some(id) = record.id.clone() else {
            return Ok(WriteResult::failed(WriteError::new(
                "MISSING_ID",
                "update requires a record identifier",
            ))
            .into());
        };
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| r.id.as_ref() == Some(&id)));
        match existing {
            Some(row) => {
                for (field, value) in record.fields {
                    row.set(&field, value);
                }
                Ok(WriteResult::ok(id).into())
            }
            None => Ok(WriteResult::failed(WriteError::new(
                "NOT_FOUND",
                format!("no row '{id}' in '{collection}'"),
            ))
            .into()),
        }
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<Record>,
        match_field: &str,
    ) -> error::Result<WriteResponse> {
        if match_field != fields::ID {
            return Err(StoreError::Backend(format!(
                "memory store only upserts on '{}', got '{match_field}'",
                fields::ID
            )));
        }
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let response = if record.id.is_some() {
                let updated = self.update(collection, record.clone()).await?;
                // A missing match falls through to insert.
                if updated.all_succeeded() {
                    updated
                } else {
                    let mut fresh = record;
                    fresh.id = None;
                    self.insert(collection, vec![fresh]).await?
                }
            } else {
                self.insert(collection, vec![record]).await?
            };
            results.extend(response.0);
        }
        Ok(WriteResponse(results))
    }

    async fn delete(&self, collection: &str, ids: Vec<RecordId>) -> error::Result<WriteResponse> {
        let mut inner = self.lock()?;
        let rows = inner.collections.entry(collection.to_string()).or_default();
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let before = rows.len();
            rows.retain(|r| r.id.as_ref() != Some(&id));
            if rows.len() < before {
                results.push(WriteResult::ok(id));
            } else {
                results.push(WriteResult::failed(WriteError::new(
                    "NOT_FOUND",
                    format!("no row '{id}' in '{collection}'"),
                )));
            }
        }
        Ok(WriteResponse(results))
    }

    async fn describe(&self, collection: &str) -> error::Result<CollectionSchema> {
        let inner = self.lock()?;
        if let Some(declared) = inner.schemas.get(collection) {
            return Ok(CollectionSchema {
                fields: declared.clone(),
            });
        }
        let mut names = BTreeSet::new();
        for record in inner.collections.get(collection).into_iter().flatten() {
            names.extend(record.fields.keys().cloned());
        }
        Ok(CollectionSchema {
            fields: names.into_iter().collect(),
        })
    }
}
