//! Query descriptor builder.
//!
//! [`QuerySpec`] describes what to fetch; the store decides how. When no
//! field list is given, [`QuerySpec::resolve_fields`] fills it from the
//! collection's schema, falling back to the identifier field alone when the
//! schema reports nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use buildcheck_types::record::fields;
use buildcheck_types::Record;

use crate::error;
use crate::store::RecordStore;

/// Filter expression over record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Every sub-filter matches.
    And(Vec<Filter>),
}

impl Filter {
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Evaluate against one record. The identifier field is matched against
    /// `record.id`, everything else against `record.fields`.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq { field, value } => {
                if field == fields::ID {
                    return record
                        .id
                        .as_ref()
                        .is_some_and(|id| Value::from(id.as_str()) == *value);
                }
                record.get(field) == Some(value)
            }
            Self::And(filters) => filters.iter().all(|f| f.matches(record)),
        }
    }
}

/// Declarative description of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub collection: String,
    /// Projection; `None` means "fill from the collection schema".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl QuerySpec {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: None,
            filter: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fill an omitted field list from the collection's schema.
    ///
    /// Falls back to `["id"]` when the schema reports no fields. A spec
    /// that already names its fields is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`](crate::StoreError) if `describe` fails.
    pub async fn resolve_fields(mut self, store: &dyn RecordStore) -> error::Result<Self> {
        if self.fields.is_some() {
            return Ok(self);
        }
        let schema = store.describe(&self.collection).await?;
        let mut names = schema.fields;
        if names.is_empty() {
            names.push(fields::ID.to_string());
        }
        self.fields = Some(names);
        Ok(self)
    }
}

/// Result of one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub records: Vec<Record>,
    /// Total matching rows, before `limit` was applied.
    pub total: usize,
}
