//! Generic record model for the remote record store.
//!
//! The engine never hard-codes a host platform's schema; records are
//! field-name to JSON-value maps, and the canonical collection and field
//! names the engine relies on live in the [`collections`] and [`fields`]
//! modules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque record identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new record identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for RecordId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// One row of a store collection.
///
/// `id` is assigned by the store on insert; `fields` holds everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with its `name` field set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let mut rec = Self::default();
        rec.set(fields::NAME, name.into());
        rec
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Raw field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value as a string slice, if present and a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Field value as a bool, if present and a bool.
    #[must_use]
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Field value as an i64, if present and numeric.
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// The record's `name` field.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str(fields::NAME)
    }
}

/// Canonical collection names the engine reads and writes.
pub mod collections {
    /// Build / release rows, one per named build.
    pub const BUILDS: &str = "builds";
    /// Component rows linked to a build.
    pub const BUILD_COMPONENTS: &str = "build_components";
    /// Release-environment link rows used to resolve a deployment reference.
    pub const BUILD_ENVIRONMENTS: &str = "build_environments";
    /// Job assignment configuration rows, one per (application, job) pair.
    pub const JOB_ASSIGNMENTS: &str = "job_assignments";
    /// Record-type rows tagging result records.
    pub const RECORD_TYPES: &str = "record_types";
    /// All analysis output: build summaries, job summaries, payload rows.
    pub const ANALYSIS_RESULTS: &str = "analysis_results";
}

/// Canonical field names.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const PASSED: &str = "passed";
    pub const MESSAGE: &str = "message";
    pub const SHORT_MESSAGE: &str = "short_message";
    pub const EXEC_TIME_MS: &str = "exec_time_ms";
    pub const TOTAL_TIME_MS: &str = "total_time_ms";
    pub const PARENT_ID: &str = "parent_id";
    pub const BUILD_ID: &str = "build_id";
    pub const APP_ID: &str = "app_id";
    pub const APP_NAME: &str = "app_name";
    pub const JOB_ID: &str = "job_id";
    pub const JOB_NAME: &str = "job_name";
    pub const ASSIGNMENT_ID: &str = "assignment_id";
    pub const RECORD_TYPE_ID: &str = "record_type_id";
    pub const OWNER_ID: &str = "owner_id";
    pub const OPERATION: &str = "operation";
    pub const COLLECTION: &str = "collection";
    pub const DEV_PREFIX: &str = "dev_prefix";
    pub const ALLOWED_PREFIX: &str = "allowed_prefix";
    pub const REFERENCE: &str = "reference";
    pub const BUILD_NAME: &str = "build_name";
    pub const TARGET_ALIAS: &str = "target_alias";
    pub const COMPONENT_TYPE: &str = "component_type";
    pub const STATUS: &str = "status";
}

/// Developer names of the result record types.
pub mod record_types {
    /// The run-level aggregate row, parent of every job summary.
    pub const BUILD_SUMMARY: &str = "Build_Summary";
    /// One row per executed job.
    pub const JOB_SUMMARY: &str = "Job_Summary";
    /// Single-record payload template.
    pub const JOB_RESULT_SINGLE: &str = "Job_Result_Single";
    /// Multi-record payload template.
    pub const JOB_RESULT_MULTI: &str = "Job_Result_Multi";
}
