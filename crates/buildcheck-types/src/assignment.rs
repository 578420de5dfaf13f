//! Job assignment configuration.

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Write strategy a job applies to its payload records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    /// Write the payload as new rows.
    Insert,
    /// Delete this assignment's previous rows, then insert.
    Replace,
    /// Match on the row's own identifier; rows without one insert.
    Upsert,
}

impl WriteOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "Insert",
            Self::Replace => "Replace",
            Self::Upsert => "Upsert",
        }
    }
}

impl std::fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw operation value as read from an assignment row.
///
/// Kept unparsed until the result engine dispatches on it, so a bad value
/// fails the job at dispatch time rather than when the assignment is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSpec(String);

impl OperationSpec {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to a [`WriteOperation`], or `None` for an unknown value.
    #[must_use]
    pub fn parse(&self) -> Option<WriteOperation> {
        match self.0.as_str() {
            "Insert" => Some(WriteOperation::Insert),
            "Replace" => Some(WriteOperation::Replace),
            "Upsert" => Some(WriteOperation::Upsert),
            _ => None,
        }
    }
}

impl<S: Into<String>> From<S> for OperationSpec {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// One configured job for an application. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAssignment {
    /// Identifier of the assignment row itself.
    pub assignment_id: RecordId,
    /// Identifier of the job definition row.
    pub job_id: RecordId,
    /// Declared job name, resolved through the registry.
    pub job_name: String,
    /// Requested write strategy.
    pub operation: OperationSpec,
}
