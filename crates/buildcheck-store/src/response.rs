//! Write-response normalization.
//!
//! Store backends report bulk writes either as a single outcome or as one
//! outcome per input row. [`WriteResponse`] always carries one
//! [`WriteResult`] per row, and the adapter methods here reduce that to the
//! uniform success/error view the engine consumes.

use serde::{Deserialize, Serialize};

use buildcheck_types::RecordId;

/// One error reported for a failed row write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteError {
    pub status_code: String,
    pub message: String,
    /// Field names the error applies to, when the backend reports them.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl WriteError {
    #[must_use]
    pub fn new(status_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code: status_code.into(),
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

/// Outcome of writing one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResult {
    pub success: bool,
    /// Identifier assigned to the row, when the write succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<WriteError>,
}

impl WriteResult {
    /// A successful row write with its assigned identifier.
    #[must_use]
    pub fn ok(id: RecordId) -> Self {
        Self {
            success: true,
            id: Some(id),
            errors: Vec::new(),
        }
    }

    /// A failed row write with one error.
    #[must_use]
    pub fn failed(error: WriteError) -> Self {
        Self {
            success: false,
            id: None,
            errors: vec![error],
        }
    }
}

/// A [`WriteError`] tagged with the index of the input row it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedWriteError {
    pub index: usize,
    pub error: WriteError,
}

/// Normalized response of a write call: one result per input row.
///
/// Single-row calls produce a one-element response, so callers never
/// branch on the backend's response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteResponse(pub Vec<WriteResult>);

impl WriteResponse {
    /// `true` when every row write succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.0.iter().all(|r| r.success)
    }

    /// Every error across all rows, tagged with its row index.
    #[must_use]
    pub fn indexed_errors(&self) -> Vec<IndexedWriteError> {
        let mut out = Vec::new();
        for (index, result) in self.0.iter().enumerate() {
            if result.success {
                continue;
            }
            for error in &result.errors {
                out.push(IndexedWriteError {
                    index,
                    error: error.clone(),
                });
            }
        }
        out
    }

    /// Human-readable failure message: empty when every row succeeded,
    /// otherwise one line per error.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let mut message = String::new();
        for e in self.indexed_errors() {
            message.push_str(&format!(
                "\nindex: {} - {}:{}",
                e.index, e.error.status_code, e.error.message
            ));
        }
        message
    }

    /// Identifier assigned to the first row, if any.
    #[must_use]
    pub fn first_id(&self) -> Option<&RecordId> {
        self.0.first().and_then(|r| r.id.as_ref())
    }
}

impl From<WriteResult> for WriteResponse {
    fn from(result: WriteResult) -> Self {
        Self(vec![result])
    }
}
