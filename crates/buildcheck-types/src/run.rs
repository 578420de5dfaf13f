//! Run-level model: run mode, build identity, record-type mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Which remote session(s) a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// No target session; the control session serves both sides.
    Local,
    /// Target derived from a release-environment link row.
    Release,
    /// Target alias given directly.
    Connected,
}

impl RunMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Release => "release",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the build a run analyzes, plus its owning application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildIdentity {
    pub build_id: RecordId,
    pub build_name: String,
    pub app_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// Project prefix components are developed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_prefix: Option<String>,
    /// Prefix component names are allowed to carry; falls back to
    /// `dev_prefix` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_prefix: Option<String>,
}

/// Mapping from result record-type developer name to its identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTypeMap(HashMap<String, RecordId>);

impl RecordTypeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: RecordId) {
        self.0.insert(name.into(), id);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RecordId> {
        self.0.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, RecordId)> for RecordTypeMap {
    fn from_iter<T: IntoIterator<Item = (String, RecordId)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
