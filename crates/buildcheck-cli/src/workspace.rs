//! Workspace session file.
//!
//! Maps session aliases to seeded in-memory stores. Real endpoint
//! authentication happens behind the [`SessionProvider`] seam; the
//! workspace file is the fixture-backed provider used for local runs and
//! demos.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use buildcheck_store::{MemoryStore, Session, SessionProvider, StaticSessionProvider};
use buildcheck_types::Record;

/// Parsed workspace file.
#[derive(Debug, Deserialize)]
pub struct WorkspaceConfig {
    /// Alias of the session results are written through.
    pub control: String,
    pub sessions: BTreeMap<String, SessionConfig>,
}

/// One configured session.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    pub username: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Seed rows per collection.
    #[serde(default)]
    pub records: BTreeMap<String, Vec<Record>>,
    /// Declared field lists per collection, reported by `describe`.
    #[serde(default)]
    pub schemas: BTreeMap<String, Vec<String>>,
}

/// Read and parse a workspace file.
pub fn load(path: &Path) -> Result<WorkspaceConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workspace file: {}", path.display()))?;
    let config: WorkspaceConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid workspace file: {}", path.display()))?;
    if !config.sessions.contains_key(&config.control) {
        anyhow::bail!(
            "workspace names control alias '{}' but defines no such session",
            config.control
        );
    }
    Ok(config)
}

/// Build the session provider and connect the control session.
pub async fn open(config: &WorkspaceConfig) -> Result<(StaticSessionProvider, Session)> {
    let mut provider = StaticSessionProvider::new();
    for (alias, session_config) in &config.sessions {
        let user_id = session_config
            .user_id
            .clone()
            .unwrap_or_else(|| format!("user-{alias}"));
        let store = MemoryStore::new(user_id.as_str());
        for (collection, rows) in &session_config.records {
            store.seed(collection, rows.iter().cloned());
        }
        for (collection, field_names) in &session_config.schemas {
            store.declare_schema(collection, field_names.iter().cloned());
        }
        provider.register(Session::new(
            alias,
            session_config.username.clone(),
            user_id.into(),
            Arc::new(store),
        ));
    }

    let control = provider
        .connect(&config.control)
        .await
        .with_context(|| format!("failed to open control session '{}'", config.control))?;
    Ok((provider, control))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const WORKSPACE: &str = r#"{
        "control": "central",
        "sessions": {
            "central": {
                "username": "ops@example.com",
                "user_id": "u-1",
                "records": {
                    "builds": [
                        {"id": "b-1", "name": "Build A", "app_id": "app-1"}
                    ]
                },
                "schemas": {
                    "build_components": ["name", "build_id"]
                }
            },
            "staging": {
                "username": "qa@example.com"
            }
        }
    }"#;

    fn write_workspace(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn load_and_open_seeded_workspace() {
        let file = write_workspace(WORKSPACE);
        let config = load(file.path()).unwrap();
        let (provider, control) = open(&config).await.unwrap();

        assert_eq!(control.alias, "central");
        assert_eq!(control.user_id.as_str(), "u-1");

        let spec = buildcheck_store::QuerySpec::new("builds");
        let response = control.store.query(&spec).await.unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.records[0].name(), Some("Build A"));

        let staging = provider.connect("staging").await.unwrap();
        assert!(staging.user_id.as_str().starts_with("user-"));
    }

    #[test]
    fn load_rejects_missing_control_session() {
        let file = write_workspace(r#"{"control": "gone", "sessions": {}}"#);
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("'gone'"));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let file = write_workspace("{not json");
        assert!(load(file.path()).is_err());
    }
}
