//! Session and run-mode resolution.
//!
//! Decides, from the optional target alias and deployment reference, which
//! of the three run modes applies and opens the target session where one is
//! needed. The target side is modelled as an explicit three-valued state so
//! "not yet decided" can never be confused with "local".

use buildcheck_store::{Filter, QuerySpec, Session, SessionProvider};
use buildcheck_types::record::{collections, fields};
use buildcheck_types::RunMode;

use crate::error::{EngineError, EngineResult};

/// Resolution state of the target (analyzed) side.
#[derive(Debug, Clone, Default)]
pub enum TargetResolution {
    /// Resolution has not run; any use is a logic error.
    #[default]
    Unresolved,
    /// No target session; the control session serves both sides.
    Local,
    /// A dedicated target session.
    Remote(Session),
}

impl TargetResolution {
    /// The session the analyzed side should use: the control session in
    /// local mode, the target session otherwise.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when resolution has not run.
    pub fn session<'a>(&'a self, control: &'a Session) -> EngineResult<&'a Session> {
        match self {
            Self::Unresolved => Err(EngineError::config(
                "target session requested before resolution",
            )),
            Self::Local => Ok(control),
            Self::Remote(session) => Ok(session),
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Output of [`resolve_target`].
#[derive(Debug)]
pub struct Resolution {
    pub mode: RunMode,
    pub target: TargetResolution,
    /// Build name derived from the environment link row, release mode only.
    pub build_name: Option<String>,
    /// Operator-visible description of what was decided.
    pub status: String,
}

/// Decide the run mode and open the target session where one applies.
///
/// Decision table:
/// - alias given → Connected (alias wins when both inputs are present);
/// - deployment reference given → Release, deriving build name and alias
///   from the `build_environments` link row;
/// - neither → Local.
///
/// # Errors
///
/// `Config` when the deployment reference resolves to no link row;
/// `Session` when the target session can't be opened.
pub async fn resolve_target(
    control: &Session,
    provider: &dyn SessionProvider,
    target_alias: Option<&str>,
    deploy_ref: Option<&str>,
) -> EngineResult<Resolution> {
    if let Some(alias) = target_alias {
        let session = connect(provider, alias).await?;
        let status = format!("connected mode: analyzing '{}'", session.username);
        tracing::info!(alias, username = %session.username, "run mode: connected");
        return Ok(Resolution {
            mode: RunMode::Connected,
            target: TargetResolution::Remote(session),
            build_name: None,
            status,
        });
    }

    if let Some(reference) = deploy_ref {
        let spec = QuerySpec::new(collections::BUILD_ENVIRONMENTS)
            .fields([fields::BUILD_NAME, fields::TARGET_ALIAS])
            .filter(Filter::eq(fields::REFERENCE, reference))
            .limit(1);
        let response = control.store.query(&spec).await?;
        let Some(link) = response.records.first() else {
            return Err(EngineError::config("no build environment found"));
        };
        let build_name = link
            .get_str(fields::BUILD_NAME)
            .ok_or_else(|| EngineError::config("build environment row has no build name"))?
            .to_string();
        let alias = link
            .get_str(fields::TARGET_ALIAS)
            .ok_or_else(|| EngineError::config("build environment row has no target alias"))?
            .to_string();
        let session = connect(provider, &alias).await?;
        let status = format!("release mode: build '{build_name}' targeting '{alias}'");
        tracing::info!(reference, build = %build_name, alias, "run mode: release");
        return Ok(Resolution {
            mode: RunMode::Release,
            target: TargetResolution::Remote(session),
            build_name: Some(build_name),
            status,
        });
    }

    tracing::info!("run mode: local");
    Ok(Resolution {
        mode: RunMode::Local,
        target: TargetResolution::Local,
        build_name: None,
        status: "local mode: control session serves both sides".to_string(),
    })
}

async fn connect(provider: &dyn SessionProvider, alias: &str) -> EngineResult<Session> {
    provider
        .connect(alias)
        .await
        .map_err(|e| EngineError::session(format!("can not open session for '{alias}': {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use buildcheck_store::{MemoryStore, StaticSessionProvider};
    use buildcheck_types::Record;

    use super::*;

    fn session(alias: &str, store: Arc<MemoryStore>) -> Session {
        Session::new(alias, format!("{alias}@example.com"), "u-1".into(), store)
    }

    fn control() -> (Session, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new("u-1"));
        (session("control", store.clone()), store)
    }

    #[tokio::test]
    async fn neither_input_is_local() {
        let (control, _) = control();
        let provider = StaticSessionProvider::new();
        let res = resolve_target(&control, &provider, None, None).await.unwrap();
        assert_eq!(res.mode, RunMode::Local);
        assert!(res.target.is_local());
        assert_eq!(res.target.session(&control).unwrap().alias, "control");
        assert!(res.build_name.is_none());
    }

    #[tokio::test]
    async fn alias_is_connected_mode() {
        let (control, _) = control();
        let provider = StaticSessionProvider::new()
            .with_session(session("qa", Arc::new(MemoryStore::new("u-2"))));
        let res = resolve_target(&control, &provider, Some("qa"), None)
            .await
            .unwrap();
        assert_eq!(res.mode, RunMode::Connected);
        assert_eq!(res.target.session(&control).unwrap().alias, "qa");
        assert!(res.status.contains("qa@example.com"));
    }

    #[tokio::test]
    async fn alias_wins_over_deploy_ref() {
        let (control, _) = control();
        let provider = StaticSessionProvider::new()
            .with_session(session("qa", Arc::new(MemoryStore::new("u-2"))));
        let res = resolve_target(&control, &provider, Some("qa"), Some("ref-1"))
            .await
            .unwrap();
        assert_eq!(res.mode, RunMode::Connected);
    }

    #[tokio::test]
    async fn deploy_ref_is_release_mode() {
        let (control, store) = control();
        store.seed(
            collections::BUILD_ENVIRONMENTS,
            vec![Record::new()
                .with(fields::REFERENCE, "ref-1")
                .with(fields::BUILD_NAME, "Build A")
                .with(fields::TARGET_ALIAS, "staging")],
        );
        let provider = StaticSessionProvider::new()
            .with_session(session("staging", Arc::new(MemoryStore::new("u-3"))));
        let res = resolve_target(&control, &provider, None, Some("ref-1"))
            .await
            .unwrap();
        assert_eq!(res.mode, RunMode::Release);
        assert_eq!(res.build_name.as_deref(), Some("Build A"));
        assert_eq!(res.target.session(&control).unwrap().alias, "staging");
    }

    #[tokio::test]
    async fn unknown_deploy_ref_is_config_error() {
        let (control, _) = control();
        let provider = StaticSessionProvider::new();
        let err = resolve_target(&control, &provider, None, Some("ref-x"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(m) if m == "no build environment found"));
    }

    #[tokio::test]
    async fn unreachable_alias_is_session_error() {
        let (control, _) = control();
        let provider = StaticSessionProvider::new();
        let err = resolve_target(&control, &provider, Some("qa"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Session(_)));
    }

    #[test]
    fn unresolved_target_session_is_config_error() {
        let (control, _) = control();
        let err = TargetResolution::Unresolved.session(&control).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
