//! Build context loading.
//!
//! [`ContextLoader`] runs once, after session resolution and before any job
//! executes, and produces the [`RunContext`] every job reads. The loader
//! operations fail fast with a `Config` error on empty results so a
//! misconfigured run stops before it writes anything.

use buildcheck_store::{Filter, QuerySpec, Session};
use buildcheck_types::record::{collections, fields, record_types};
use buildcheck_types::{BuildIdentity, Record, RecordId, RecordTypeMap, RunMode};

use crate::error::{EngineError, EngineResult};
use crate::resolve::{Resolution, TargetResolution};

/// Process-wide shared context for one run. Write-once, then read-only:
/// constructed by [`ContextLoader::init_build_summary`] and passed by
/// reference into the orchestrator and every job.
pub struct RunContext {
    pub control: Session,
    pub target: TargetResolution,
    pub mode: RunMode,
    pub build: BuildIdentity,
    pub components: Vec<Record>,
    pub record_types: RecordTypeMap,
    /// Identifier of the build-summary row, parent of every job summary.
    pub build_summary_id: RecordId,
}

impl RunContext {
    /// Identifier of a result record type by developer name.
    ///
    /// # Errors
    ///
    /// `Config` when the type is absent from the loaded map.
    pub fn record_type_id(&self, name: &str) -> EngineResult<RecordId> {
        self.record_types
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::config(format!("unknown result record type '{name}'")))
    }

    /// The session jobs analyze: the target side, or the control session in
    /// local mode.
    ///
    /// # Errors
    ///
    /// `Config` when resolution never ran.
    pub fn analysis_session(&self) -> EngineResult<&Session> {
        self.target.session(&self.control)
    }
}

/// Staged loader for [`RunContext`]. Operations must run in order: record
/// types, build, components, then
/// [`init_build_summary`](Self::init_build_summary) to seal the context.
pub struct ContextLoader {
    control: Session,
    resolution: Resolution,
    force: bool,
    record_types: Option<RecordTypeMap>,
    build: Option<BuildIdentity>,
    components: Option<Vec<Record>>,
}

impl ContextLoader {
    #[must_use]
    pub fn new(control: Session, resolution: Resolution, force: bool) -> Self {
        Self {
            control,
            resolution,
            force,
            record_types: None,
            build: None,
            components: None,
        }
    }

    /// Fetch the result record-type rows and build the name→id map.
    ///
    /// # Errors
    ///
    /// `Config` when no record types exist for the result collection.
    pub async fn load_record_types(&mut self) -> EngineResult<()> {
        let spec = QuerySpec::new(collections::RECORD_TYPES)
            .fields([fields::NAME, fields::COLLECTION])
            .filter(Filter::eq(fields::COLLECTION, collections::ANALYSIS_RESULTS));
        let response = self.control.store.query(&spec).await?;

        let mut map = RecordTypeMap::new();
        for row in &response.records {
            let (Some(name), Some(id)) = (row.name(), row.id.as_ref()) else {
                continue;
            };
            map.insert(name, id.clone());
        }
        if map.is_empty() {
            return Err(EngineError::config(
                "no record types found for analysis results",
            ));
        }
        tracing::debug!(count = map.len(), "record type map loaded");
        self.record_types = Some(map);
        Ok(())
    }

    /// Fetch exactly one build row by name (case-sensitive exact match).
    ///
    /// In release mode the name derived from the environment link row wins
    /// over `requested_name`. When several rows share the name the first is
    /// used; without an upstream uniqueness constraint that choice is not
    /// deterministic.
    ///
    /// # Errors
    ///
    /// `Config` with "No Build Found" when no row matches.
    pub async fn load_build(&mut self, requested_name: &str) -> EngineResult<()> {
        let name = self
            .resolution
            .build_name
            .as_deref()
            .unwrap_or(requested_name)
            .to_string();

        let spec = QuerySpec::new(collections::BUILDS)
            .fields([
                fields::NAME,
                fields::APP_ID,
                fields::APP_NAME,
                fields::DEV_PREFIX,
                fields::ALLOWED_PREFIX,
            ])
            .filter(Filter::eq(fields::NAME, name.as_str()))
            .limit(1);
        let response = self.control.store.query(&spec).await?;
        let Some(row) = response.records.first() else {
            return Err(EngineError::config("No Build Found"));
        };

        let build_id = row
            .id
            .clone()
            .ok_or_else(|| EngineError::config("build row has no identifier"))?;
        let app_id = row
            .get_str(fields::APP_ID)
            .ok_or_else(|| EngineError::config("build row has no application link"))?;

        tracing::info!(build = %name, build_id = %build_id, "build loaded");
        self.build = Some(BuildIdentity {
            build_id,
            build_name: name,
            app_id: RecordId::new(app_id),
            app_name: row.get_str(fields::APP_NAME).map(str::to_string),
            dev_prefix: row.get_str(fields::DEV_PREFIX).map(str::to_string),
            allowed_prefix: row.get_str(fields::ALLOWED_PREFIX).map(str::to_string),
        });
        Ok(())
    }

    /// Fetch every component row linked to the loaded build, returning a
    /// diagnostic count string.
    ///
    /// # Errors
    ///
    /// `Config` when [`load_build`](Self::load_build) has not run, or when
    /// the build has no components and `force` was not set.
    pub async fn load_build_components(&mut self) -> EngineResult<String> {
        let build = self
            .build
            .as_ref()
            .ok_or_else(|| EngineError::config("Must execute LoadBuild first"))?;

        let spec = QuerySpec::new(collections::BUILD_COMPONENTS)
            .filter(Filter::eq(fields::BUILD_ID, build.build_id.as_str()))
            .resolve_fields(self.control.store.as_ref())
            .await?;
        let response = self.control.store.query(&spec).await?;

        let count = response.records.len();
        if count == 0 && !self.force {
            return Err(EngineError::config(format!(
                "no components found for build '{}'",
                build.build_name
            )));
        }
        if count == 0 {
            tracing::warn!(build = %build.build_name, "no components found, continuing (force)");
        }
        let diagnostic = format!("{count} components loaded for build '{}'", build.build_name);
        self.components = Some(response.records);
        Ok(diagnostic)
    }

    /// Create the build-summary row and seal the context.
    ///
    /// The row is created before any job executes so its identifier can be
    /// the parent link on every job-level summary.
    ///
    /// # Errors
    ///
    /// `Config` when a loader step was skipped; `StoreWrite` when the row
    /// can't be created.
    pub async fn init_build_summary(self) -> EngineResult<RunContext> {
        let type_map = self
            .record_types
            .ok_or_else(|| EngineError::config("Must execute LoadRecordTypes first"))?;
        let build = self
            .build
            .ok_or_else(|| EngineError::config("Must execute LoadBuild first"))?;
        let components = self
            .components
            .ok_or_else(|| EngineError::config("Must execute LoadBuildComponents first"))?;
        let record_type_id = type_map
            .get(record_types::BUILD_SUMMARY)
            .cloned()
            .ok_or_else(|| {
                EngineError::config(format!(
                    "unknown result record type '{}'",
                    record_types::BUILD_SUMMARY
                ))
            })?;

        let row = Record::named("Build Summary")
            .with(fields::RECORD_TYPE_ID, record_type_id.as_str())
            .with(fields::PASSED, false)
            .with(fields::APP_ID, build.app_id.as_str())
            .with(fields::BUILD_ID, build.build_id.as_str());

        let response = self
            .control
            .store
            .insert(collections::ANALYSIS_RESULTS, vec![row])
            .await
            .map_err(|e| {
                EngineError::store_write(format!("can not create build summary record: {e}"))
            })?;
        if !response.all_succeeded() {
            return Err(EngineError::store_write(format!(
                "can not create build summary record{}",
                response.failure_message()
            )));
        }
        let build_summary_id = response
            .first_id()
            .cloned()
            .ok_or_else(|| {
                EngineError::store_write("build summary insert returned no identifier")
            })?;
        tracing::info!(id = %build_summary_id, "build summary created");

        Ok(RunContext {
            control: self.control,
            target: self.resolution.target,
            mode: self.resolution.mode,
            build,
            components,
            record_types: type_map,
            build_summary_id,
        })
    }
}
