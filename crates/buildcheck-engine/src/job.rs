//! The job contract.

use std::sync::Arc;

use buildcheck_types::{JobAssignment, JobSummary};

use crate::context::RunContext;
use crate::error::EngineResult;
use crate::jobs;
use crate::registry::JobKind;

/// A job bound to one assignment, executed exactly once.
#[derive(Debug)]
pub struct BoundJob {
    pub kind: JobKind,
    pub assignment: JobAssignment,
    /// Unique run reference correlating the rows this execution writes.
    pub run_ref: String,
}

impl BoundJob {
    #[must_use]
    pub fn new(kind: JobKind, assignment: JobAssignment) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let run_ref = format!(
            "{}-{}-{}",
            kind.name(),
            chrono::Utc::now().timestamp_millis(),
            &suffix[..6]
        );
        Self {
            kind,
            assignment,
            run_ref,
        }
    }

    /// Perform the check and persist the result.
    ///
    /// Failures inside the check are soft: they land in the summary
    /// message. Failures during persistence propagate.
    ///
    /// # Errors
    ///
    /// Propagates `Config` and `StoreWrite` errors from the result
    /// lifecycle.
    pub async fn run(self, ctx: Arc<RunContext>) -> EngineResult<JobSummary> {
        tracing::info!(job = self.kind.name(), run_ref = %self.run_ref, "job started");

        let result = match self.kind {
            JobKind::Dummy => jobs::dummy::check(&ctx).await,
            JobKind::Prefix => jobs::prefix::check(&ctx).await,
            JobKind::DeployState => jobs::deploystate::check(&ctx).await,
        }?;

        let summary = result.process(&ctx, &self.assignment, &self.run_ref).await?;
        tracing::info!(
            job = self.kind.name(),
            passed = summary.passed,
            completed = summary.completed,
            exec_time_ms = summary.exec_time_ms,
            "job finished"
        );
        Ok(summary)
    }
}
