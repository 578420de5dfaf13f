//! Run orchestration: fan out every configured job, join the whole set,
//! aggregate their summaries into the build summary.
//!
//! The join is a barrier, not a race: every job is observed before
//! aggregation, and a job's failure never stops its siblings. Only the
//! orchestrator writes the build-summary row, and only after every job has
//! settled, so the shared context needs no locking.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinSet;

use buildcheck_store::{Filter, QuerySpec, Session, SessionProvider};
use buildcheck_types::record::{collections, fields};
use buildcheck_types::{JobAssignment, JobSummary, Record, RecordId};

use crate::context::{ContextLoader, RunContext};
use crate::error::{EngineError, EngineResult};
use crate::registry;
use crate::resolve::resolve_target;

/// One settled job: its registry name and final summary.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_name: String,
    pub summary: JobSummary,
}

/// Name and execution time of a timing extreme.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTiming {
    pub job_name: String,
    pub exec_time_ms: i64,
}

/// Final report of one analysis run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// AND over every job's pass flag; vacuously true with zero jobs.
    pub passed: bool,
    /// Failed jobs' messages followed by the fastest/slowest lines.
    pub message: String,
    pub total_time_ms: i64,
    pub slowest_time_ms: i64,
    pub fastest: Option<JobTiming>,
    pub slowest: Option<JobTiming>,
    pub outcomes: Vec<JobOutcome>,
    /// The soft deadline expired before every job settled.
    pub deadline_exceeded: bool,
}

/// Inputs of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub build_name: String,
    pub target_alias: Option<String>,
    pub deploy_ref: Option<String>,
    /// Continue when the build has no components.
    pub force: bool,
    /// Soft overall deadline: on expiry the run logs and keeps waiting for
    /// in-flight jobs rather than aborting them mid-write.
    pub deadline: Option<Duration>,
}

/// Run a full analysis: resolve sessions, load the build context, execute
/// every configured job, and complete the build summary.
///
/// # Errors
///
/// Setup-phase failures (resolution, context loading, unknown job names)
/// abort the run before any job executes. After launch, only summary-row
/// persistence failures abort; per-job failures are contained in the
/// report.
pub async fn run_analysis(
    control: Session,
    provider: &dyn SessionProvider,
    options: &AnalyzeOptions,
) -> EngineResult<RunReport> {
    let resolution = resolve_target(
        &control,
        provider,
        options.target_alias.as_deref(),
        options.deploy_ref.as_deref(),
    )
    .await?;
    tracing::info!(mode = %resolution.mode, "{}", resolution.status);

    let mut loader = ContextLoader::new(control, resolution, options.force);
    loader.load_record_types().await?;
    loader.load_build(&options.build_name).await?;
    let diagnostic = loader.load_build_components().await?;
    tracing::info!("{diagnostic}");
    let ctx = Arc::new(loader.init_build_summary().await?);

    run_jobs(ctx, options.deadline).await
}

/// Execute every job configured for the context's application and complete
/// the build summary. See [`run_analysis`] for the failure policy.
///
/// # Errors
///
/// `Config` for an unknown job name (raised before any job launches);
/// `StoreWrite` when the build summary can't be completed;
/// `Infrastructure` when a job task panics.
pub async fn run_jobs(
    ctx: Arc<RunContext>,
    deadline: Option<Duration>,
) -> EngineResult<RunReport> {
    let assignments = load_assignments(&ctx).await?;
    tracing::info!(count = assignments.len(), "job assignments loaded");

    // Resolve every name up front: one bad assignment fails the run before
    // anything launches.
    let jobs = assignments
        .into_iter()
        .map(registry::bind)
        .collect::<EngineResult<Vec<_>>>()?;

    let job_count = jobs.len();
    let mut join_set: JoinSet<(usize, String, JobSummary)> = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let ctx = ctx.clone();
        join_set.spawn(async move {
            let name = job.kind.name().to_string();
            let started = JobSummary::start();
            match job.run(ctx).await {
                Ok(summary) => (index, name, summary),
                Err(e) => {
                    tracing::error!(job = %name, "job failed: {e}");
                    let mut summary = started;
                    summary.fail(e.to_string());
                    summary.finish(None);
                    (index, name, summary)
                }
            }
        });
    }

    let mut slots: Vec<Option<JobOutcome>> = (0..job_count).map(|_| None).collect();
    let deadline_at = deadline.map(|d| tokio::time::Instant::now() + d);
    let mut deadline_exceeded = false;

    loop {
        let joined = match deadline_at {
            Some(at) if !deadline_exceeded => {
                tokio::select! {
                    joined = join_set.join_next() => joined,
                    () = tokio::time::sleep_until(at) => {
                        deadline_exceeded = true;
                        tracing::warn!("run deadline exceeded; waiting for in-flight jobs");
                        continue;
                    }
                }
            }
            _ => join_set.join_next().await,
        };
        let Some(joined) = joined else { break };
        match joined {
            Ok((index, job_name, summary)) => {
                slots[index] = Some(JobOutcome { job_name, summary });
            }
            Err(join_err) => {
                return Err(EngineError::Infrastructure(anyhow!(
                    "job task panicked: {join_err}"
                )));
            }
        }
    }
    tracing::info!("all jobs completed");

    // Aggregate in assignment order so tie-breaks are deterministic.
    let outcomes: Vec<JobOutcome> = slots.into_iter().flatten().collect();
    let agg = aggregate(&outcomes);

    let report = RunReport {
        passed: agg.passed,
        message: agg.message,
        total_time_ms: agg.total_time_ms,
        slowest_time_ms: agg.slowest.as_ref().map_or(0, |t| t.exec_time_ms),
        fastest: agg.fastest,
        slowest: agg.slowest,
        outcomes,
        deadline_exceeded,
    };
    complete_build_summary(&ctx, &report).await?;
    Ok(report)
}

struct Aggregate {
    passed: bool,
    total_time_ms: i64,
    fastest: Option<JobTiming>,
    slowest: Option<JobTiming>,
    message: String,
}

/// Fold settled jobs into the run-level aggregate. Strict comparisons mean
/// the first job encountered wins all timing ties.
fn aggregate(outcomes: &[JobOutcome]) -> Aggregate {
    let mut passed = true;
    let mut total_time_ms = 0i64;
    let mut failures = String::new();
    let mut fastest: Option<(usize, i64)> = None;
    let mut slowest: Option<(usize, i64)> = None;

    for (index, outcome) in outcomes.iter().enumerate() {
        let summary = &outcome.summary;
        if !summary.completed {
            failures.push_str(&format!("{}:{}\n", outcome.job_name, summary.message));
        }
        passed = passed && summary.passed;
        let exec = summary.exec_time_ms.unwrap_or(0);
        total_time_ms += exec;
        match fastest {
            Some((_, best)) if exec >= best => {}
            _ => fastest = Some((index, exec)),
        }
        match slowest {
            Some((_, worst)) if exec <= worst => {}
            _ => slowest = Some((index, exec)),
        }
    }

    let timing = |slot: Option<(usize, i64)>| {
        slot.map(|(index, exec_time_ms)| JobTiming {
            job_name: outcomes[index].job_name.clone(),
            exec_time_ms,
        })
    };
    let fastest = timing(fastest);
    let slowest = timing(slowest);

    let mut message = failures;
    if let Some(t) = &fastest {
        message.push_str(&format!("Fastest Job: {} ({})\n", t.job_name, t.exec_time_ms));
    }
    if let Some(t) = &slowest {
        message.push_str(&format!("Slowest Job: {} ({})\n", t.job_name, t.exec_time_ms));
    }

    Aggregate {
        passed,
        total_time_ms,
        fastest,
        slowest,
        message,
    }
}

async fn load_assignments(ctx: &RunContext) -> EngineResult<Vec<JobAssignment>> {
    let spec = QuerySpec::new(collections::JOB_ASSIGNMENTS)
        .fields([fields::JOB_ID, fields::JOB_NAME, fields::OPERATION, fields::NAME])
        .filter(Filter::eq(fields::APP_ID, ctx.build.app_id.as_str()));
    let response = ctx.control.store.query(&spec).await?;

    let mut assignments = Vec::with_capacity(response.records.len());
    for row in response.records {
        let assignment_id = row
            .id
            .clone()
            .ok_or_else(|| EngineError::config("job assignment row has no identifier"))?;
        let field = |name: &str| {
            row.get_str(name).map(str::to_string).ok_or_else(|| {
                EngineError::config(format!(
                    "job assignment '{assignment_id}' is missing '{name}'"
                ))
            })
        };
        assignments.push(JobAssignment {
            job_id: RecordId::new(field(fields::JOB_ID)?),
            job_name: field(fields::JOB_NAME)?,
            operation: field(fields::OPERATION)?.into(),
            assignment_id,
        });
    }
    Ok(assignments)
}

async fn complete_build_summary(ctx: &RunContext, report: &RunReport) -> EngineResult<()> {
    let mut row = Record::new();
    row.id = Some(ctx.build_summary_id.clone());
    row.set(fields::PASSED, report.passed);
    row.set(fields::MESSAGE, report.message.clone());
    row.set(fields::TOTAL_TIME_MS, report.total_time_ms);
    row.set(fields::EXEC_TIME_MS, report.slowest_time_ms);

    let response = ctx
        .control
        .store
        .update(collections::ANALYSIS_RESULTS, row)
        .await
        .map_err(|e| {
            EngineError::store_write(format!("Can not update build summary record: {e}"))
        })?;
    if !response.all_succeeded() {
        return Err(EngineError::store_write(format!(
            "Can not update build summary record{}",
            response.failure_message()
        )));
    }
    tracing::info!(
        passed = report.passed,
        total_time_ms = report.total_time_ms,
        "build summary completed"
    );
    Ok(())
}
