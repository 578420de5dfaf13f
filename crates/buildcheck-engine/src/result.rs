//! Result lifecycle and write strategies.
//!
//! Every job's persistence follows the same fixed lifecycle: create the
//! job-summary row, stamp the payload with the common lookup fields,
//! dispatch the assignment's write strategy, then complete the summary row.
//! Summary writes are hard failures; payload write failures are captured
//! into the summary message so one job's bad write never stops its
//! siblings.

use buildcheck_store::{Filter, QuerySpec, WriteResponse};
use buildcheck_types::record::{collections, fields, record_types};
use buildcheck_types::{JobAssignment, JobSummary, Record, RecordId, WriteOperation};

use crate::context::RunContext;
use crate::error::{EngineError, EngineResult};

/// Payload template: one record, or a list of records.
#[derive(Debug, Clone)]
pub enum Payload {
    Single(Record),
    Multi(Vec<Record>),
}

/// Outcome of one write-strategy dispatch.
#[derive(Debug, Clone, Default)]
struct OperationReport {
    /// The operation's own pass verdict; `None` counts as failed.
    passed: Option<bool>,
    message: String,
}

/// A job's result: its summary plus the payload to persist.
///
/// Owned exclusively by the job that created it; nothing here is shared
/// across jobs, which is what makes the concurrent job set safe.
#[derive(Debug)]
pub struct JobResult {
    pub summary: JobSummary,
    payload: Payload,
    record_type_id: RecordId,
}

impl JobResult {
    /// Single-record template. The payload starts as one record with its
    /// pass flag down.
    ///
    /// # Errors
    ///
    /// `Config` when the single-record type is absent from the context map.
    pub fn single(ctx: &RunContext) -> EngineResult<Self> {
        Ok(Self {
            summary: JobSummary::start(),
            payload: Payload::Single(Record::new().with(fields::PASSED, false)),
            record_type_id: ctx.record_type_id(record_types::JOB_RESULT_SINGLE)?,
        })
    }

    /// Multi-record template. The payload starts empty; an empty list is
    /// vacuously passed.
    ///
    /// # Errors
    ///
    /// `Config` when the multi-record type is absent from the context map.
    pub fn multi(ctx: &RunContext) -> EngineResult<Self> {
        Ok(Self {
            summary: JobSummary::start(),
            payload: Payload::Multi(Vec::new()),
            record_type_id: ctx.record_type_id(record_types::JOB_RESULT_MULTI)?,
        })
    }

    /// Add a payload record. The single-record template holds exactly one
    /// row, so adding again replaces it.
    pub fn push(&mut self, record: Record) {
        match &mut self.payload {
            Payload::Single(slot) => *slot = record,
            Payload::Multi(list) => list.push(record),
        }
    }

    /// Capture a soft check failure into the summary message.
    pub fn fail(&mut self, message: impl AsRef<str>) {
        self.summary.fail(message);
    }

    /// Run the fixed persistence lifecycle and return the final summary.
    ///
    /// # Errors
    ///
    /// `StoreWrite` when the job-summary row can't be created or updated;
    /// `Config` for an unknown operation value. Payload write failures are
    /// not errors; they surface in the returned summary.
    pub async fn process(
        mut self,
        ctx: &RunContext,
        assignment: &JobAssignment,
        run_ref: &str,
    ) -> EngineResult<JobSummary> {
        let summary_row_id = self.create_job_summary(ctx, assignment, run_ref).await?;
        self.stamp_common_fields(ctx, assignment);

        let operation = assignment.operation.parse().ok_or_else(|| {
            EngineError::config(format!(
                "Unknown Job Operation '{}'",
                assignment.operation.as_str()
            ))
        })?;

        let report = match self.dispatch(ctx, assignment, operation).await {
            Ok(report) => report,
            // Transport failure on the payload write: contained, like a
            // row-level failure.
            Err(e) => OperationReport {
                passed: Some(false),
                message: format!("\n{e}"),
            },
        };

        self.complete_job_summary(ctx, summary_row_id, report).await?;
        Ok(self.summary)
    }

    async fn dispatch(
        &self,
        ctx: &RunContext,
        assignment: &JobAssignment,
        operation: WriteOperation,
    ) -> EngineResult<OperationReport> {
        match operation {
            WriteOperation::Insert => self.insert(ctx).await,
            WriteOperation::Replace => self.replace(ctx, assignment).await,
            WriteOperation::Upsert => self.upsert(ctx).await,
        }
    }

    /// Pass verdict carried by the payload itself: the single record's
    /// flag, or the AND over every record (vacuously true when empty).
    fn payload_passed(&self) -> bool {
        match &self.payload {
            Payload::Single(record) => record.get_bool(fields::PASSED).unwrap_or(false),
            Payload::Multi(records) => records
                .iter()
                .all(|r| r.get_bool(fields::PASSED).unwrap_or(false)),
        }
    }

    fn payload_records(&self) -> Vec<Record> {
        match &self.payload {
            Payload::Single(record) => vec![record.clone()],
            Payload::Multi(records) => records.clone(),
        }
    }

    async fn insert(&self, ctx: &RunContext) -> EngineResult<OperationReport> {
        let response = ctx
            .control
            .store
            .insert(collections::ANALYSIS_RESULTS, self.payload_records())
            .await?;
        Ok(self.report_from(&response))
    }

    async fn replace(
        &self,
        ctx: &RunContext,
        assignment: &JobAssignment,
    ) -> EngineResult<OperationReport> {
        let spec = QuerySpec::new(collections::ANALYSIS_RESULTS)
            .fields([fields::ID])
            .filter(Filter::and([
                Filter::eq(fields::OWNER_ID, ctx.control.user_id.as_str()),
                Filter::eq(fields::ASSIGNMENT_ID, assignment.assignment_id.as_str()),
                Filter::eq(fields::RECORD_TYPE_ID, self.record_type_id.as_str()),
            ]));
        let existing = ctx.control.store.query(&spec).await?;

        let ids: Vec<RecordId> = existing
            .records
            .iter()
            .filter_map(|r| r.id.clone())
            .collect();
        if !ids.is_empty() {
            tracing::debug!(
                assignment = %assignment.assignment_id,
                count = ids.len(),
                "replace: deleting previous result rows"
            );
            ctx.control
                .store
                .delete(collections::ANALYSIS_RESULTS, ids)
                .await?;
        }
        self.insert(ctx).await
    }

    async fn upsert(&self, ctx: &RunContext) -> EngineResult<OperationReport> {
        let response = ctx
            .control
            .store
            .upsert(
                collections::ANALYSIS_RESULTS,
                self.payload_records(),
                fields::ID,
            )
            .await?;
        Ok(self.report_from(&response))
    }

    fn report_from(&self, response: &WriteResponse) -> OperationReport {
        OperationReport {
            passed: Some(self.payload_passed()),
            message: response.failure_message(),
        }
    }

    /// Stamp every payload record with the common lookup fields.
    fn stamp_common_fields(&mut self, ctx: &RunContext, assignment: &JobAssignment) {
        let record_type_id = self.record_type_id.clone();
        let stamp = |record: &mut Record| {
            record.set(fields::JOB_ID, assignment.job_id.as_str());
            record.set(fields::ASSIGNMENT_ID, assignment.assignment_id.as_str());
            record.set(fields::BUILD_ID, ctx.build.build_id.as_str());
            record.set(fields::APP_ID, ctx.build.app_id.as_str());
            record.set(fields::PARENT_ID, ctx.build_summary_id.as_str());
            record.set(fields::RECORD_TYPE_ID, record_type_id.as_str());
        };
        match &mut self.payload {
            Payload::Single(record) => stamp(record),
            Payload::Multi(records) => records.iter_mut().for_each(stamp),
        }
    }

    async fn create_job_summary(
        &self,
        ctx: &RunContext,
        assignment: &JobAssignment,
        run_ref: &str,
    ) -> EngineResult<RecordId> {
        let row = Record::named(format!("Job Summary - {run_ref}"))
            .with(
                fields::RECORD_TYPE_ID,
                ctx.record_type_id(record_types::JOB_SUMMARY)?.as_str(),
            )
            .with(fields::JOB_ID, assignment.job_id.as_str())
            .with(fields::ASSIGNMENT_ID, assignment.assignment_id.as_str())
            .with(fields::PARENT_ID, ctx.build_summary_id.as_str());

        let response = ctx
            .control
            .store
            .insert(collections::ANALYSIS_RESULTS, vec![row])
            .await
            .map_err(|e| EngineError::store_write(format!("Error Creating Job Summary: {e}")))?;
        if !response.all_succeeded() {
            return Err(EngineError::store_write(format!(
                "Error Creating Job Summary{}",
                response.failure_message()
            )));
        }
        response
            .first_id()
            .cloned()
            .ok_or_else(|| EngineError::store_write("job summary insert returned no identifier"))
    }

    async fn complete_job_summary(
        &mut self,
        ctx: &RunContext,
        summary_row_id: RecordId,
        report: OperationReport,
    ) -> EngineResult<()> {
        self.summary.fail(&report.message);
        self.summary.finish(report.passed);

        let mut row = Record::new();
        row.id = Some(summary_row_id);
        row.set(fields::PASSED, self.summary.passed);
        row.set(fields::MESSAGE, self.summary.message.clone());
        row.set(fields::SHORT_MESSAGE, self.summary.short_message());
        if let Some(exec) = self.summary.exec_time_ms {
            row.set(fields::EXEC_TIME_MS, exec);
        }

        let response = ctx
            .control
            .store
            .update(collections::ANALYSIS_RESULTS, row)
            .await
            .map_err(|e| EngineError::store_write(format!("Error Updating Job Summary: {e}")))?;
        if !response.all_succeeded() {
            return Err(EngineError::store_write(format!(
                "Error Updating Job Summary{}",
                response.failure_message()
            )));
        }
        Ok(())
    }
}
