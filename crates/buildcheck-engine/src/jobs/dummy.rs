//! Connectivity probe.

use buildcheck_types::record::fields;
use buildcheck_types::Record;

use crate::context::RunContext;
use crate::error::EngineResult;
use crate::result::JobResult;

/// Write a single marker record. Passes whenever the run context is sound;
/// the value is proving the result pipeline end to end.
pub(crate) async fn check(ctx: &RunContext) -> EngineResult<JobResult> {
    let mut result = JobResult::single(ctx)?;
    result.push(Record::named("DUMMY").with(fields::PASSED, true));
    Ok(result)
}
