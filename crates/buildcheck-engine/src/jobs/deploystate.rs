//! Target-environment schema probe.

use buildcheck_types::record::{collections, fields};
use buildcheck_types::Record;

use crate::context::RunContext;
use crate::error::EngineResult;
use crate::result::JobResult;

/// Probe the analyzed side by describing its component collection. A probe
/// failure is soft: it lands in the summary message and the job reports
/// not completed, without touching sibling jobs.
pub(crate) async fn check(ctx: &RunContext) -> EngineResult<JobResult> {
    let mut result = JobResult::multi(ctx)?;
    let session = match ctx.analysis_session() {
        Ok(session) => session,
        Err(e) => {
            result.fail(e.to_string());
            return Ok(result);
        }
    };

    match session.store.describe(collections::BUILD_COMPONENTS).await {
        Ok(schema) => {
            result.push(
                Record::named("target reachable")
                    .with(fields::PASSED, true)
                    .with(
                        fields::MESSAGE,
                        format!("session '{}' answered describe", session.alias),
                    ),
            );
            result.push(
                Record::named("component schema")
                    .with(fields::PASSED, !schema.fields.is_empty())
                    .with(
                        fields::MESSAGE,
                        format!("{} fields reported", schema.fields.len()),
                    ),
            );
        }
        Err(e) => result.fail(e.to_string()),
    }
    Ok(result)
}
