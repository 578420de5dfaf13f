//! Component naming check.

use buildcheck_types::record::fields;
use buildcheck_types::Record;

use crate::context::RunContext;
use crate::error::EngineResult;
use crate::result::JobResult;

/// One result record per build component: passed when the component name
/// starts with the application's allowed prefix (falling back to the dev
/// prefix). No configured prefix is a soft failure, not a pass.
pub(crate) async fn check(ctx: &RunContext) -> EngineResult<JobResult> {
    let mut result = JobResult::multi(ctx)?;

    let prefix = ctx
        .build
        .allowed_prefix
        .as_deref()
        .or(ctx.build.dev_prefix.as_deref());
    let Some(prefix) = prefix else {
        result.fail(format!(
            "application '{}' has no allowed prefix configured",
            ctx.build.app_name.as_deref().unwrap_or("?")
        ));
        return Ok(result);
    };

    for component in &ctx.components {
        let name = component.name().unwrap_or_default();
        let passed = name.starts_with(prefix);
        let mut record = Record::named(name).with(fields::PASSED, passed);
        if let Some(component_id) = &component.id {
            record.set(fields::PARENT_ID, component_id.as_str());
        }
        if !passed {
            record.set(
                fields::MESSAGE,
                format!("component '{name}' does not start with '{prefix}'"),
            );
        }
        result.push(record);
    }
    Ok(result)
}
