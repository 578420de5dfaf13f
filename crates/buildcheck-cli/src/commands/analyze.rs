use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use buildcheck_engine::{run_analysis, AnalyzeOptions};

use crate::workspace;

pub struct AnalyzeArgs {
    pub build_name: String,
    pub target_alias: Option<String>,
    pub deploy_ref: Option<String>,
    pub force: bool,
    pub deadline_secs: Option<u64>,
    pub workspace: PathBuf,
}

/// Execute the `analyze` command: open the workspace sessions and run the
/// build's configured jobs.
///
/// Fatal setup errors bubble up and exit non-zero; a completed run with
/// failing jobs reports them here and exits zero.
pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let config = workspace::load(&args.workspace)?;
    let (provider, control) = workspace::open(&config).await?;

    tracing::info!(
        build = %args.build_name,
        workspace = %args.workspace.display(),
        "starting analysis run"
    );

    let options = AnalyzeOptions {
        build_name: args.build_name.clone(),
        target_alias: args.target_alias,
        deploy_ref: args.deploy_ref,
        force: args.force,
        deadline: args.deadline_secs.map(Duration::from_secs),
    };
    let report = run_analysis(control, &provider, &options).await?;

    println!("Build '{}' analyzed.", args.build_name);
    println!("  Jobs run:     {}", report.outcomes.len());
    println!("  Passed:       {}", if report.passed { "yes" } else { "no" });
    println!("  Total time:   {} ms", report.total_time_ms);
    if let Some(fastest) = &report.fastest {
        println!(
            "  Fastest job:  {} ({} ms)",
            fastest.job_name, fastest.exec_time_ms
        );
    }
    if let Some(slowest) = &report.slowest {
        println!(
            "  Slowest job:  {} ({} ms)",
            slowest.job_name, slowest.exec_time_ms
        );
    }
    for outcome in report.outcomes.iter().filter(|o| !o.summary.completed) {
        println!(
            "  Failed:       {}: {}",
            outcome.job_name,
            outcome.summary.message.trim()
        );
    }
    if report.deadline_exceeded {
        println!("  Note:         run deadline exceeded; all jobs were still awaited");
    }

    Ok(())
}
