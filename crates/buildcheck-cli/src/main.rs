mod commands;
mod logging;
mod workspace;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "buildcheck",
    version,
    about = "Build analysis job runner for remote record stores"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a build's configured analysis jobs and persist the results
    Analyze {
        /// Name of the build (release) to analyze
        build_name: String,
        /// Alias of the environment being analyzed
        #[arg(short = 't', long)]
        target_alias: Option<String>,
        /// Deployment reference resolving the build and its target
        #[arg(short = 'r', long)]
        deploy_ref: Option<String>,
        /// Continue when the build has no components
        #[arg(short = 'f', long)]
        force: bool,
        /// Soft run deadline in seconds; in-flight jobs are still awaited
        #[arg(long)]
        deadline_secs: Option<u64>,
        /// Path to the workspace session file
        #[arg(short = 'w', long, default_value = "workspace.json")]
        workspace: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Analyze {
            build_name,
            target_alias,
            deploy_ref,
            force,
            deadline_secs,
            workspace,
        } => {
            commands::analyze::execute(commands::analyze::AnalyzeArgs {
                build_name,
                target_alias,
                deploy_ref,
                force,
                deadline_secs,
                workspace,
            })
            .await
        }
    }
}
