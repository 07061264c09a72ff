mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eksforge")]
#[command(about = "Declare a VPC and an EKS cluster with Linux and Windows node groups", long_about = None)]
struct Cli {
    /// Stack file (.kdl, .yaml or .yml); discovered when omitted
    #[arg(short, long, global = true, env = "EKSFORGE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the stack file
    Validate,
    /// Show the resources an apply would create or update
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the stack through the local engine and record its state
    Apply {
        /// Apply without stopping after the plan
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the outputs of the last apply
    Outputs {
        /// Print the outputs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so plan and output JSON stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let project_root = std::env::current_dir()?;
    tracing::debug!(root = %project_root.display(), "Resolved project root");

    match cli.command {
        Commands::Version => {
            println!("eksforge {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate => {
            commands::validate::handle(cli.config.as_deref())?;
        }
        Commands::Plan { json } => {
            commands::plan::handle(cli.config.as_deref(), &project_root, json).await?;
        }
        Commands::Apply { yes } => {
            commands::apply::handle(cli.config.as_deref(), &project_root, yes).await?;
        }
        Commands::Outputs { json } => {
            commands::outputs::handle(&project_root, json).await?;
        }
    }

    Ok(())
}
