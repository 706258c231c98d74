pub mod report;
pub mod scan;
pub mod schedule;

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Network vulnerability scan orchestrator.")]
#[command(group(ArgGroup::new("mode").required(true).args(["scan", "schedule", "report_only"])))]
pub struct CommandLine {
    /// Run the full scan pipeline immediately
    #[arg(long)]
    pub scan: bool,

    /// Start the recurring scan scheduler and block until interrupted
    #[arg(long)]
    pub schedule: bool,

    /// Aggregate and send the report for an existing scan results file
    #[arg(long, value_name = "PATH")]
    pub report_only: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = "vigil.toml")]
    pub config: PathBuf,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
