mod commands;
mod terminal;

use std::sync::Arc;

use commands::CommandLine;
use vigil_common::config::Config;
use vigil_core::Pipeline;
use vigil_mail::SmtpMessenger;
use vigil_nmap::NmapEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    terminal::logging::init();

    let config = Arc::new(Config::load(&commands.config)?);
    let engine = Arc::new(NmapEngine::new(&config.scan));
    let messenger = Arc::new(SmtpMessenger::new(&config.email));
    let pipeline = Pipeline::new(Arc::clone(&config), engine, messenger);

    if commands.scan {
        commands::scan::run(pipeline).await
    } else if commands.schedule {
        commands::schedule::run(&config, pipeline).await
    } else if let Some(path) = commands.report_only.as_deref() {
        commands::report::run(pipeline, path).await
    } else {
        // clap's required mode group makes this unreachable
        anyhow::bail!("one of --scan, --schedule or --report-only is required")
    }
}
