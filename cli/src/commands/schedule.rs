use tracing::info;

use vigil_common::config::Config;
use vigil_core::Pipeline;
use vigil_core::scheduler::ScanScheduler;

/// Runs the scheduler until the process is interrupted, then stops it
/// gracefully. A scan already in flight finishes before we return.
pub async fn run(config: &Config, pipeline: Pipeline) -> anyhow::Result<()> {
    let cadence = config.schedule.cadence()?;
    let scheduler = ScanScheduler::new(cadence);

    scheduler.start(move || {
        let pipeline = pipeline.clone();
        async move {
            pipeline.run().await?;
            Ok(())
        }
    });

    println!("Scheduler started. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("interrupt received, stopping scheduler");
    scheduler.stop().await;
    println!("Scheduler stopped.");
    Ok(())
}
