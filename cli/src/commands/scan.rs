use colored::*;

use vigil_core::Pipeline;

use crate::terminal::spinner;

/// Immediate, synchronous pipeline run on the caller's task.
///
/// Only a persistence failure propagates (and exits non-zero); scan and
/// notification trouble has already been degraded and logged upstream.
pub async fn run(pipeline: Pipeline) -> anyhow::Result<()> {
    println!("Starting network vulnerability scan...");
    let progress = spinner::start("scanning networks");

    let outcome = pipeline.run().await;
    progress.finish_and_clear();
    let outcome = outcome?;

    let headline = format!(
        "Scan complete: {} high risk findings across {} hosts",
        outcome.summary.high_risk_findings, outcome.summary.total_hosts
    );
    println!("{}", headline.bold().green());
    println!();
    println!("{}", outcome.summary);
    println!("Results saved to: {}", outcome.report_path.display());
    Ok(())
}
