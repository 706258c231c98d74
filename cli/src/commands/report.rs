use std::path::Path;

use vigil_core::Pipeline;

/// Re-aggregates a persisted run and dispatches the notification,
/// skipping the scan entirely.
pub async fn run(pipeline: Pipeline, path: &Path) -> anyhow::Result<()> {
    let summary = pipeline.report_only(path).await?;
    println!("{summary}");
    Ok(())
}
