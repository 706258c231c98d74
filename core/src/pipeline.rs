//! # Pipeline Composition
//!
//! One retriggerable unit of work: plan ranges, scan them, persist the
//! raw run, aggregate, notify. Used verbatim by the immediate CLI path
//! and by the scheduler's background loop.
//!
//! Only persistence failure is fatal. The raw run is written before any
//! rendering or delivery, so everything after that point degrades with a
//! logged warning instead of losing data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use vigil_common::config::Config;

use crate::capability::{Messenger, ScanCapability};
use crate::discovery::DiscoveryPlanner;
use crate::notify::NotificationDispatcher;
use crate::orchestrator::ScanOrchestrator;
use crate::report::{self, Summary};
use crate::store::{RunStore, StoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct PipelineOutcome {
    pub summary: Summary,
    pub report_path: PathBuf,
}

/// The full scan pipeline with its collaborators injected once.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    engine: Arc<dyn ScanCapability>,
    messenger: Arc<dyn Messenger>,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        engine: Arc<dyn ScanCapability>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config,
            engine,
            messenger,
        }
    }

    /// Runs discovery, scanning, persistence and notification.
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let ranges = DiscoveryPlanner::new(&self.config.scan).plan();
        info!("starting scan across {} network ranges", ranges.len());

        let orchestrator = ScanOrchestrator::new(&self.config.scan, Arc::clone(&self.engine));
        let run = orchestrator.scan_all(&ranges).await;

        let store = RunStore::new(self.config.report.directory.clone());
        let report_path = store.save(&run)?;

        let summary = report::summarize(&run);
        let dispatcher =
            NotificationDispatcher::new(&self.config.email, Arc::clone(&self.messenger));
        if let Err(e) = dispatcher.dispatch(&summary, Some(&report_path)).await {
            warn!("scan complete but notification failed: {e}");
        }
        self.maybe_alert(&dispatcher, &summary).await;

        Ok(PipelineOutcome {
            summary,
            report_path,
        })
    }

    /// Aggregates and notifies from an already-persisted run, skipping
    /// the scan itself.
    pub async fn report_only(&self, path: &Path) -> Result<Summary, PipelineError> {
        let run = RunStore::load(path)?;
        let summary = report::summarize(&run);
        let dispatcher =
            NotificationDispatcher::new(&self.config.email, Arc::clone(&self.messenger));
        if let Err(e) = dispatcher.dispatch(&summary, Some(path)).await {
            warn!("report processed but notification failed: {e}");
        }
        Ok(summary)
    }

    async fn maybe_alert(&self, dispatcher: &NotificationDispatcher, summary: &Summary) {
        let threshold = self.config.alerts.score_threshold;
        let max = summary.max_risk_score();
        if threshold == 0 || max < threshold {
            return;
        }
        // hosts are ranked, so the first one is the offender
        let Some(worst) = summary.hosts.first() else {
            return;
        };
        let details = format!(
            "Host {} ({}) reached risk score {max}, at or above the alert threshold of {threshold}.",
            worst.hostname, worst.ip
        );
        if let Err(e) = dispatcher.alert("High Risk Host Detected", &details, true).await {
            warn!("threshold alert could not be delivered: {e}");
        }
    }
}
