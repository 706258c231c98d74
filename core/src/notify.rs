//! # Notification Dispatcher
//!
//! Formats a run summary into an outbound message and hands it to the
//! [`Messenger`]. Policy lives here, transport does not: the disabled
//! flag short-circuits before the messenger is ever touched, and an
//! unusable attachment degrades the message to text-only instead of
//! failing it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use vigil_common::config::EmailSettings;

use crate::capability::{CapabilityError, Messenger, OutboundMessage};
use crate::report::Summary;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(#[from] CapabilityError),
    #[error("notification delivery timed out after {0}s")]
    Timeout(u64),
}

/// What `dispatch` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Notifications are disabled; nothing was contacted.
    Suppressed,
}

pub struct NotificationDispatcher {
    settings: EmailSettings,
    messenger: Arc<dyn Messenger>,
}

impl NotificationDispatcher {
    pub fn new(settings: &EmailSettings, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            settings: settings.clone(),
            messenger,
        }
    }

    /// Sends the run report, optionally attaching the persisted artifact.
    ///
    /// A delivery failure is the caller's to log; it never invalidates
    /// the run or summary that produced the message.
    pub async fn dispatch(
        &self,
        summary: &Summary,
        artifact: Option<&Path>,
    ) -> Result<Delivery, NotifyError> {
        if !self.settings.enabled {
            info!("notifications disabled, skipping report delivery");
            return Ok(Delivery::Suppressed);
        }

        let subject = format!(
            "{} Network Scan Complete - {} High Risk Issues Found",
            self.settings.subject_prefix, summary.high_risk_findings
        );
        let message = OutboundMessage {
            subject,
            body: summary.to_string(),
            recipients: self.settings.recipients.clone(),
            attachment: artifact.and_then(|path| self.attachable(path)),
        };

        self.send_bounded(message).await?;
        info!("scan report delivered to {} recipients", self.settings.recipients.len());
        Ok(Delivery::Sent)
    }

    /// Sends a threshold alert. Same enablement policy as reports.
    pub async fn alert(
        &self,
        kind: &str,
        details: &str,
        urgent: bool,
    ) -> Result<Delivery, NotifyError> {
        if !self.settings.enabled {
            info!("notifications disabled, skipping alert '{kind}'");
            return Ok(Delivery::Suppressed);
        }

        let marker = if urgent { "URGENT - " } else { "" };
        let subject = format!(
            "{} {marker}Security Alert: {kind}",
            self.settings.subject_prefix
        );
        let body = format!(
            "NETWORK SECURITY ALERT\n\
             ======================\n\n\
             Alert Type: {kind}\n\
             Timestamp: {}\n\
             Urgency: {}\n\n\
             Details:\n{details}\n\n\
             Please review your network security immediately.\n",
            Utc::now().to_rfc3339(),
            if urgent { "HIGH" } else { "NORMAL" },
        );

        self.send_bounded(OutboundMessage {
            subject,
            body,
            recipients: self.settings.recipients.clone(),
            attachment: None,
        })
        .await?;
        Ok(Delivery::Sent)
    }

    /// Delivery attempts share the per-call timeout every external
    /// capability gets; an overrun is an ordinary delivery failure.
    async fn send_bounded(&self, message: OutboundMessage) -> Result<(), NotifyError> {
        let limit = std::time::Duration::from_secs(self.settings.timeout_secs);
        match tokio::time::timeout(limit, self.messenger.send(message)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(NotifyError::Timeout(self.settings.timeout_secs)),
        }
    }

    /// Attachment policy: the file must exist and fit the configured
    /// size limit, otherwise the message goes out text-only.
    fn attachable(&self, path: &Path) -> Option<PathBuf> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() <= self.settings.max_attachment_bytes => {
                Some(path.to_path_buf())
            }
            Ok(meta) => {
                warn!(
                    "report {} is {} bytes, over the {} byte attachment limit, sending text only",
                    path.display(),
                    meta.len(),
                    self.settings.max_attachment_bytes
                );
                None
            }
            Err(e) => {
                warn!("report {} not attachable: {e}", path.display());
                None
            }
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
