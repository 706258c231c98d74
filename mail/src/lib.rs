//! # SMTP Messenger Adapter
//!
//! The only place in the workspace that knows about SMTP or MIME. Builds
//! a multipart message (plain-text body, optional JSON attachment) with
//! `lettre` and submits it over a STARTTLS relay.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use vigil_common::config::EmailSettings;
use vigil_core::capability::{CapabilityError, Messenger, OutboundMessage};

/// Environment variable consulted when the configured password is empty,
/// so credentials can stay out of the configuration file.
pub const PASSWORD_ENV: &str = "VIGIL_SMTP_PASSWORD";

pub struct SmtpMessenger {
    settings: EmailSettings,
}

impl SmtpMessenger {
    pub fn new(settings: &EmailSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn password(&self) -> String {
        if !self.settings.password.is_empty() {
            return self.settings.password.clone();
        }
        std::env::var(PASSWORD_ENV).unwrap_or_default()
    }

    fn build_message(&self, message: &OutboundMessage) -> Result<Message, CapabilityError> {
        let from: Mailbox = self.settings.from.parse().map_err(|e| {
            CapabilityError::Failed(format!(
                "invalid sender address '{}': {e}",
                self.settings.from
            ))
        })?;

        let mut builder = Message::builder()
            .from(from)
            .subject(message.subject.clone());
        for recipient in &message.recipients {
            let to: Mailbox = recipient.parse().map_err(|e| {
                CapabilityError::Failed(format!("invalid recipient '{recipient}': {e}"))
            })?;
            builder = builder.to(to);
        }

        let body = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone());
        let mut parts = MultiPart::mixed().singlepart(body);

        if let Some(path) = &message.attachment {
            let bytes = std::fs::read(path).map_err(|e| {
                CapabilityError::Failed(format!("reading attachment {}: {e}", path.display()))
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scan_results.json".to_string());
            let content_type = ContentType::parse("application/json")
                .map_err(|e| CapabilityError::Failed(format!("attachment content type: {e}")))?;
            parts = parts.singlepart(Attachment::new(filename).body(bytes, content_type));
        }

        builder
            .multipart(parts)
            .map_err(|e| CapabilityError::Failed(format!("assembling message: {e}")))
    }
}

#[async_trait]
impl Messenger for SmtpMessenger {
    async fn send(&self, message: OutboundMessage) -> Result<(), CapabilityError> {
        let recipients = message.recipients.len();
        let email = self.build_message(&message)?;

        let transport = SmtpTransport::starttls_relay(&self.settings.smtp_server)
            .map_err(|e| {
                CapabilityError::Unavailable(format!(
                    "cannot reach relay {}: {e}",
                    self.settings.smtp_server
                ))
            })?
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(
                self.settings.username.clone(),
                self.password(),
            ))
            .build();

        transport
            .send(&email)
            .map_err(|e| CapabilityError::Failed(format!("smtp delivery failed: {e}")))?;

        info!("message '{}' sent to {recipients} recipients", message.subject);
        Ok(())
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
