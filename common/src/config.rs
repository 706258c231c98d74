//! # Runtime Configuration
//!
//! One immutable [`Config`] value is deserialized from a TOML file at
//! startup and handed by reference to every component constructor.
//! Nothing in the workspace mutates it afterwards, so it needs no
//! locking and no global state.

use std::path::Path;

use anyhow::Context;
use chrono::{NaiveTime, Weekday};
use serde::Deserialize;
use tracing::info;

/// Top-level configuration, one section per concern.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scan: ScanSettings,
    pub report: ReportSettings,
    pub schedule: ScheduleSettings,
    pub alerts: AlertSettings,
    pub email: EmailSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanSettings::default(),
            report: ReportSettings::default(),
            schedule: ScheduleSettings::default(),
            alerts: AlertSettings::default(),
            email: EmailSettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, falling back to built-in
    /// defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("no configuration file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing configuration file {}", path.display()))?;
        config.schedule.cadence().context("validating [schedule]")?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// Statically configured target ranges, unioned with auto-discovered
    /// local /24 networks at plan time.
    pub network_ranges: Vec<String>,
    /// Whether local interface subnets are added to the target set.
    pub auto_discover: bool,
    /// Ports requested from the scan engine for every live host.
    pub ports: Vec<u16>,
    /// Engine timing template, 0 (paranoid) to 5 (insane).
    pub intensity: u8,
    /// Upper bound for a single host probe, including service and OS
    /// detection.
    pub host_timeout_secs: u64,
    /// Upper bound for the liveness sweep of one range.
    pub discovery_timeout_secs: u64,
    /// Worker-pool width for concurrent host probes within a range.
    pub max_concurrent_hosts: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            network_ranges: vec![
                "192.168.1.0/24".to_string(),
                "192.168.0.0/24".to_string(),
                "10.0.0.0/24".to_string(),
            ],
            auto_discover: true,
            ports: vec![
                21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 993, 995, 1723, 3306,
                3389, 5432, 5900, 8080,
            ],
            intensity: 4,
            host_timeout_secs: 300,
            discovery_timeout_secs: 300,
            max_concurrent_hosts: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// Directory scan runs are persisted into, created on demand.
    pub directory: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            directory: "reports/current".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    /// `"daily"` or `"weekly"`.
    pub frequency: String,
    /// Trigger weekday for weekly cadence, e.g. `"monday"`.
    pub day: String,
    /// Trigger time of day, `HH:MM` local time.
    pub time: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            frequency: "weekly".to_string(),
            day: "monday".to_string(),
            time: "02:00".to_string(),
        }
    }
}

impl ScheduleSettings {
    /// Parses the section into a validated [`Cadence`].
    pub fn cadence(&self) -> anyhow::Result<Cadence> {
        let at = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .with_context(|| format!("invalid schedule time '{}'", self.time))?;
        match self.frequency.to_ascii_lowercase().as_str() {
            "daily" => Ok(Cadence::Daily { at }),
            "weekly" => {
                let day: Weekday = self
                    .day
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid schedule day '{}'", self.day))?;
                Ok(Cadence::Weekly { day, at })
            }
            other => anyhow::bail!("unknown schedule frequency '{other}'"),
        }
    }
}

/// A recurring trigger definition, local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily { at: NaiveTime },
    Weekly { day: Weekday, at: NaiveTime },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertSettings {
    /// A host whose risk score reaches this value triggers an urgent
    /// alert message in addition to the regular report.
    pub score_threshold: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self { score_threshold: 7 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailSettings {
    pub enabled: bool,
    pub recipients: Vec<String>,
    pub subject_prefix: String,
    /// Attachments beyond this size are dropped and the message is sent
    /// text-only.
    pub max_attachment_bytes: u64,
    /// Upper bound for one delivery attempt.
    pub timeout_secs: u64,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    /// Empty means: read `VIGIL_SMTP_PASSWORD` from the environment.
    pub password: String,
    pub from: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            recipients: vec![
                "admin@yourdomain.com".to_string(),
                "security@yourdomain.com".to_string(),
            ],
            subject_prefix: "[Network Scanner]".to_string(),
            max_attachment_bytes: 10 * 1024 * 1024,
            timeout_secs: 30,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
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
