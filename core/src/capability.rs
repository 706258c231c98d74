//! # External Capability Seams
//!
//! The orchestration core never probes a network or speaks SMTP itself;
//! it depends on these two traits and nothing else. High-level modules
//! hold a `dyn` handle and stay ignorant of whether the other side is an
//! nmap subprocess, a mail relay, or a test fake.
//!
//! Probe results cross this boundary in the loosely-typed [`HostProbe`]
//! shape: every field optional, because real engines omit fields all the
//! time. Validation and defaulting happen at ingestion, before anything
//! enters the data model.

use std::net::IpAddr;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use vigil_common::network::range::NetworkRange;

/// Failure reported by an external capability call.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The capability itself could not be reached or started.
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    /// The call ran but did not produce a usable result.
    #[error("{0}")]
    Failed(String),
}

/// Raw per-port observation as the engine reports it.
#[derive(Debug, Clone, Default)]
pub struct PortProbe {
    pub port: u16,
    pub protocol: Option<String>,
    pub state: Option<String>,
    pub service: Option<String>,
    pub version: Option<String>,
    pub product: Option<String>,
    pub extrainfo: Option<String>,
}

/// Raw OS detection result, if the engine produced one.
#[derive(Debug, Clone, Default)]
pub struct OsProbe {
    pub os: Option<String>,
    pub version: Option<String>,
    pub accuracy: Option<u8>,
}

/// Raw per-host result of a service/version/OS probe.
#[derive(Debug, Clone, Default)]
pub struct HostProbe {
    pub hostname: Option<String>,
    pub state: Option<String>,
    pub os: Option<OsProbe>,
    pub ports: Vec<PortProbe>,
}

/// The low-level probing engine.
#[async_trait]
pub trait ScanCapability: Send + Sync {
    /// Ports-less liveness sweep of a range, returning the live hosts.
    async fn discover_hosts(&self, range: &NetworkRange) -> Result<Vec<IpAddr>, CapabilityError>;

    /// Service/version/OS probe of one live host over the given ports.
    async fn probe_host(&self, host: IpAddr, ports: &[u16]) -> Result<HostProbe, CapabilityError>;
}

/// One outbound notification, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub attachment: Option<PathBuf>,
}

/// The message relay.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<(), CapabilityError>;
}
