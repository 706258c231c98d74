//! # Scan Data Model
//!
//! The persisted shape of one orchestrated scan: a [`ScanRun`] holding a
//! [`RangeReport`] per network range, holding a [`HostRecord`] per live
//! host, holding a [`PortRecord`] per observed `port/protocol` pair.
//!
//! A run is append-only while scanning and treated as read-only by every
//! downstream consumer once [`ScanRun::finalize`] has stamped the end
//! time. The serde layer reproduces the on-disk JSON layout exactly, and
//! deserialization tolerates missing fields so that partial results
//! written by older builds still load.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::risk::RiskTier;

/// Transport protocol of a scanned port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol '{other}'")),
        }
    }
}

/// Map key for a host's port table, rendered as `"80/tcp"` on disk.
///
/// Using a structured key (rather than the raw string) makes duplicate
/// `(port, protocol)` entries unrepresentable and keeps the JSON object
/// deterministically ordered by port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PortKey {
    pub port: u16,
    pub protocol: Protocol,
}

impl PortKey {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

impl FromStr for PortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (port, proto) = s
            .split_once('/')
            .ok_or_else(|| format!("port key '{s}' is not of the form <port>/<proto>"))?;
        let port: u16 = port
            .parse()
            .map_err(|_| format!("invalid port number in key '{s}'"))?;
        let protocol: Protocol = proto.parse()?;
        Ok(Self { port, protocol })
    }
}

impl Serialize for PortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Port state as reported by the scan engine, nmap conventions.
///
/// Serialized through its string form so that states written by other
/// engine versions degrade to [`PortState::Unknown`] instead of failing
/// the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
    OpenFiltered,
    /// Anything the engine reports that we do not model.
    #[default]
    Unknown,
}

impl PortState {
    pub fn is_open(self) -> bool {
        matches!(self, PortState::Open)
    }
}

impl From<&str> for PortState {
    fn from(raw: &str) -> Self {
        match raw {
            "open" => PortState::Open,
            "closed" => PortState::Closed,
            "filtered" => PortState::Filtered,
            "open|filtered" => PortState::OpenFiltered,
            _ => PortState::Unknown,
        }
    }
}

impl From<String> for PortState {
    fn from(raw: String) -> Self {
        raw.as_str().into()
    }
}

impl From<PortState> for String {
    fn from(state: PortState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
            PortState::Filtered => write!(f, "filtered"),
            PortState::OpenFiltered => write!(f, "open|filtered"),
            PortState::Unknown => write!(f, "unknown"),
        }
    }
}

/// One observed port on one host, risk tier included.
///
/// The tier is computed at ingestion and lives with its source port for
/// the rest of the record's life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    #[serde(default)]
    pub state: PortState,
    #[serde(default = "unknown_service")]
    pub service: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub extrainfo: String,
    #[serde(default)]
    pub risk_level: RiskTier,
}

fn unknown_service() -> String {
    "unknown".to_string()
}

/// Best OS guess for a host, defaulting to unknown with zero confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsGuess {
    #[serde(default = "unknown_os")]
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub accuracy: u8,
}

fn unknown_os() -> String {
    "Unknown".to_string()
}

impl Default for OsGuess {
    fn default() -> Self {
        Self {
            os: unknown_os(),
            version: None,
            accuracy: 0,
        }
    }
}

/// Everything learned about one live host.
///
/// A record either carries scan data or an `error` marker, never both: a
/// failed probe produces [`HostRecord::failed`], which has no ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HostRecord {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub os_info: OsGuess,
    #[serde(default)]
    pub ports: BTreeMap<PortKey, PortRecord>,
    #[serde(default)]
    pub vulnerabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostRecord {
    /// Record for a host whose probe failed or timed out.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// All hosts scanned within one network range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeReport {
    pub scan_time: DateTime<Utc>,
    pub network_range: String,
    pub total_hosts_scanned: usize,
    #[serde(default)]
    pub hosts: BTreeMap<IpAddr, HostRecord>,
}

/// Run-level bookkeeping: when the run happened and which ranges it
/// attempted, including the ones that had to be skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub networks_scanned: Vec<String>,
    pub total_networks: usize,
    /// Ranges whose host-discovery phase failed, with the reason.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skipped: BTreeMap<String, String>,
}

/// The full structured result of one orchestrated scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRun {
    pub scan_metadata: ScanMetadata,
    pub results: BTreeMap<String, RangeReport>,
}

impl ScanRun {
    /// Opens a run over the given attempted ranges, stamped with the
    /// current time.
    pub fn begin(attempted: Vec<String>) -> Self {
        let total_networks = attempted.len();
        Self {
            scan_metadata: ScanMetadata {
                start_time: Utc::now(),
                end_time: None,
                networks_scanned: attempted,
                total_networks,
                skipped: BTreeMap::new(),
            },
            results: BTreeMap::new(),
        }
    }

    pub fn record_range(&mut self, range: String, report: RangeReport) {
        self.results.insert(range, report);
    }

    pub fn record_skipped(&mut self, range: String, error: String) {
        self.scan_metadata.skipped.insert(range, error);
    }

    /// Stamps the end time. The run is read-only from here on, which the
    /// by-value signature makes hard to get wrong.
    pub fn finalize(mut self) -> Self {
        self.scan_metadata.end_time = Some(Utc::now());
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.scan_metadata.end_time.is_some()
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
