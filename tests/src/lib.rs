//! In-memory capability fakes shared by the integration tests.
//!
//! [`ScriptedEngine`] plays the scan engine with per-range host lists
//! and injectable failures; [`RecordingMessenger`] captures every
//! outbound message so tests can assert on delivery policy.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use vigil_common::network::range::NetworkRange;
use vigil_core::capability::{
    CapabilityError, HostProbe, Messenger, OutboundMessage, PortProbe, ScanCapability,
};

/// Scan engine fake with scripted topology.
#[derive(Default)]
pub struct ScriptedEngine {
    pub hosts_by_range: HashMap<String, Vec<IpAddr>>,
    pub failing_ranges: Vec<String>,
    pub failing_hosts: Vec<IpAddr>,
    /// Ports every successfully probed host reports as open.
    pub open_ports: Vec<u16>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: &str, hosts: &[IpAddr]) -> Self {
        self.hosts_by_range.insert(range.to_string(), hosts.to_vec());
        self
    }

    pub fn with_open_ports(mut self, ports: &[u16]) -> Self {
        self.open_ports = ports.to_vec();
        self
    }

    pub fn failing_range(mut self, range: &str) -> Self {
        self.failing_ranges.push(range.to_string());
        self
    }

    pub fn failing_host(mut self, host: IpAddr) -> Self {
        self.failing_hosts.push(host);
        self
    }
}

fn well_known_service(port: u16) -> &'static str {
    match port {
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        80 => "http",
        443 => "https",
        _ => "unknown",
    }
}

#[async_trait]
impl ScanCapability for ScriptedEngine {
    async fn discover_hosts(&self, range: &NetworkRange) -> Result<Vec<IpAddr>, CapabilityError> {
        let key = range.to_string();
        if self.failing_ranges.contains(&key) {
            return Err(CapabilityError::Unavailable("engine unreachable".into()));
        }
        Ok(self.hosts_by_range.get(&key).cloned().unwrap_or_default())
    }

    async fn probe_host(&self, host: IpAddr, _ports: &[u16]) -> Result<HostProbe, CapabilityError> {
        if self.failing_hosts.contains(&host) {
            return Err(CapabilityError::Failed("injected probe failure".into()));
        }
        Ok(HostProbe {
            hostname: Some(format!("host-{}", host.to_string().replace('.', "-"))),
            state: Some("up".into()),
            os: None,
            ports: self
                .open_ports
                .iter()
                .map(|&port| PortProbe {
                    port,
                    protocol: Some("tcp".into()),
                    state: Some("open".into()),
                    service: Some(well_known_service(port).into()),
                    ..PortProbe::default()
                })
                .collect(),
        })
    }
}

/// Messenger fake that records instead of delivering.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: OutboundMessage) -> Result<(), CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(message);
        if self.fail {
            return Err(CapabilityError::Failed("relay rejected the message".into()));
        }
        Ok(())
    }
}
