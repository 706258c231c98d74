//! # Nmap Engine Adapter
//!
//! Implements the scan capability by driving the system `nmap` binary
//! as a subprocess: `-sn` sweeps for host discovery, `-sV -O` probes for
//! per-host service and OS detection. Output is parsed line-wise from
//! the normal report format; every extracted field is optional, matching
//! the loose ingestion schema the orchestrator validates against.

use std::net::IpAddr;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use vigil_common::config::ScanSettings;
use vigil_common::network::range::NetworkRange;
use vigil_core::capability::{CapabilityError, HostProbe, OsProbe, PortProbe, ScanCapability};

pub struct NmapEngine {
    binary: String,
    intensity: u8,
}

impl NmapEngine {
    pub fn new(settings: &ScanSettings) -> Self {
        Self {
            binary: "nmap".to_string(),
            intensity: settings.intensity.min(5),
        }
    }

    /// Points the adapter at a non-default binary, mainly for setups
    /// where nmap lives outside `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run(&self, args: Vec<String>) -> Result<String, CapabilityError> {
        debug!("running {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                CapabilityError::Unavailable(format!("cannot launch {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CapabilityError::Failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ScanCapability for NmapEngine {
    async fn discover_hosts(&self, range: &NetworkRange) -> Result<Vec<IpAddr>, CapabilityError> {
        let out = self
            .run(vec!["-sn".into(), "-n".into(), range.to_string()])
            .await?;
        Ok(parse_live_hosts(&out))
    }

    async fn probe_host(&self, host: IpAddr, ports: &[u16]) -> Result<HostProbe, CapabilityError> {
        let port_list = ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let out = self
            .run(vec![
                "-Pn".into(),
                format!("-T{}", self.intensity),
                "-sV".into(),
                "-O".into(),
                "-p".into(),
                port_list,
                host.to_string(),
            ])
            .await?;
        Ok(parse_host_probe(&out))
    }
}

const REPORT_PREFIX: &str = "Nmap scan report for ";

fn parse_live_hosts(output: &str) -> Vec<IpAddr> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(REPORT_PREFIX))
        .filter_map(|rest| report_address(rest).parse().ok())
        .collect()
}

/// The report line is either `1.2.3.4` or `name.lan (1.2.3.4)`.
fn report_address(rest: &str) -> &str {
    match (rest.rfind('('), rest.rfind(')')) {
        (Some(start), Some(end)) if end > start => &rest[start + 1..end],
        _ => rest.trim(),
    }
}

fn report_hostname(rest: &str) -> Option<String> {
    let name = rest.split('(').next()?.trim();
    if name.is_empty() || name.parse::<IpAddr>().is_ok() {
        None
    } else {
        Some(name.to_string())
    }
}

fn parse_host_probe(output: &str) -> HostProbe {
    let mut probe = HostProbe::default();
    let mut os = OsProbe::default();

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix(REPORT_PREFIX) {
            probe.hostname = report_hostname(rest);
        } else if line.starts_with("Host is up") {
            probe.state = Some("up".to_string());
        } else if line.starts_with("Host seems down") {
            probe.state = Some("down".to_string());
        } else if let Some(details) = line.strip_prefix("OS details: ") {
            os.os = Some(details.trim().to_string());
        } else if let Some(running) = line.strip_prefix("Running: ") {
            os.version = Some(running.trim().to_string());
        } else if let Some(guesses) = line.strip_prefix("Aggressive OS guesses: ") {
            os.accuracy = first_guess_accuracy(guesses);
            if os.os.is_none() {
                os.os = guesses.split('(').next().map(|g| g.trim().to_string());
            }
        } else if let Some(port) = parse_port_line(line) {
            probe.ports.push(port);
        }
    }

    if os.os.is_some() || os.version.is_some() || os.accuracy.is_some() {
        probe.os = Some(os);
    }
    probe
}

/// A port table row: `22/tcp  open  ssh  OpenSSH 8.9p1 (Ubuntu ...)`.
fn parse_port_line(line: &str) -> Option<PortProbe> {
    let mut parts = line.split_whitespace();
    let (port, protocol) = parts.next()?.split_once('/')?;
    let port: u16 = port.parse().ok()?;
    if !matches!(protocol, "tcp" | "udp") {
        return None;
    }

    let state = parts.next()?.to_string();
    let service = parts.next().map(str::to_string);
    let rest: Vec<&str> = parts.collect();
    let (product, version, extrainfo) = parse_version_column(&rest.join(" "));

    Some(PortProbe {
        port,
        protocol: Some(protocol.to_string()),
        state: Some(state),
        service,
        version,
        product,
        extrainfo,
    })
}

/// Splits nmap's VERSION column into product, version and the
/// parenthesized extra info, e.g.
/// `OpenSSH 8.9p1 Ubuntu 3ubuntu0.1 (Ubuntu Linux; protocol 2.0)`.
fn parse_version_column(rest: &str) -> (Option<String>, Option<String>, Option<String>) {
    let (head, extrainfo) = match (rest.find('('), rest.rfind(')')) {
        (Some(start), Some(end)) if end > start => (
            rest[..start].trim(),
            Some(rest[start + 1..end].to_string()),
        ),
        _ => (rest.trim(), None),
    };
    if head.is_empty() {
        return (None, None, extrainfo);
    }

    let tokens: Vec<&str> = head.split_whitespace().collect();
    let first_versionish = tokens
        .iter()
        .position(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()));
    match first_versionish {
        Some(0) => (None, Some(tokens.join(" ")), extrainfo),
        Some(idx) => (
            Some(tokens[..idx].join(" ")),
            Some(tokens[idx..].join(" ")),
            extrainfo,
        ),
        None => (Some(tokens.join(" ")), None, extrainfo),
    }
}

fn first_guess_accuracy(guesses: &str) -> Option<u8> {
    let after_paren = guesses.split('(').nth(1)?;
    let percent = after_paren.split('%').next()?;
    percent.trim().parse().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
