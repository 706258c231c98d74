//! # Report Aggregation
//!
//! Derives an immutable [`Summary`] from a finalized [`ScanRun`] in a
//! single walk. Summaries are recomputed on demand and never feed back
//! into the run; computing one twice from the same run yields
//! byte-identical output, which the ranking guarantees by breaking score
//! ties on ascending IP address.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use vigil_common::model::{PortKey, ScanRun};
use vigil_common::risk::RiskTier;

/// How many ranked hosts the compact notification text shows.
pub const TOP_HOSTS: usize = 5;
/// How many ports each of those hosts lists.
const TOP_PORTS_PER_HOST: usize = 3;

/// Open-port counts per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl TierCounts {
    fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::High => self.high += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::Low => self.low += 1,
            RiskTier::Info => self.info += 1,
        }
    }
}

/// One open port in a host's finding list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPort {
    pub port: PortKey,
    pub service: String,
    pub version: String,
    pub risk_level: RiskTier,
}

/// One host in the ranked listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostFinding {
    pub ip: IpAddr,
    pub hostname: String,
    pub os: String,
    pub risk_score: u32,
    pub open_ports: Vec<OpenPort>,
}

/// Totals, histograms and the ranked host list for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub scan_started: DateTime<Utc>,
    pub total_networks: usize,
    pub total_hosts: usize,
    pub total_open_ports: usize,
    pub high_risk_findings: usize,
    pub medium_risk_findings: usize,
    pub risk_breakdown: TierCounts,
    pub top_services: BTreeMap<String, usize>,
    /// Every scannable host, descending risk score, ties broken by
    /// ascending IP.
    pub hosts: Vec<HostFinding>,
}

impl Summary {
    /// The bounded view used for notification text.
    pub fn top_hosts(&self) -> &[HostFinding] {
        &self.hosts[..self.hosts.len().min(TOP_HOSTS)]
    }

    /// Highest host risk score in the run, 0 when nothing was found.
    pub fn max_risk_score(&self) -> u32 {
        self.hosts.first().map(|h| h.risk_score).unwrap_or(0)
    }
}

/// Walks every range, host and port of `run` once and accumulates the
/// summary. Error-marker hosts contribute to nothing.
pub fn summarize(run: &ScanRun) -> Summary {
    let mut summary = Summary {
        scan_started: run.scan_metadata.start_time,
        total_networks: 0,
        total_hosts: 0,
        total_open_ports: 0,
        high_risk_findings: 0,
        medium_risk_findings: 0,
        risk_breakdown: TierCounts::default(),
        top_services: BTreeMap::new(),
        hosts: Vec::new(),
    };

    for report in run.results.values() {
        summary.total_networks += 1;
        summary.total_hosts += report.total_hosts_scanned;

        for (ip, host) in &report.hosts {
            if host.is_failed() {
                continue;
            }

            let mut finding = HostFinding {
                ip: *ip,
                hostname: host.hostname.clone(),
                os: host.os_info.os.clone(),
                risk_score: 0,
                open_ports: Vec::new(),
            };

            for (key, port) in &host.ports {
                if !port.state.is_open() {
                    continue;
                }
                summary.total_open_ports += 1;
                *summary.top_services.entry(port.service.clone()).or_insert(0) += 1;
                summary.risk_breakdown.record(port.risk_level);
                match port.risk_level {
                    RiskTier::High => summary.high_risk_findings += 1,
                    RiskTier::Medium => summary.medium_risk_findings += 1,
                    _ => {}
                }
                finding.risk_score += port.risk_level.score_weight();
                finding.open_ports.push(OpenPort {
                    port: *key,
                    service: port.service.clone(),
                    version: port.version.clone(),
                    risk_level: port.risk_level,
                });
            }

            summary.hosts.push(finding);
        }
    }

    summary
        .hosts
        .sort_by(|a, b| b.risk_score.cmp(&a.risk_score).then(a.ip.cmp(&b.ip)));
    summary
}

/// Plain-text rendering used as the notification body.
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network Security Scan Summary")?;
        writeln!(f, "=============================")?;
        writeln!(f, "Scan Date: {}", self.scan_started.to_rfc3339())?;
        writeln!(f)?;
        writeln!(f, "OVERVIEW:")?;
        writeln!(f, "- Networks Scanned: {}", self.total_networks)?;
        writeln!(f, "- Total Hosts Found: {}", self.total_hosts)?;
        writeln!(f, "- Total Open Ports: {}", self.total_open_ports)?;
        writeln!(f)?;
        writeln!(f, "RISK ASSESSMENT:")?;
        writeln!(f, "- High Risk Findings: {}", self.high_risk_findings)?;
        writeln!(f, "- Medium Risk Findings: {}", self.medium_risk_findings)?;
        writeln!(f, "- Low Risk Findings: {}", self.risk_breakdown.low)?;
        writeln!(f)?;
        writeln!(f, "TOP VULNERABLE HOSTS:")?;
        for (i, host) in self.top_hosts().iter().enumerate() {
            writeln!(
                f,
                "{}. {} ({}) - Risk Score: {}",
                i + 1,
                host.hostname,
                host.ip,
                host.risk_score
            )?;
            for port in host.open_ports.iter().take(TOP_PORTS_PER_HOST) {
                writeln!(
                    f,
                    "   - {}: {} ({})",
                    port.port, port.service, port.risk_level
                )?;
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::net::Ipv4Addr;
    use vigil_common::model::{
        HostRecord, PortRecord, PortState, Protocol, RangeReport, ScanRun,
    };
    use vigil_common::risk;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    fn port_record(port: u16, state: PortState, service: &str) -> (PortKey, PortRecord) {
        (
            PortKey::new(port, Protocol::Tcp),
            PortRecord {
                state,
                service: service.to_string(),
                version: String::new(),
                product: String::new(),
                extrainfo: String::new(),
                risk_level: risk::classify(port, state),
            },
        )
    }

    fn host(ports: Vec<(PortKey, PortRecord)>) -> HostRecord {
        HostRecord {
            hostname: "box".into(),
            state: "up".into(),
            ports: ports.into_iter().collect(),
            ..HostRecord::default()
        }
    }

    fn run_with_hosts(hosts: Vec<(IpAddr, HostRecord)>) -> ScanRun {
        let count = hosts.len();
        let mut run = ScanRun::begin(vec!["10.0.0.0/24".into()]);
        run.record_range(
            "10.0.0.0/24".into(),
            RangeReport {
                scan_time: Utc::now(),
                network_range: "10.0.0.0/24".into(),
                total_hosts_scanned: count,
                hosts: hosts.into_iter().collect(),
            },
        );
        run.finalize()
    }

    #[test]
    fn risk_score_is_the_weighted_tier_sum() {
        // 23 → HIGH(3), 22 → MEDIUM(2), 8080 → LOW(1): score 6
        let run = run_with_hosts(vec![(
            ip(1),
            host(vec![
                port_record(23, PortState::Open, "telnet"),
                port_record(22, PortState::Open, "ssh"),
                port_record(8080, PortState::Open, "http-proxy"),
            ]),
        )]);
        let summary = summarize(&run);

        assert_eq!(summary.hosts.len(), 1);
        let finding = &summary.hosts[0];
        assert_eq!(finding.risk_score, 6);
        let recomputed: u32 = finding
            .open_ports
            .iter()
            .map(|p| p.risk_level.score_weight())
            .sum();
        assert_eq!(finding.risk_score, recomputed);
        assert_eq!(summary.high_risk_findings, 1);
        assert_eq!(summary.medium_risk_findings, 1);
        assert_eq!(summary.risk_breakdown.low, 1);
    }

    #[test]
    fn equal_scores_rank_by_ascending_ip() {
        let telnet = || vec![port_record(23, PortState::Open, "telnet")];
        let run = run_with_hosts(vec![
            (ip(5), host(telnet())),
            (ip(2), host(telnet())),
            (ip(9), host(vec![port_record(8080, PortState::Open, "http")])),
        ]);
        let summary = summarize(&run);

        let order: Vec<IpAddr> = summary.hosts.iter().map(|h| h.ip).collect();
        // 10.0.0.2 and 10.0.0.5 tie on score 3 and sort numerically;
        // 10.0.0.9 trails with score 1
        assert_eq!(order, vec![ip(2), ip(5), ip(9)]);
    }

    #[test]
    fn closed_and_filtered_ports_never_reach_totals() {
        let run = run_with_hosts(vec![(
            ip(1),
            host(vec![
                port_record(21, PortState::Closed, "ftp"),
                port_record(80, PortState::Filtered, "http"),
                port_record(443, PortState::Open, "https"),
            ]),
        )]);
        let summary = summarize(&run);

        assert_eq!(summary.total_open_ports, 1);
        assert_eq!(summary.high_risk_findings, 0);
        assert_eq!(summary.hosts[0].risk_score, 1);
        assert_eq!(summary.top_services.keys().collect::<Vec<_>>(), vec!["https"]);
    }

    #[test]
    fn failed_hosts_are_excluded_from_findings() {
        let run = run_with_hosts(vec![
            (ip(1), host(vec![port_record(22, PortState::Open, "ssh")])),
            (ip(2), HostRecord::failed("timed out")),
        ]);
        let summary = summarize(&run);

        assert_eq!(summary.hosts.len(), 1);
        assert_eq!(summary.hosts[0].ip, ip(1));
        // the failed host still counted toward hosts scanned
        assert_eq!(summary.total_hosts, 2);
    }

    #[test]
    fn summaries_are_idempotent_to_the_byte() {
        let run = run_with_hosts(vec![
            (ip(3), host(vec![port_record(23, PortState::Open, "telnet")])),
            (ip(1), host(vec![port_record(22, PortState::Open, "ssh")])),
        ]);
        let first = summarize(&run);
        let second = summarize(&run);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn top_hosts_is_bounded_and_text_lists_only_those() {
        let hosts: Vec<(IpAddr, HostRecord)> = (1..=8)
            .map(|i| (ip(i), host(vec![port_record(23, PortState::Open, "telnet")])))
            .collect();
        let summary = summarize(&run_with_hosts(hosts));

        assert_eq!(summary.hosts.len(), 8);
        assert_eq!(summary.top_hosts().len(), TOP_HOSTS);

        let text = summary.to_string();
        assert!(text.contains("TOP VULNERABLE HOSTS:"));
        assert!(text.contains("5. box (10.0.0.5)"));
        assert!(!text.contains("6. box"));
    }

    #[test]
    fn text_rendering_carries_the_overview_numbers() {
        let run = run_with_hosts(vec![(
            ip(1),
            host(vec![
                port_record(23, PortState::Open, "telnet"),
                port_record(443, PortState::Open, "https"),
            ]),
        )]);
        let text = summarize(&run).to_string();

        assert!(text.contains("- Networks Scanned: 1"));
        assert!(text.contains("- Total Open Ports: 2"));
        assert!(text.contains("- High Risk Findings: 1"));
        assert!(text.contains("   - 23/tcp: telnet (HIGH)"));
    }
}
