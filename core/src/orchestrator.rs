//! # Scan Orchestrator
//!
//! Drives the scan engine across every planned range and assembles the
//! [`ScanRun`]. Built around partial-failure tolerance: a range whose
//! liveness sweep fails is skipped and recorded, a host whose probe
//! fails or times out becomes an error-marker record, and neither event
//! aborts anything else.
//!
//! Host probes within a range run on a bounded tokio worker pool; the
//! workers only ever return records, and insertion into the range map
//! happens on the orchestrator task alone, so no two writers ever touch
//! the same entry.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, warn};

use vigil_common::config::ScanSettings;
use vigil_common::model::{
    HostRecord, OsGuess, PortKey, PortRecord, PortState, Protocol, RangeReport, ScanRun,
};
use vigil_common::network::range::NetworkRange;
use vigil_common::risk;

use crate::capability::{HostProbe, OsProbe, ScanCapability};

pub struct ScanOrchestrator {
    capability: Arc<dyn ScanCapability>,
    ports: Arc<Vec<u16>>,
    host_timeout: Duration,
    discovery_timeout: Duration,
    max_concurrent: usize,
}

impl ScanOrchestrator {
    pub fn new(settings: &ScanSettings, capability: Arc<dyn ScanCapability>) -> Self {
        Self {
            capability,
            ports: Arc::new(settings.ports.clone()),
            host_timeout: Duration::from_secs(settings.host_timeout_secs),
            discovery_timeout: Duration::from_secs(settings.discovery_timeout_secs),
            max_concurrent: settings.max_concurrent_hosts.max(1),
        }
    }

    /// Scans every range and returns the finalized run.
    ///
    /// Ranges are processed independently; their relative order carries
    /// no meaning and is not part of the contract.
    pub async fn scan_all(&self, ranges: &BTreeSet<NetworkRange>) -> ScanRun {
        let attempted: Vec<String> = ranges.iter().map(ToString::to_string).collect();
        let mut run = ScanRun::begin(attempted);

        for range in ranges {
            info!("discovering hosts in {range}");
            let sweep = timeout(self.discovery_timeout, self.capability.discover_hosts(range));
            let hosts = match sweep.await {
                Ok(Ok(hosts)) => hosts,
                Ok(Err(e)) => {
                    warn!("skipping {range}: {e}");
                    run.record_skipped(range.to_string(), e.to_string());
                    continue;
                }
                Err(_) => {
                    let reason = format!(
                        "host discovery timed out after {}s",
                        self.discovery_timeout.as_secs()
                    );
                    warn!("skipping {range}: {reason}");
                    run.record_skipped(range.to_string(), reason);
                    continue;
                }
            };

            info!("{} live hosts in {range}", hosts.len());
            let report = self.scan_range(range, hosts).await;
            run.record_range(range.to_string(), report);
        }

        run.finalize()
    }

    async fn scan_range(&self, range: &NetworkRange, hosts: Vec<IpAddr>) -> RangeReport {
        let scan_time = Utc::now();
        let total_hosts_scanned = hosts.len();
        let pool = Arc::new(Semaphore::new(self.max_concurrent));
        let mut workers: JoinSet<(IpAddr, HostRecord)> = JoinSet::new();

        for host in hosts {
            let capability = Arc::clone(&self.capability);
            let ports = Arc::clone(&self.ports);
            let pool = Arc::clone(&pool);
            let host_timeout = self.host_timeout;
            workers.spawn(async move {
                let _permit = match pool.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (host, HostRecord::failed("scan worker pool closed")),
                };
                let record = match timeout(host_timeout, capability.probe_host(host, &ports)).await
                {
                    Ok(Ok(probe)) => ingest(host, probe),
                    Ok(Err(e)) => HostRecord::failed(e.to_string()),
                    Err(_) => HostRecord::failed(format!(
                        "probe timed out after {}s",
                        host_timeout.as_secs()
                    )),
                };
                (host, record)
            });
        }

        // Aggregation happens here, on the orchestrator task only.
        let mut host_map = BTreeMap::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((ip, record)) => {
                    if let Some(reason) = &record.error {
                        warn!("host {ip}: {reason}");
                    }
                    host_map.insert(ip, record);
                }
                Err(e) => error!("host scan worker aborted: {e}"),
            }
        }

        RangeReport {
            scan_time,
            network_range: range.to_string(),
            total_hosts_scanned,
            hosts: host_map,
        }
    }
}

/// Ingestion boundary: validates and defaults a raw engine result into a
/// [`HostRecord`], classifying every port as it enters the model.
pub fn ingest(host: IpAddr, probe: HostProbe) -> HostRecord {
    let mut ports = BTreeMap::new();
    for observed in probe.ports {
        let protocol: Protocol = observed
            .protocol
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let state = observed
            .state
            .as_deref()
            .map(PortState::from)
            .unwrap_or(PortState::Unknown);
        let record = PortRecord {
            state,
            service: non_empty(observed.service).unwrap_or_else(|| "unknown".to_string()),
            version: non_empty(observed.version).unwrap_or_default(),
            product: non_empty(observed.product).unwrap_or_default(),
            extrainfo: non_empty(observed.extrainfo).unwrap_or_default(),
            risk_level: risk::classify(observed.port, state),
        };
        // first observation of a (port, protocol) pair wins
        ports.entry(PortKey::new(observed.port, protocol)).or_insert(record);
    }

    HostRecord {
        hostname: non_empty(probe.hostname).unwrap_or_else(|| host.to_string()),
        state: non_empty(probe.state).unwrap_or_else(|| "up".to_string()),
        os_info: probe.os.map(ingest_os).unwrap_or_default(),
        ports,
        vulnerabilities: Vec::new(),
        error: None,
    }
}

fn ingest_os(probe: OsProbe) -> OsGuess {
    OsGuess {
        os: non_empty(probe.os).unwrap_or_else(|| "Unknown".to_string()),
        version: non_empty(probe.version),
        accuracy: probe.accuracy.unwrap_or(0).min(100),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
