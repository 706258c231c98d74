//! # Port Risk Classification
//!
//! A pure mapping from `(port, state)` to a [`RiskTier`]. No I/O, no
//! configuration, no surprises: the tier of an observation depends only
//! on its inputs, so the function can be exercised standalone and its
//! output is reproducible across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::PortState;

/// Services that expose unauthenticated or historically weak management
/// surfaces: ftp, telnet, msrpc, netbios, smb, mssql, rdp, postgres.
pub const HIGH_RISK_PORTS: &[u16] = &[21, 23, 135, 139, 445, 1433, 3389, 5432];

/// Remote-admin, mail and directory services worth a closer look:
/// ssh, smtp, dns, pop3, imap, imaps, pop3s.
pub const MEDIUM_RISK_PORTS: &[u16] = &[22, 25, 53, 110, 143, 993, 995];

/// Severity assigned to a single port observation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    High,
    Medium,
    Low,
    #[default]
    Info,
}

impl RiskTier {
    /// Weight used when summing a host's risk score.
    pub fn score_weight(self) -> u32 {
        match self {
            RiskTier::High => 3,
            RiskTier::Medium => 2,
            RiskTier::Low => 1,
            RiskTier::Info => 0,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::High => write!(f, "HIGH"),
            RiskTier::Medium => write!(f, "MEDIUM"),
            RiskTier::Low => write!(f, "LOW"),
            RiskTier::Info => write!(f, "INFO"),
        }
    }
}

/// Classifies one port observation.
///
/// Ports in the fixed high- and medium-risk sets carry their tier
/// regardless of reported state; anything else is `Low` when open and
/// `Info` otherwise. Total and deterministic for every input pair.
pub fn classify(port: u16, state: PortState) -> RiskTier {
    if HIGH_RISK_PORTS.contains(&port) {
        RiskTier::High
    } else if MEDIUM_RISK_PORTS.contains(&port) {
        RiskTier::Medium
    } else if state.is_open() {
        RiskTier::Low
    } else {
        RiskTier::Info
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
