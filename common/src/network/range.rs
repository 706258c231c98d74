//! # Network Range Model
//!
//! A [`NetworkRange`] is a validated, normalized IPv4 CIDR block naming
//! one scan target. Ranges are ephemeral: the planner recomputes the set
//! each run, so this type is deliberately small and `Copy`.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;

/// An IPv4 CIDR block, stored in normalized form (host bits cleared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkRange {
    network: Ipv4Addr,
    prefix: u8,
}

impl NetworkRange {
    /// The /24 block containing `ip`, as derived for local interfaces.
    pub fn containing_slash24(ip: Ipv4Addr) -> Self {
        let octets = ip.octets();
        Self {
            network: Ipv4Addr::new(octets[0], octets[1], octets[2], 0),
            prefix: 24,
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses covered, broadcast and network included.
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix as u32)
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for NetworkRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed: Ipv4Network = s
            .parse()
            .map_err(|e| format!("invalid CIDR range '{s}': {e}"))?;
        Ok(Self {
            network: parsed.network(),
            prefix: parsed.prefix(),
        })
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
