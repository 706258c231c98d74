//! # Local Interface Enumeration
//!
//! Finds the IPv4 subnets this machine sits on, one containing /24 per
//! viable interface address. Used by the discovery planner to extend the
//! statically configured target list.

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;

use crate::network::range::NetworkRange;

/// Derives a /24 range for every address on every viable interface.
///
/// Loopback and down interfaces are filtered out, as are interfaces
/// without addresses. Duplicates (two interfaces on the same subnet)
/// are left to the caller's set semantics.
pub fn local_subnets() -> anyhow::Result<Vec<NetworkRange>> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    Ok(interfaces
        .iter()
        .filter(|iface| is_viable(iface))
        .flat_map(subnets_of)
        .collect())
}

fn is_viable(interface: &NetworkInterface) -> bool {
    interface.is_up() && !interface.is_loopback() && !interface.ips.is_empty()
}

fn subnets_of(interface: &NetworkInterface) -> Vec<NetworkRange> {
    interface
        .ips
        .iter()
        .filter_map(|net| match net {
            IpNetwork::V4(v4) if !v4.ip().is_loopback() => {
                Some(NetworkRange::containing_slash24(v4.ip()))
            }
            _ => None,
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
