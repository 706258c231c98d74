//! # Discovery Planner
//!
//! Resolves the set of network ranges a run will target: the statically
//! configured list unioned with the /24 subnets of the local interfaces.
//! Interface trouble never fails the caller; the plan degrades to the
//! static list with a logged warning.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use vigil_common::config::ScanSettings;
use vigil_common::network::interface;
use vigil_common::network::range::NetworkRange;

pub struct DiscoveryPlanner<'a> {
    settings: &'a ScanSettings,
}

impl<'a> DiscoveryPlanner<'a> {
    pub fn new(settings: &'a ScanSettings) -> Self {
        Self { settings }
    }

    /// Produces the deduplicated target set for one run.
    pub fn plan(&self) -> BTreeSet<NetworkRange> {
        let mut ranges: BTreeSet<NetworkRange> = self
            .settings
            .network_ranges
            .iter()
            .filter_map(|raw| match raw.parse::<NetworkRange>() {
                Ok(range) => Some(range),
                Err(e) => {
                    warn!("ignoring configured range: {e}");
                    None
                }
            })
            .collect();

        if self.settings.auto_discover {
            match interface::local_subnets() {
                Ok(discovered) => {
                    for range in discovered {
                        if ranges.insert(range) {
                            debug!("discovered local range {range}");
                        }
                    }
                }
                Err(e) => {
                    warn!("interface enumeration failed, using configured ranges only: {e}");
                }
            }
        }

        ranges
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
