//! Learning controller.
//!
//! Accumulates the topology every installed switch reports and, on each
//! `compute_path`, builds a forwarding table for the calling switch: one
//! entry per known host, naming the outgoing port as a key into the
//! switch's own port maps. Hosts behind switches that have not reported yet
//! are simply missing; the table reflects what the controller knew at call
//! time.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use super::paths::{hop_distances, next_hop_candidates, switch_adjacency};
use super::registry::SessionRegistry;
use super::{Controller, ControllerId, PathPolicy, PathRequest};
use crate::net::{MacAddress, SwitchDeviceId};
use crate::topology::{PortMap, PortRef};

/// Where one switch sends traffic for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEntry {
    pub out_port: PortRef,
    /// Switch hops between this switch and the host's switch.
    pub hops: usize,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<Duration>,
}

/// Host address -> flow entry.
pub type ForwardingTable = BTreeMap<MacAddress, FlowEntry>;

#[derive(Debug)]
pub struct LearningController {
    id: ControllerId,
    expiration_timeout: Duration,
    registry: SessionRegistry,
    requests: Vec<PathRequest>,
    tables: HashMap<MacAddress, ForwardingTable>,
}

impl LearningController {
    /// A zero `expiration_timeout` means flow entries never expire.
    pub fn new(expiration_timeout: Duration) -> Self {
        Self {
            id: ControllerId::next(),
            expiration_timeout,
            registry: SessionRegistry::new(),
            requests: Vec::new(),
            tables: HashMap::new(),
        }
    }

    pub fn expiration_timeout(&self) -> Duration {
        self.expiration_timeout
    }

    fn idle_timeout(&self) -> Option<Duration> {
        if self.expiration_timeout.is_zero() {
            None
        } else {
            Some(self.expiration_timeout)
        }
    }

    fn build_table(&self, self_address: MacAddress, switch_ports: &PortMap, policy: PathPolicy) -> ForwardingTable {
        let adjacency = switch_adjacency(&self.registry);
        let mut load: HashMap<u32, usize> = HashMap::new();
        let mut table = ForwardingTable::new();

        for (host, owners) in self.registry.host_attachments() {
            // Directly attached: deliver on the lowest host port facing it
            if let Some((_, key)) = owners.iter().filter(|(sw, _)| *sw == self_address).min_by_key(|(_, k)| *k) {
                table.insert(
                    host,
                    FlowEntry {
                        out_port: PortRef::host(*key),
                        hops: 0,
                        idle_timeout: self.idle_timeout(),
                    },
                );
                continue;
            }

            let distances = hop_distances(&adjacency, owners.iter().map(|(sw, _)| *sw));
            let candidates = next_hop_candidates(self_address, switch_ports, &distances);

            let chosen = match policy {
                PathPolicy::LowLatency => candidates.first().copied(),
                PathPolicy::HighThroughput => candidates
                    .iter()
                    .copied()
                    .min_by_key(|key| (load.get(key).copied().unwrap_or(0), *key)),
            };

            let Some(key) = chosen else {
                log::debug!("Host {} unreachable from switch {}", host, self_address);
                continue;
            };
            *load.entry(key).or_default() += 1;

            table.insert(
                host,
                FlowEntry {
                    out_port: PortRef::switch(key),
                    hops: distances[&self_address],
                    idle_timeout: self.idle_timeout(),
                },
            );
        }

        table
    }
}

impl Default for LearningController {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Controller for LearningController {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn compute_path(&mut self, self_address: MacAddress, switch_ports: &PortMap, host_ports: &PortMap, policy: PathPolicy) {
        self.requests.push(PathRequest {
            self_address,
            switch_ports: switch_ports.clone(),
            host_ports: host_ports.clone(),
            policy,
        });
        self.registry.learn_topology(self_address, switch_ports, host_ports);

        let table = self.build_table(self_address, switch_ports, policy);
        log::info!(
            "Computed {} forwarding entries for switch {} ({:?}, {} switch neighbors, {} hosts)",
            table.len(),
            self_address,
            policy,
            switch_ports.len(),
            host_ports.len()
        );
        self.tables.insert(self_address, table);
    }

    fn register_device(&mut self, device: SwitchDeviceId, address: MacAddress) {
        log::info!("{} registered {} at {}", self.id, device, address);
        self.registry.register_device(device, address);
    }

    fn announce_topology(&mut self, self_address: MacAddress, switch_ports: &PortMap, host_ports: &PortMap) {
        self.registry.learn_topology(self_address, switch_ports, host_ports);
    }

    fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn forwarding_table(&self, address: MacAddress) -> Option<&ForwardingTable> {
        self.tables.get(&address)
    }

    fn path_requests(&self) -> &[PathRequest] {
        &self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(i: u64) -> MacAddress {
        MacAddress::from_index(i)
    }

    fn ports(neighbors: &[u64]) -> PortMap {
        neighbors.iter().enumerate().map(|(k, n)| (k as u32, mac(*n))).collect()
    }

    /// Switches 1..=4 in a square; hosts 100 and 101 both sit on switch 3.
    fn announce_square(controller: &mut LearningController) {
        controller.announce_topology(mac(2), &ports(&[1, 3]), &PortMap::new());
        controller.announce_topology(mac(3), &ports(&[2, 4]), &ports(&[100, 101]));
        controller.announce_topology(mac(4), &ports(&[3, 1]), &PortMap::new());
    }

    #[test]
    fn test_direct_host_uses_host_port() {
        let mut controller = LearningController::default();
        controller.compute_path(mac(1), &ports(&[2]), &ports(&[50]), PathPolicy::LowLatency);

        let table = controller.forwarding_table(mac(1)).unwrap();
        assert_eq!(table[&mac(50)].out_port, PortRef::host(0));
        assert_eq!(table[&mac(50)].hops, 0);
        assert_eq!(table[&mac(50)].idle_timeout, None);
    }

    #[test]
    fn test_low_latency_picks_lowest_key() {
        let mut controller = LearningController::default();
        announce_square(&mut controller);
        controller.compute_path(mac(1), &ports(&[2, 4]), &PortMap::new(), PathPolicy::LowLatency);

        let table = controller.forwarding_table(mac(1)).unwrap();
        assert_eq!(table[&mac(100)].out_port, PortRef::switch(0));
        assert_eq!(table[&mac(101)].out_port, PortRef::switch(0));
        assert_eq!(table[&mac(100)].hops, 2);
    }

    #[test]
    fn test_high_throughput_spreads_across_equal_cost_ports() {
        let mut controller = LearningController::default();
        announce_square(&mut controller);
        controller.compute_path(mac(1), &ports(&[2, 4]), &PortMap::new(), PathPolicy::HighThroughput);

        let table = controller.forwarding_table(mac(1)).unwrap();
        assert_eq!(table[&mac(100)].out_port, PortRef::switch(0));
        assert_eq!(table[&mac(101)].out_port, PortRef::switch(1));
    }

    #[test]
    fn test_unreported_hosts_are_missing() {
        let mut controller = LearningController::default();
        controller.compute_path(mac(1), &ports(&[2]), &PortMap::new(), PathPolicy::LowLatency);
        assert!(controller.forwarding_table(mac(1)).unwrap().is_empty());

        // Switch 2 reports its host afterwards; switch 1's table stays stale
        controller.compute_path(mac(2), &ports(&[1]), &ports(&[60]), PathPolicy::LowLatency);
        assert!(controller.forwarding_table(mac(1)).unwrap().is_empty());
        assert_eq!(
            controller.forwarding_table(mac(2)).unwrap()[&mac(60)].out_port,
            PortRef::host(0)
        );
    }

    #[test]
    fn test_expiration_timeout_applies_to_entries() {
        let mut controller = LearningController::new(Duration::from_secs(30));
        controller.compute_path(mac(1), &PortMap::new(), &ports(&[50]), PathPolicy::LowLatency);
        let entry = &controller.forwarding_table(mac(1)).unwrap()[&mac(50)];
        assert_eq!(entry.idle_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_requests_are_recorded_in_order() {
        let mut controller = LearningController::default();
        controller.compute_path(mac(1), &ports(&[2]), &PortMap::new(), PathPolicy::LowLatency);
        controller.compute_path(mac(2), &ports(&[1]), &PortMap::new(), PathPolicy::HighThroughput);

        let requests = controller.path_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].self_address, mac(1));
        assert_eq!(requests[1].policy, PathPolicy::HighThroughput);
    }
}
