//! Drop controller: keeps the session registry up to date but never
//! installs forwarding state, so every switch bound to it drops traffic.

use super::registry::SessionRegistry;
use super::{Controller, ControllerId, PathPolicy, PathRequest};
use crate::net::{MacAddress, SwitchDeviceId};
use crate::topology::PortMap;

#[derive(Debug)]
pub struct DropController {
    id: ControllerId,
    registry: SessionRegistry,
    requests: Vec<PathRequest>,
}

impl DropController {
    pub fn new() -> Self {
        Self {
            id: ControllerId::next(),
            registry: SessionRegistry::new(),
            requests: Vec::new(),
        }
    }
}

impl Default for DropController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for DropController {
    fn id(&self) -> ControllerId {
        self.id
    }

    fn compute_path(&mut self, self_address: MacAddress, switch_ports: &PortMap, host_ports: &PortMap, policy: PathPolicy) {
        log::debug!("{} ignoring path request from {}", self.id, self_address);
        self.requests.push(PathRequest {
            self_address,
            switch_ports: switch_ports.clone(),
            host_ports: host_ports.clone(),
            policy,
        });
        self.registry.learn_topology(self_address, switch_ports, host_ports);
    }

    fn register_device(&mut self, device: SwitchDeviceId, address: MacAddress) {
        self.registry.register_device(device, address);
    }

    fn announce_topology(&mut self, self_address: MacAddress, switch_ports: &PortMap, host_ports: &PortMap) {
        self.registry.learn_topology(self_address, switch_ports, host_ports);
    }

    fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn path_requests(&self) -> &[PathRequest] {
        &self.requests
    }
}
