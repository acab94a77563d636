//! Controller session registry.
//!
//! This file keeps the state a controller accumulates across installs:
//! which switch device answers to which hardware address, and the neighbor
//! maps each switch has reported so far.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::net::{MacAddress, SwitchDeviceId};
use crate::topology::PortMap;

/// Neighbor maps reported by one switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SwitchTopology {
    pub switch_ports: PortMap,
    pub host_ports: PortMap,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Address -> switch device
    devices: HashMap<MacAddress, SwitchDeviceId>,
    /// Switch address -> its reported neighbor maps
    topology: BTreeMap<MacAddress, SwitchTopology>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `address` to `device`. Returns the device previously bound to
    /// the address, if any; the new binding wins.
    pub fn register_device(&mut self, device: SwitchDeviceId, address: MacAddress) -> Option<SwitchDeviceId> {
        let previous = self.devices.insert(address, device);
        if let Some(old) = previous.filter(|old| *old != device) {
            log::warn!("Address {} rebound from {} to {}", address, old, device);
        }
        previous
    }

    pub fn resolve(&self, address: MacAddress) -> Option<SwitchDeviceId> {
        self.devices.get(&address).copied()
    }

    pub fn is_registered(&self, address: MacAddress) -> bool {
        self.devices.contains_key(&address)
    }

    /// Registered bindings ordered by address.
    pub fn devices(&self) -> BTreeMap<MacAddress, SwitchDeviceId> {
        self.devices.iter().map(|(a, d)| (*a, *d)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.topology.is_empty()
    }

    /// Records the neighbor maps of `switch`, replacing an earlier report.
    pub fn learn_topology(&mut self, switch: MacAddress, switch_ports: &PortMap, host_ports: &PortMap) {
        self.topology.insert(
            switch,
            SwitchTopology {
                switch_ports: switch_ports.clone(),
                host_ports: host_ports.clone(),
            },
        );
    }

    pub fn topology_of(&self, switch: MacAddress) -> Option<&SwitchTopology> {
        self.topology.get(&switch)
    }

    /// Every switch that has reported topology, ordered by address.
    pub fn topology(&self) -> &BTreeMap<MacAddress, SwitchTopology> {
        &self.topology
    }

    /// Host address -> `(switch, host-port key)` for every host some switch
    /// reported. A host reported by several switches lists all of them.
    pub fn host_attachments(&self) -> BTreeMap<MacAddress, Vec<(MacAddress, u32)>> {
        let mut hosts: BTreeMap<MacAddress, Vec<(MacAddress, u32)>> = BTreeMap::new();
        for (switch, topo) in &self.topology {
            for (key, host) in &topo.host_ports {
                hosts.entry(*host).or_default().push((*switch, *key));
            }
        }
        hosts
    }
}
