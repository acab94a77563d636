//! Per-switch topology map.
//!
//! Records, for one switch, which port connects to which neighboring switch
//! or host. Keys in each map are assigned independently: the key of a new
//! entry is the size of its map at the moment of the call. The two maps are
//! overlaid onto a single device port list, so the map also logs the order
//! of every attach call; [`TopologyMap::device_port`] uses that log to turn
//! a map key back into the port number the device assigns.

use super::types::{PortKind, PortList, PortMap, PortRef};
use crate::net::{MacAddress, NetDeviceId};

#[derive(Debug, Clone, Default)]
pub struct TopologyMap {
    switch_ports: PortMap,
    host_ports: PortMap,
    attachments: Vec<PortRef>,
    sealed: bool,
}

impl TopologyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `neighbor` as the switch reached through `port` and appends
    /// `port` to the combined list.
    pub fn attach_switch_neighbor(&mut self, ports: PortList, port: NetDeviceId, neighbor: MacAddress) -> PortList {
        self.attach(PortKind::Switch, ports, port, neighbor)
    }

    /// Records `neighbor` as the host reached through `port` and appends
    /// `port` to the combined list.
    pub fn attach_host_neighbor(&mut self, ports: PortList, port: NetDeviceId, neighbor: MacAddress) -> PortList {
        self.attach(PortKind::Host, ports, port, neighbor)
    }

    fn attach(&mut self, kind: PortKind, mut ports: PortList, port: NetDeviceId, neighbor: MacAddress) -> PortList {
        // The installed device never sees a late port, so neither does the map
        if self.sealed {
            log::warn!(
                "Ignoring {:?} neighbor {} on port {}: the switch is already installed",
                kind,
                neighbor,
                port
            );
            return ports;
        }

        let map = match kind {
            PortKind::Switch => &mut self.switch_ports,
            PortKind::Host => &mut self.host_ports,
        };
        let key = map.len() as u32;
        map.insert(key, neighbor);
        self.attachments.push(PortRef { kind, key });
        log::debug!("Recorded {:?} neighbor {} at key {} via {}", kind, neighbor, key, port);

        ports.push(port);
        ports
    }

    pub fn switch_ports(&self) -> &PortMap {
        &self.switch_ports
    }

    pub fn host_ports(&self) -> &PortMap {
        &self.host_ports
    }

    /// Owned copies of both maps as they stand now.
    pub fn snapshot(&self) -> (PortMap, PortMap) {
        (self.switch_ports.clone(), self.host_ports.clone())
    }

    /// Every attach call in call order.
    pub fn attachments(&self) -> &[PortRef] {
        &self.attachments
    }

    /// Total number of recorded attachments across both maps.
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Device port number of a map entry: its position in the combined
    /// attach order.
    pub fn device_port(&self, port: PortRef) -> Option<u32> {
        self.attachments.iter().position(|a| *a == port).map(|i| i as u32)
    }

    /// Inverse of [`device_port`](Self::device_port).
    pub fn port_ref(&self, device_port: u32) -> Option<PortRef> {
        self.attachments.get(device_port as usize).copied()
    }

    /// Neighbor address behind a map entry.
    pub fn neighbor(&self, port: PortRef) -> Option<MacAddress> {
        match port.kind {
            PortKind::Switch => self.switch_ports.get(&port.key).copied(),
            PortKind::Host => self.host_ports.get(&port.key).copied(),
        }
    }

    /// Marks the map as consumed by an install. Later attachments are
    /// refused with a warning and leave both the map and the port list as
    /// they were.
    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
