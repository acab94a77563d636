//! Fabric arena.
//!
//! The fabric owns every node, link endpoint and switch device of one
//! simulated network. Handles ([`NodeId`], [`NetDeviceId`],
//! [`SwitchDeviceId`]) index into it, and every handle lookup goes through
//! a fallible accessor so that a stale or foreign handle surfaces as a
//! [`FabricError`] instead of a panic.

use std::collections::HashMap;

use super::device::{DeviceConfig, OpenFlowSwitchDevice};
use super::mac::{MacAddress, MacAllocator};
use super::types::{DeviceRef, NetDeviceId, NodeId, SwitchDeviceId};

/// Errors raised when a handle or name does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FabricError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown net device: {0}")]
    UnknownDevice(NetDeviceId),

    #[error("Unknown switch device: {0}")]
    UnknownSwitch(SwitchDeviceId),

    #[error("No node named '{0}'")]
    UnknownName(String),

    #[error("Node name '{0}' is already taken")]
    DuplicateName(String),

    #[error("Node {0} has no devices, so it has no hardware identity")]
    NoIdentity(NodeId),

    #[error("Cannot link {0} to itself")]
    SelfLink(NodeId),
}

#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: Option<String>,
    devices: Vec<DeviceRef>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Devices in the order they were added to the node.
    pub fn devices(&self) -> &[DeviceRef] {
        &self.devices
    }
}

/// A link endpoint.
#[derive(Debug, Clone)]
pub struct NetDevice {
    id: NetDeviceId,
    node: NodeId,
    address: MacAddress,
    peer: NetDeviceId,
    switch: Option<SwitchDeviceId>,
}

impl NetDevice {
    pub fn id(&self) -> NetDeviceId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn address(&self) -> MacAddress {
        self.address
    }

    /// The device at the other end of the link.
    pub fn peer(&self) -> NetDeviceId {
        self.peer
    }

    /// The switch this device is a port of, if any.
    pub fn switch(&self) -> Option<SwitchDeviceId> {
        self.switch
    }
}

#[derive(Debug, Default)]
pub struct Fabric {
    nodes: Vec<Node>,
    net_devices: Vec<NetDevice>,
    switches: Vec<OpenFlowSwitchDevice>,
    names: HashMap<String, NodeId>,
    macs: MacAllocator,
}

impl Fabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            name: None,
            devices: Vec::new(),
        });
        id
    }

    /// Creates a node that can later be found by `name`.
    pub fn create_named_node(&mut self, name: &str) -> Result<NodeId, FabricError> {
        if self.names.contains_key(name) {
            return Err(FabricError::DuplicateName(name.to_string()));
        }
        let id = self.create_node();
        self.nodes[id.0 as usize].name = Some(name.to_string());
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn find_node(&self, name: &str) -> Result<NodeId, FabricError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| FabricError::UnknownName(name.to_string()))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, FabricError> {
        self.nodes.get(id.0 as usize).ok_or(FabricError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Links two nodes with a point-to-point channel and returns the new
    /// endpoints as `(on_a, on_b)`. Each endpoint gets a fresh address.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<(NetDeviceId, NetDeviceId), FabricError> {
        self.node(a)?;
        self.node(b)?;
        if a == b {
            return Err(FabricError::SelfLink(a));
        }

        let dev_a = NetDeviceId(self.net_devices.len() as u32);
        let dev_b = NetDeviceId(dev_a.0 + 1);
        for (id, node, peer) in [(dev_a, a, dev_b), (dev_b, b, dev_a)] {
            let address = self.macs.allocate();
            self.net_devices.push(NetDevice {
                id,
                node,
                address,
                peer,
                switch: None,
            });
            self.nodes[node.0 as usize].devices.push(DeviceRef::Net(id));
        }
        log::debug!("Linked {} ({}) <-> {} ({})", a, dev_a, b, dev_b);
        Ok((dev_a, dev_b))
    }

    pub fn net_device(&self, id: NetDeviceId) -> Result<&NetDevice, FabricError> {
        self.net_devices.get(id.0 as usize).ok_or(FabricError::UnknownDevice(id))
    }

    /// Hardware address of a link endpoint.
    pub fn address_of(&self, id: NetDeviceId) -> Result<MacAddress, FabricError> {
        self.net_device(id).map(NetDevice::address)
    }

    /// Hardware address of the first device the node ever saw. This is the
    /// address other switches use to name the node as a neighbor.
    pub fn first_address(&self, node: NodeId) -> Result<MacAddress, FabricError> {
        match self.node(node)?.devices.first() {
            Some(DeviceRef::Net(dev)) => self.address_of(*dev),
            Some(DeviceRef::Switch(sw)) => self.switch_device(*sw).map(OpenFlowSwitchDevice::address),
            None => Err(FabricError::NoIdentity(node)),
        }
    }

    pub fn switch_device(&self, id: SwitchDeviceId) -> Result<&OpenFlowSwitchDevice, FabricError> {
        self.switches.get(id.0 as usize).ok_or(FabricError::UnknownSwitch(id))
    }

    pub fn switch_devices(&self) -> impl Iterator<Item = &OpenFlowSwitchDevice> {
        self.switches.iter()
    }

    /// The switch device installed on `node`, if any.
    pub fn switch_on_node(&self, node: NodeId) -> Option<SwitchDeviceId> {
        self.nodes.get(node.0 as usize)?.devices.iter().find_map(|d| match d {
            DeviceRef::Switch(sw) => Some(*sw),
            DeviceRef::Net(_) => None,
        })
    }

    pub(crate) fn create_switch_device(
        &mut self,
        node: NodeId,
        address: MacAddress,
        config: DeviceConfig,
    ) -> Result<SwitchDeviceId, FabricError> {
        self.node(node)?;
        let id = SwitchDeviceId(self.switches.len() as u32);
        self.switches.push(OpenFlowSwitchDevice::new(id, node, address, config));
        self.nodes[node.0 as usize].devices.push(DeviceRef::Switch(id));
        Ok(id)
    }

    pub(crate) fn switch_device_mut(&mut self, id: SwitchDeviceId) -> Result<&mut OpenFlowSwitchDevice, FabricError> {
        self.switches.get_mut(id.0 as usize).ok_or(FabricError::UnknownSwitch(id))
    }

    /// Marks `port` as owned by `switch` and appends it to the switch's port
    /// list. Returns the port number.
    pub(crate) fn bind_port(&mut self, switch: SwitchDeviceId, port: NetDeviceId) -> Result<u32, FabricError> {
        self.net_device(port)?;
        let number = self.switch_device_mut(switch)?.add_switch_port(port);
        self.net_devices[port.0 as usize].switch = Some(switch);
        Ok(number)
    }
}
