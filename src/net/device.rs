//! OpenFlow switch devices.
//!
//! A switch device owns an ordered list of ports (plain net devices on the
//! same node) and at most one controller binding. The forwarding engine
//! itself lives outside this crate; the device here is the record the
//! installer wires up.

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;
use super::types::{NetDeviceId, NodeId, SwitchDeviceId};
use crate::controller::ControllerId;

/// Largest port count a datapath accepts.
pub const DP_MAX_PORTS: usize = 255;

/// Device-factory defaults applied to every switch device an installer
/// creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Bytes of a table-miss packet forwarded to the controller.
    #[serde(default = "default_miss_send_len")]
    pub miss_send_len: u16,
    /// Upper bound on the number of switch ports.
    #[serde(default = "default_max_ports")]
    pub max_ports: usize,
}

fn default_miss_send_len() -> u16 {
    128
}

fn default_max_ports() -> usize {
    DP_MAX_PORTS
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            miss_send_len: default_miss_send_len(),
            max_ports: default_max_ports(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenFlowSwitchDevice {
    id: SwitchDeviceId,
    node: NodeId,
    address: MacAddress,
    config: DeviceConfig,
    ports: Vec<NetDeviceId>,
    controller: Option<ControllerId>,
}

impl OpenFlowSwitchDevice {
    pub(crate) fn new(id: SwitchDeviceId, node: NodeId, address: MacAddress, config: DeviceConfig) -> Self {
        Self {
            id,
            node,
            address,
            config,
            ports: Vec::new(),
            controller: None,
        }
    }

    pub fn id(&self) -> SwitchDeviceId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Datapath address of the switch.
    pub fn address(&self) -> MacAddress {
        self.address
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Ports in attachment order; the index is the port number.
    pub fn ports(&self) -> &[NetDeviceId] {
        &self.ports
    }

    pub fn controller(&self) -> Option<ControllerId> {
        self.controller
    }

    /// Binds the device to `controller`, replacing any previous binding.
    pub(crate) fn set_controller(&mut self, controller: ControllerId) {
        self.controller = Some(controller);
    }

    /// Appends a port and returns its port number.
    pub(crate) fn add_switch_port(&mut self, port: NetDeviceId) -> u32 {
        self.ports.push(port);
        (self.ports.len() - 1) as u32
    }

    /// Port number of `port`, if it is attached.
    pub fn port_number(&self, port: NetDeviceId) -> Option<u32> {
        self.ports.iter().position(|p| *p == port).map(|i| i as u32)
    }
}
