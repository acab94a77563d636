//! Switch installer.
//!
//! One installer per switch. It accumulates the switch's topology map and
//! traffic mode, then materializes an OpenFlow switch device on a node and
//! binds it into a controller session.
//!
//! A controlled install runs these steps, in this order:
//!
//! 1. ask the controller to compute paths for the node's identity address,
//!    with the topology map and path policy as they stand right now
//! 2. create the switch device from the installer's [`DeviceConfig`]
//! 3. bind the controller to the device
//! 4. attach the combined ports in order (position = port number)
//! 5. register the device address with the controller
//!
//! All preconditions are checked before step 1, so a failed install leaves
//! both the fabric and the controller untouched. Nothing checks that the
//! topology is complete: installing a switch before its neighbors are all
//! attached hands the controller a partial view. [`FabricPlan`] avoids that
//! by construction.
//!
//! [`FabricPlan`]: crate::topology::FabricPlan

use std::collections::HashSet;

use crate::controller::{Controller, ControllerId, PathPolicy};
use crate::net::{DeviceConfig, Fabric, FabricError, MacAddress, NetDeviceId, NodeId, SwitchDeviceId};
use crate::topology::{PortList, TopologyMap};

/// Precondition failures of an install. None of them leave partial state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    #[error(transparent)]
    Fabric(#[from] FabricError),

    #[error("Port {port} belongs to {actual}, not to {expected}")]
    PortNotOnNode {
        port: NetDeviceId,
        expected: NodeId,
        actual: NodeId,
    },

    #[error("Port {port} is already attached to {switch}")]
    PortInUse { port: NetDeviceId, switch: SwitchDeviceId },

    #[error("Port {0} is listed more than once")]
    DuplicatePort(NetDeviceId),

    #[error("{count} ports exceed the limit of {max}")]
    TooManyPorts { count: usize, max: usize },

    #[error("Node {node} already carries switch device {switch}")]
    NodeHasSwitch { node: NodeId, switch: SwitchDeviceId },

    #[error("This installer already installed {0}")]
    AlreadyInstalled(SwitchDeviceId),
}

#[derive(Debug, Default)]
pub struct SwitchInstaller {
    topology: TopologyMap,
    policy: PathPolicy,
    device_config: DeviceConfig,
    installed: Option<SwitchDeviceId>,
}

impl SwitchInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_config(device_config: DeviceConfig) -> Self {
        Self {
            device_config,
            ..Self::default()
        }
    }

    pub fn set_device_config(&mut self, device_config: DeviceConfig) {
        self.device_config = device_config;
    }

    pub fn device_config(&self) -> &DeviceConfig {
        &self.device_config
    }

    pub fn topology(&self) -> &TopologyMap {
        &self.topology
    }

    pub fn path_policy(&self) -> PathPolicy {
        self.policy
    }

    pub fn set_path_policy(&mut self, policy: PathPolicy) {
        self.policy = policy;
    }

    /// Flips between low-latency and high-throughput path selection.
    pub fn toggle_traffic_mode(&mut self) {
        self.policy = self.policy.toggled();
    }

    /// The switch device this installer created, if any.
    pub fn installed(&self) -> Option<SwitchDeviceId> {
        self.installed
    }

    /// Records `neighbor` as the switch behind `port`. See
    /// [`TopologyMap::attach_switch_neighbor`].
    pub fn attach_switch_neighbor(&mut self, ports: PortList, port: NetDeviceId, neighbor: MacAddress) -> PortList {
        self.topology.attach_switch_neighbor(ports, port, neighbor)
    }

    /// Records `neighbor` as the host behind `port`.
    pub fn attach_host_neighbor(&mut self, ports: PortList, port: NetDeviceId, neighbor: MacAddress) -> PortList {
        self.topology.attach_host_neighbor(ports, port, neighbor)
    }

    /// Like [`attach_switch_neighbor`](Self::attach_switch_neighbor), naming
    /// the neighbor by the identity address of the node at the far end of
    /// `port`'s link.
    pub fn attach_switch_link(&mut self, fabric: &Fabric, ports: PortList, port: NetDeviceId) -> Result<PortList, FabricError> {
        let neighbor = far_end_identity(fabric, port)?;
        Ok(self.attach_switch_neighbor(ports, port, neighbor))
    }

    /// Host counterpart of [`attach_switch_link`](Self::attach_switch_link).
    pub fn attach_host_link(&mut self, fabric: &Fabric, ports: PortList, port: NetDeviceId) -> Result<PortList, FabricError> {
        let neighbor = far_end_identity(fabric, port)?;
        Ok(self.attach_host_neighbor(ports, port, neighbor))
    }

    /// Installs a switch device on `node` with `ports` and binds it to
    /// `controller`.
    pub fn install(
        &mut self,
        fabric: &mut Fabric,
        node: NodeId,
        ports: &[NetDeviceId],
        controller: &mut dyn Controller,
    ) -> Result<SwitchDeviceId, InstallError> {
        let identity = self.check_preconditions(fabric, node, ports)?;

        self.trigger_path_computation(identity, controller);
        let device = self.materialize(fabric, node, identity, ports, Some(controller.id()))?;
        controller.register_device(device, identity);

        Ok(device)
    }

    /// Installs a switch device with no controller binding, for switches
    /// configured later or tested in isolation.
    pub fn install_uncontrolled(
        &mut self,
        fabric: &mut Fabric,
        node: NodeId,
        ports: &[NetDeviceId],
    ) -> Result<SwitchDeviceId, InstallError> {
        let identity = self.check_preconditions(fabric, node, ports)?;
        self.materialize(fabric, node, identity, ports, None)
    }

    /// [`install`](Self::install) on the node registered under `name`.
    pub fn install_named(
        &mut self,
        fabric: &mut Fabric,
        name: &str,
        ports: &[NetDeviceId],
        controller: &mut dyn Controller,
    ) -> Result<SwitchDeviceId, InstallError> {
        let node = fabric.find_node(name)?;
        self.install(fabric, node, ports, controller)
    }

    /// [`install_uncontrolled`](Self::install_uncontrolled) on the node
    /// registered under `name`.
    pub fn install_named_uncontrolled(
        &mut self,
        fabric: &mut Fabric,
        name: &str,
        ports: &[NetDeviceId],
    ) -> Result<SwitchDeviceId, InstallError> {
        let node = fabric.find_node(name)?;
        self.install_uncontrolled(fabric, node, ports)
    }

    /// Creates, binds and registers the device without asking for paths.
    /// Two-phase activation calls the path computation later.
    pub(crate) fn install_deferred(
        &mut self,
        fabric: &mut Fabric,
        node: NodeId,
        ports: &[NetDeviceId],
        controller: &mut dyn Controller,
    ) -> Result<(SwitchDeviceId, MacAddress), InstallError> {
        let identity = self.check_preconditions(fabric, node, ports)?;
        let device = self.materialize(fabric, node, identity, ports, Some(controller.id()))?;
        controller.register_device(device, identity);
        Ok((device, identity))
    }

    pub(crate) fn announce_topology(&self, identity: MacAddress, controller: &mut dyn Controller) {
        controller.announce_topology(identity, self.topology.switch_ports(), self.topology.host_ports());
    }

    /// Hands the controller a copy of the maps as they stand now.
    pub(crate) fn trigger_path_computation(&self, identity: MacAddress, controller: &mut dyn Controller) {
        let (switch_ports, host_ports) = self.topology.snapshot();
        controller.compute_path(identity, &switch_ports, &host_ports, self.policy);
    }

    /// Validates everything an install needs and returns the node's identity
    /// address.
    fn check_preconditions(&self, fabric: &Fabric, node: NodeId, ports: &[NetDeviceId]) -> Result<MacAddress, InstallError> {
        if let Some(device) = self.installed {
            return Err(InstallError::AlreadyInstalled(device));
        }

        let identity = fabric.first_address(node)?;
        if let Some(switch) = fabric.switch_on_node(node) {
            return Err(InstallError::NodeHasSwitch { node, switch });
        }

        if ports.len() > self.device_config.max_ports {
            return Err(InstallError::TooManyPorts {
                count: ports.len(),
                max: self.device_config.max_ports,
            });
        }

        let mut seen = HashSet::new();
        for port in ports {
            let dev = fabric.net_device(*port)?;
            if dev.node() != node {
                return Err(InstallError::PortNotOnNode {
                    port: *port,
                    expected: node,
                    actual: dev.node(),
                });
            }
            if let Some(switch) = dev.switch() {
                return Err(InstallError::PortInUse { port: *port, switch });
            }
            if !seen.insert(*port) {
                return Err(InstallError::DuplicatePort(*port));
            }
        }

        if ports.len() != self.topology.len() {
            log::warn!(
                "Node {} gets {} ports but its topology map records {} neighbors; port numbers may not match",
                node,
                ports.len(),
                self.topology.len()
            );
        }

        Ok(identity)
    }

    fn materialize(
        &mut self,
        fabric: &mut Fabric,
        node: NodeId,
        identity: MacAddress,
        ports: &[NetDeviceId],
        controller: Option<ControllerId>,
    ) -> Result<SwitchDeviceId, InstallError> {
        log::info!("Install switch device on node {}", node);
        let device = fabric.create_switch_device(node, identity, self.device_config.clone())?;

        if let Some(controller) = controller {
            log::info!("Set up {} for {}", controller, device);
            fabric.switch_device_mut(device)?.set_controller(controller);
        }

        for port in ports {
            let number = fabric.bind_port(device, *port)?;
            log::debug!("Add switch port {} as port {} of {}", port, number, device);
        }

        self.installed = Some(device);
        self.topology.seal();
        Ok(device)
    }
}

/// Identity address of the node at the other end of `port`'s link.
fn far_end_identity(fabric: &Fabric, port: NetDeviceId) -> Result<MacAddress, FabricError> {
    let peer = fabric.net_device(port)?.peer();
    let peer_node = fabric.net_device(peer)?.node();
    fabric.first_address(peer_node)
}
