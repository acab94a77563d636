//! Two-phase fabric construction.
//!
//! A [`FabricPlan`] is pure data: switches, hosts and links can be declared
//! in any order. [`FabricPlan::activate`] then builds the fabric in three
//! strict phases:
//!
//! 1. create every node and link, attaching all neighbors of all switches
//! 2. create, bind and register every switch device
//! 3. announce every switch's neighbor maps to the controller, then compute
//!    paths switch by switch
//!
//! Every path computation therefore sees the complete fabric, whatever order
//! the plan was written in. `activate` consumes the plan, so it runs once.

use std::collections::{HashMap, HashSet};

use crate::controller::{Controller, PathPolicy};
use crate::installer::{InstallError, SwitchInstaller};
use crate::net::{DeviceConfig, Fabric, FabricError, MacAddress, NodeId, SwitchDeviceId};
use crate::topology::PortList;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Name '{0}' is declared twice")]
    DuplicateName(String),

    #[error("Unknown switch '{0}'")]
    UnknownSwitch(String),

    #[error("Switch '{0}' cannot link to itself")]
    SelfLink(String),

    #[error("Switch '{0}' has no links and no hosts")]
    IsolatedSwitch(String),

    #[error("Switch '{name}' needs {count} ports but is limited to {max}")]
    TooManyPorts { name: String, count: usize, max: usize },

    #[error(transparent)]
    Fabric(#[from] FabricError),

    #[error("Installing switch '{name}' failed: {source}")]
    Install {
        name: String,
        #[source]
        source: InstallError,
    },
}

#[derive(Debug, Clone)]
struct SwitchSpec {
    name: String,
    policy: PathPolicy,
    device_config: DeviceConfig,
}

#[derive(Debug, Clone)]
struct HostSpec {
    name: String,
    switch: String,
}

#[derive(Debug, Clone, Default)]
pub struct FabricPlan {
    switches: Vec<SwitchSpec>,
    hosts: Vec<HostSpec>,
    links: Vec<(String, String)>,
    names: HashSet<String>,
}

/// A switch built by [`FabricPlan::activate`].
#[derive(Debug)]
pub struct ActivatedSwitch {
    pub name: String,
    pub node: NodeId,
    pub device: SwitchDeviceId,
    pub address: MacAddress,
    pub installer: SwitchInstaller,
}

/// A host built by [`FabricPlan::activate`].
#[derive(Debug, Clone)]
pub struct ActivatedHost {
    pub name: String,
    pub node: NodeId,
    pub address: MacAddress,
    pub switch: String,
}

#[derive(Debug, Default)]
pub struct ActivatedFabric {
    pub switches: Vec<ActivatedSwitch>,
    pub hosts: Vec<ActivatedHost>,
}

impl ActivatedFabric {
    pub fn switch(&self, name: &str) -> Option<&ActivatedSwitch> {
        self.switches.iter().find(|s| s.name == name)
    }

    pub fn host(&self, name: &str) -> Option<&ActivatedHost> {
        self.hosts.iter().find(|h| h.name == name)
    }
}

impl FabricPlan {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str) -> Result<(), PlanError> {
        if !self.names.insert(name.to_string()) {
            return Err(PlanError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn switch_mut(&mut self, name: &str) -> Result<&mut SwitchSpec, PlanError> {
        self.switches
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| PlanError::UnknownSwitch(name.to_string()))
    }

    fn has_switch(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s.name == name)
    }

    pub fn add_switch(&mut self, name: &str) -> Result<(), PlanError> {
        self.claim_name(name)?;
        self.switches.push(SwitchSpec {
            name: name.to_string(),
            policy: PathPolicy::default(),
            device_config: DeviceConfig::default(),
        });
        Ok(())
    }

    pub fn set_policy(&mut self, switch: &str, policy: PathPolicy) -> Result<(), PlanError> {
        self.switch_mut(switch)?.policy = policy;
        Ok(())
    }

    pub fn toggle_traffic_mode(&mut self, switch: &str) -> Result<(), PlanError> {
        let spec = self.switch_mut(switch)?;
        spec.policy = spec.policy.toggled();
        Ok(())
    }

    pub fn set_device_config(&mut self, switch: &str, device_config: DeviceConfig) -> Result<(), PlanError> {
        self.switch_mut(switch)?.device_config = device_config;
        Ok(())
    }

    /// Declares a host hanging off `switch`. The switch may be declared
    /// later; names are checked at activation.
    pub fn add_host(&mut self, name: &str, switch: &str) -> Result<(), PlanError> {
        self.claim_name(name)?;
        self.hosts.push(HostSpec {
            name: name.to_string(),
            switch: switch.to_string(),
        });
        Ok(())
    }

    /// Declares a link between two switches. Both may be declared later.
    pub fn link_switches(&mut self, a: &str, b: &str) -> Result<(), PlanError> {
        if a == b {
            return Err(PlanError::SelfLink(a.to_string()));
        }
        self.links.push((a.to_string(), b.to_string()));
        Ok(())
    }

    pub fn switch_names(&self) -> impl Iterator<Item = &str> {
        self.switches.iter().map(|s| s.name.as_str())
    }

    /// Checks every cross-reference and every switch's port count against
    /// its device limit. Nothing is built if this fails.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut connected = HashSet::new();
        for (a, b) in &self.links {
            for name in [a, b] {
                if !self.has_switch(name) {
                    return Err(PlanError::UnknownSwitch(name.clone()));
                }
                connected.insert(name.as_str());
            }
        }
        for host in &self.hosts {
            if !self.has_switch(&host.switch) {
                return Err(PlanError::UnknownSwitch(host.switch.clone()));
            }
            connected.insert(host.switch.as_str());
        }
        if let Some(isolated) = self.switches.iter().find(|s| !connected.contains(s.name.as_str())) {
            return Err(PlanError::IsolatedSwitch(isolated.name.clone()));
        }

        for spec in &self.switches {
            let count = self.port_count(&spec.name);
            if count > spec.device_config.max_ports {
                return Err(PlanError::TooManyPorts {
                    name: spec.name.clone(),
                    count,
                    max: spec.device_config.max_ports,
                });
            }
        }
        Ok(())
    }

    /// Link endpoints plus hosts on `switch`: the ports its device will get.
    fn port_count(&self, switch: &str) -> usize {
        let links = self
            .links
            .iter()
            .map(|(a, b)| usize::from(a == switch) + usize::from(b == switch))
            .sum::<usize>();
        links + self.hosts.iter().filter(|h| h.switch == switch).count()
    }

    /// Builds the planned fabric into `fabric` and binds every switch to
    /// `controller`.
    ///
    /// Every check runs before the first node is created, so a failed
    /// activation leaves both `fabric` and `controller` untouched.
    pub fn activate(self, fabric: &mut Fabric, controller: &mut dyn Controller) -> Result<ActivatedFabric, PlanError> {
        self.validate()?;
        let mut names = self.switches.iter().map(|s| &s.name).chain(self.hosts.iter().map(|h| &h.name));
        if let Some(taken) = names.find(|name| fabric.find_node(name).is_ok()) {
            return Err(FabricError::DuplicateName(taken.clone()).into());
        }
        log::info!(
            "Activating fabric plan: {} switches, {} hosts, {} links",
            self.switches.len(),
            self.hosts.len(),
            self.links.len()
        );

        // Phase 1: nodes, links, neighbor maps
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(self.switches.len());
        let mut installers = Vec::with_capacity(self.switches.len());
        let mut port_lists = vec![PortList::new(); self.switches.len()];

        for (i, spec) in self.switches.iter().enumerate() {
            nodes.push(fabric.create_named_node(&spec.name)?);
            let mut installer = SwitchInstaller::with_device_config(spec.device_config.clone());
            installer.set_path_policy(spec.policy);
            installers.push(installer);
            index.insert(spec.name.clone(), i);
        }

        for (a, b) in &self.links {
            let (ia, ib) = (index[a], index[b]);
            let (port_a, port_b) = fabric.connect(nodes[ia], nodes[ib])?;
            let list = std::mem::take(&mut port_lists[ia]);
            port_lists[ia] = installers[ia].attach_switch_link(fabric, list, port_a)?;
            let list = std::mem::take(&mut port_lists[ib]);
            port_lists[ib] = installers[ib].attach_switch_link(fabric, list, port_b)?;
        }

        let mut hosts = Vec::with_capacity(self.hosts.len());
        for spec in &self.hosts {
            let host_node = fabric.create_named_node(&spec.name)?;
            let i = index[&spec.switch];
            let (host_port, switch_port) = fabric.connect(host_node, nodes[i])?;
            let list = std::mem::take(&mut port_lists[i]);
            port_lists[i] = installers[i].attach_host_link(fabric, list, switch_port)?;
            hosts.push(ActivatedHost {
                name: spec.name.clone(),
                node: host_node,
                address: fabric.address_of(host_port)?,
                switch: spec.switch.clone(),
            });
        }

        // Phase 2: devices and registrations
        let mut installed = Vec::with_capacity(self.switches.len());
        for (i, spec) in self.switches.iter().enumerate() {
            let (device, address) = installers[i]
                .install_deferred(fabric, nodes[i], &port_lists[i], controller)
                .map_err(|source| PlanError::Install {
                    name: spec.name.clone(),
                    source,
                })?;
            installed.push((device, address));
        }

        // Phase 3: full topology first, then paths
        for (installer, (_, address)) in installers.iter().zip(&installed) {
            installer.announce_topology(*address, controller);
        }
        for (installer, (_, address)) in installers.iter().zip(&installed) {
            installer.trigger_path_computation(*address, controller);
        }

        let switches = self
            .switches
            .into_iter()
            .zip(nodes)
            .zip(installers.into_iter().zip(installed))
            .map(|((spec, node), (installer, (device, address)))| ActivatedSwitch {
                name: spec.name,
                node,
                device,
                address,
                installer,
            })
            .collect();

        Ok(ActivatedFabric { switches, hosts })
    }
}
