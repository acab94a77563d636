//! Fabric report.
//!
//! A serializable snapshot of an activated fabric: every switch with its
//! device ports and the neighbor behind each, every host, the controller's
//! registry bindings and the forwarding tables it computed. Written as
//! pretty JSON for inspection and for downstream tooling.

use color_eyre::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::controller::{Controller, ControllerId, ForwardingTable, PathPolicy};
use crate::net::{MacAddress, NetDeviceId, NodeId, SwitchDeviceId};
use crate::orchestrator::BuiltFabric;
use crate::topology::PortKind;

#[derive(Serialize, Debug)]
pub struct FabricReport {
    pub controller: ControllerReport,
    pub switches: Vec<SwitchReport>,
    pub hosts: Vec<HostReport>,
}

#[derive(Serialize, Debug)]
pub struct ControllerReport {
    pub id: ControllerId,
    pub path_requests: usize,
    /// Address -> switch device
    pub registry: BTreeMap<MacAddress, SwitchDeviceId>,
}

#[derive(Serialize, Debug)]
pub struct SwitchReport {
    pub name: String,
    pub address: MacAddress,
    pub node: NodeId,
    pub device: SwitchDeviceId,
    pub path_policy: PathPolicy,
    pub ports: Vec<PortReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarding: Option<ForwardingTable>,
}

/// One device port and what the topology map says is behind it.
#[derive(Serialize, Debug)]
pub struct PortReport {
    pub number: u32,
    pub device: NetDeviceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PortKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbor: Option<MacAddress>,
}

#[derive(Serialize, Debug)]
pub struct HostReport {
    pub name: String,
    pub address: MacAddress,
    pub switch: String,
}

impl FabricReport {
    pub fn collect(built: &BuiltFabric) -> Result<Self> {
        let controller: &dyn Controller = built.controller.as_ref();

        let mut switches = Vec::with_capacity(built.layout.switches.len());
        for switch in &built.layout.switches {
            let device = built.fabric.switch_device(switch.device)?;
            let topology = switch.installer.topology();

            let ports = device
                .ports()
                .iter()
                .enumerate()
                .map(|(number, port)| {
                    let port_ref = topology.port_ref(number as u32);
                    PortReport {
                        number: number as u32,
                        device: *port,
                        kind: port_ref.map(|r| r.kind),
                        key: port_ref.map(|r| r.key),
                        neighbor: port_ref.and_then(|r| topology.neighbor(r)),
                    }
                })
                .collect();

            switches.push(SwitchReport {
                name: switch.name.clone(),
                address: switch.address,
                node: switch.node,
                device: switch.device,
                path_policy: switch.installer.path_policy(),
                ports,
                forwarding: controller.forwarding_table(switch.address).cloned(),
            });
        }

        let hosts = built
            .layout
            .hosts
            .iter()
            .map(|h| HostReport {
                name: h.name.clone(),
                address: h.address,
                switch: h.switch.clone(),
            })
            .collect();

        Ok(FabricReport {
            controller: ControllerReport {
                id: controller.id(),
                path_requests: controller.path_requests().len(),
                registry: controller.registry().devices(),
            },
            switches,
            hosts,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write the report as pretty JSON
pub fn write_report(report: &FabricReport, path: &Path) -> Result<()> {
    std::fs::write(path, report.to_json()?)?;
    log::info!("Fabric report written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::{parse_config, DEFAULT_RING_CONFIG};
    use crate::orchestrator::build_fabric;
    use tempfile::NamedTempFile;

    #[test]
    fn test_report_lists_ports_with_neighbors() {
        let built = build_fabric(&parse_config(DEFAULT_RING_CONFIG).unwrap()).unwrap();
        let report = FabricReport::collect(&built).unwrap();

        assert_eq!(report.switches.len(), 3);
        assert_eq!(report.controller.registry.len(), 3);

        let s0 = &report.switches[0];
        assert_eq!(s0.ports.len(), 3);
        assert_eq!(s0.ports[2].kind, Some(PortKind::Host));
        assert_eq!(s0.ports[2].neighbor, Some(report.hosts[0].address));
        assert!(s0.forwarding.as_ref().unwrap().contains_key(&report.hosts[1].address));
    }

    #[test]
    fn test_write_report_json() {
        let built = build_fabric(&parse_config(DEFAULT_RING_CONFIG).unwrap()).unwrap();
        let report = FabricReport::collect(&built).unwrap();

        let file = NamedTempFile::new().unwrap();
        write_report(&report, file.path()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["switches"][0]["name"], "s0");
        assert_eq!(value["hosts"][1]["switch"], "s2");
    }
}
