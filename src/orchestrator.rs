//! Fabric orchestrator.
//!
//! This module turns a validated [`FabricConfig`] into a running fabric:
//! it translates the configuration into a two-phase [`FabricPlan`], creates
//! the controller session the configuration asks for, and activates the plan
//! against a fresh [`Fabric`].

use color_eyre::eyre::WrapErr;
use log::info;

use crate::config::FabricConfig;
use crate::controller::{self, Controller};
use crate::net::Fabric;
use crate::topology::{ActivatedFabric, FabricPlan, PlanError};

/// Everything one activated fabric owns. The controller session lives
/// exactly as long as the fabric it serves.
pub struct BuiltFabric {
    pub fabric: Fabric,
    pub controller: Box<dyn Controller>,
    pub layout: ActivatedFabric,
}

/// Translate a configuration into a fabric plan
pub fn build_plan(config: &FabricConfig) -> Result<FabricPlan, PlanError> {
    let mut plan = FabricPlan::new();

    for switch in &config.fabric.switches {
        plan.add_switch(&switch.name)?;
        plan.set_policy(&switch.name, switch.path_policy)?;
        plan.set_device_config(&switch.name, config.fabric.device.clone())?;
    }

    for (a, b) in config.switch_links() {
        plan.link_switches(&a, &b)?;
    }

    for host in &config.fabric.hosts {
        plan.add_host(&host.name, &host.switch)?;
    }

    Ok(plan)
}

/// Build and activate the fabric a configuration describes
pub fn build_fabric(config: &FabricConfig) -> color_eyre::Result<BuiltFabric> {
    let plan = build_plan(config).wrap_err("Failed to translate configuration into a fabric plan")?;

    let mut fabric = Fabric::new();
    let mut controller = controller::from_config(&config.controller);
    info!("Created {} ({:?})", controller.id(), config.controller.kind);

    let layout = plan
        .activate(&mut fabric, controller.as_mut())
        .wrap_err("Failed to activate fabric plan")?;

    info!(
        "Fabric ready: {} switches, {} hosts, {} registered devices",
        layout.switches.len(),
        layout.hosts.len(),
        controller.registry().devices().len()
    );

    Ok(BuiltFabric {
        fabric,
        controller,
        layout,
    })
}
