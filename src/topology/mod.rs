//! Network topology module.
//!
//! This module contains the per-switch topology map, link templates and the
//! two-phase fabric plan.

pub mod connections;
pub mod map;
pub mod plan;
pub mod types;

// Re-export key types and functions for easier access
pub use connections::generate_switch_links;
pub use map::TopologyMap;
pub use plan::{ActivatedFabric, ActivatedHost, ActivatedSwitch, FabricPlan, PlanError};
pub use types::{PortKind, PortList, PortMap, PortRef, Topology};
