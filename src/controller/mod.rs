//! Controller sessions.
//!
//! A controller is shared by every switch of a fabric. Installers talk to it
//! through the [`Controller`] trait: they trigger path computation for a
//! switch with the topology recorded so far, and register each new switch
//! device so later installs can resolve it as a neighbor.
//!
//! The controller value itself is the session: it is created once per
//! fabric, passed by `&mut` into every install, and dropped with the fabric.
//! Its registry state is exactly what earlier calls left behind, so callers
//! must keep install order meaningful.
//!
//! Two implementations ship with the crate:
//!
//! - [`LearningController`]: computes a forwarding table per switch from
//!   the accumulated topology, honoring the switch's [`PathPolicy`]
//! - [`DropController`]: records registrations but installs no forwarding
//!   state

pub mod drop;
pub mod learning;
pub mod paths;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::{ControllerConfig, ControllerKind};
use crate::net::{MacAddress, SwitchDeviceId};
use crate::topology::PortMap;

pub use drop::DropController;
pub use learning::{FlowEntry, ForwardingTable, LearningController};
pub use registry::{SessionRegistry, SwitchTopology};

static NEXT_CONTROLLER_ID: AtomicU32 = AtomicU32::new(0);

/// Identity of a controller session, as stored in a switch device's
/// controller binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

impl ControllerId {
    /// A process-unique id.
    pub fn next() -> Self {
        ControllerId(NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller{}", self.0)
    }
}

/// Path-selection policy hint for one switch (the traffic mode flag).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathPolicy {
    /// Fewest hops, deterministic choice among equals
    #[default]
    LowLatency,
    /// Fewest hops, spreading destinations across equal-cost next hops
    HighThroughput,
}

impl PathPolicy {
    /// The other policy.
    pub fn toggled(self) -> Self {
        match self {
            PathPolicy::LowLatency => PathPolicy::HighThroughput,
            PathPolicy::HighThroughput => PathPolicy::LowLatency,
        }
    }

    pub fn is_high_throughput(self) -> bool {
        self == PathPolicy::HighThroughput
    }
}

/// Owned copy of the arguments of one `compute_path` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRequest {
    pub self_address: MacAddress,
    pub switch_ports: PortMap,
    pub host_ports: PortMap,
    pub policy: PathPolicy,
}

/// The contract the switch installer consumes.
pub trait Controller {
    fn id(&self) -> ControllerId;

    /// Precomputes forwarding state for the switch identified by
    /// `self_address`, using its neighbor maps as they stand at call time.
    fn compute_path(&mut self, self_address: MacAddress, switch_ports: &PortMap, host_ports: &PortMap, policy: PathPolicy);

    /// Binds `address` to `device` so later path computations can resolve
    /// the switch as a neighbor.
    fn register_device(&mut self, device: SwitchDeviceId, address: MacAddress);

    /// Makes a switch's neighbor maps known without computing paths. Used by
    /// two-phase activation so every computation sees the whole fabric.
    fn announce_topology(&mut self, _self_address: MacAddress, _switch_ports: &PortMap, _host_ports: &PortMap) {}

    fn registry(&self) -> &SessionRegistry;

    fn resolve(&self, address: MacAddress) -> Option<SwitchDeviceId> {
        self.registry().resolve(address)
    }

    /// Forwarding state computed for a switch, if this controller keeps any.
    fn forwarding_table(&self, _address: MacAddress) -> Option<&ForwardingTable> {
        None
    }

    /// Every `compute_path` call seen so far, oldest first.
    fn path_requests(&self) -> &[PathRequest];
}

/// Builds the controller a configuration asks for.
pub fn from_config(config: &ControllerConfig) -> Box<dyn Controller> {
    match config.kind {
        ControllerKind::Learning => Box::new(LearningController::new(config.expiration_timeout)),
        ControllerKind::Drop => Box::new(DropController::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_a_pure_flip() {
        let policy = PathPolicy::default();
        assert_eq!(policy, PathPolicy::LowLatency);
        assert_eq!(policy.toggled(), PathPolicy::HighThroughput);
        assert_eq!(policy.toggled().toggled(), policy);
    }

    #[test]
    fn test_controller_ids_are_unique() {
        let a = ControllerId::next();
        let b = ControllerId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_config() {
        let mut config = ControllerConfig::default();
        assert!(from_config(&config).path_requests().is_empty());
        config.kind = ControllerKind::Drop;
        let controller = from_config(&config);
        assert!(controller.registry().is_empty());
    }
}
