//! Simulated network substrate.
//!
//! Nodes, point-to-point links, hardware addresses and the switch devices
//! the installer creates. Packet delivery is out of scope; this module only
//! keeps the records the control plane binds together.

pub mod device;
pub mod fabric;
pub mod mac;
pub mod types;

pub use device::{DeviceConfig, OpenFlowSwitchDevice, DP_MAX_PORTS};
pub use fabric::{Fabric, FabricError, NetDevice, Node};
pub use mac::{MacAddress, MacAllocator, MacParseError};
pub use types::{DeviceRef, NetDeviceId, NodeId, SwitchDeviceId};
