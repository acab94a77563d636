//! Topology type definitions.
//!
//! Port maps, port references and the link templates a fabric can be
//! generated from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::net::{MacAddress, NetDeviceId};

/// Port index to neighbor hardware address, ordered by index.
pub type PortMap = BTreeMap<u32, MacAddress>;

/// The combined, caller-owned sequence of port handles for one switch.
/// Position in this list is the device port number.
pub type PortList = Vec<NetDeviceId>;

/// Which map a neighbor was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PortKind {
    Switch,
    Host,
}

/// A key in either the switch-port map or the host-port map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub kind: PortKind,
    pub key: u32,
}

impl PortRef {
    pub fn switch(key: u32) -> Self {
        Self { kind: PortKind::Switch, key }
    }

    pub fn host(key: u32) -> Self {
        Self { kind: PortKind::Host, key }
    }
}

/// Templates for switch-to-switch links
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Each switch links to the next one and the last links back to the first
    Ring,
    /// Switches link in a chain, no wrap-around
    Line,
    /// The first switch is the hub and links to every other switch
    Star,
    /// Every switch links to every other switch
    Mesh,
}
