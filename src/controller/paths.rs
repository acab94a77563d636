//! Hop-count path search over the switch graph.
//!
//! The graph is the undirected union of every switch-port map a controller
//! has seen. All links cost one hop, so a breadth-first search from the
//! destination side gives every switch its distance, and a switch's usable
//! next hops are the neighbors exactly one hop closer.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::registry::SessionRegistry;
use crate::net::MacAddress;
use crate::topology::PortMap;

/// Switch address -> neighboring switch addresses.
pub type Adjacency = BTreeMap<MacAddress, BTreeSet<MacAddress>>;

/// Builds the undirected switch graph from every reported switch-port map.
/// Switches that were only ever named as neighbors still appear as vertices.
pub fn switch_adjacency(registry: &SessionRegistry) -> Adjacency {
    let mut adjacency = Adjacency::new();
    for (switch, topo) in registry.topology() {
        adjacency.entry(*switch).or_default();
        for neighbor in topo.switch_ports.values() {
            if neighbor == switch {
                continue;
            }
            adjacency.entry(*switch).or_default().insert(*neighbor);
            adjacency.entry(*neighbor).or_default().insert(*switch);
        }
    }
    adjacency
}

/// Multi-source BFS: hop distance from the nearest of `sources` to every
/// reachable switch.
pub fn hop_distances<I>(adjacency: &Adjacency, sources: I) -> HashMap<MacAddress, usize>
where
    I: IntoIterator<Item = MacAddress>,
{
    let mut distances = HashMap::new();
    let mut queue = VecDeque::new();

    for source in sources {
        if distances.insert(source, 0).is_none() {
            queue.push_back(source);
        }
    }

    while let Some(current) = queue.pop_front() {
        let next = distances[&current] + 1;
        if let Some(neighbors) = adjacency.get(&current) {
            for neighbor in neighbors {
                if !distances.contains_key(neighbor) {
                    distances.insert(*neighbor, next);
                    queue.push_back(*neighbor);
                }
            }
        }
    }

    distances
}

/// Switch-port keys of `self_address` whose neighbor lies on some shortest
/// path toward the BFS sources, in key order. Empty when the switch is
/// unreachable or is itself a source.
pub fn next_hop_candidates(
    self_address: MacAddress,
    switch_ports: &PortMap,
    distances: &HashMap<MacAddress, usize>,
) -> Vec<u32> {
    let own = match distances.get(&self_address) {
        Some(0) | None => return vec![],
        Some(d) => *d,
    };

    switch_ports
        .iter()
        .filter(|(_, neighbor)| distances.get(*neighbor) == Some(&(own - 1)))
        .map(|(key, _)| *key)
        .collect()
}
