//! Switch link generation.
//!
//! Turns a [`Topology`] template into the list of switch-to-switch links to
//! create, as pairs of switch indices in creation order.

use crate::topology::types::Topology;

/// Generate switch links for a template
///
/// # Arguments
/// * `topology` - The link template (Ring, Line, Star, Mesh)
/// * `switch_count` - Number of switches in the fabric
///
/// # Returns
/// Pairs `(a, b)` of switch indices, each pair one link, in the order the
/// links should be created. Never contains a self-link or a duplicate.
pub fn generate_switch_links(topology: &Topology, switch_count: usize) -> Vec<(usize, usize)> {
    if switch_count < 2 {
        return vec![];
    }

    match topology {
        Topology::Ring => {
            // Ring: i -> i+1, and the last one wraps around to the first
            let mut links: Vec<(usize, usize)> = (0..switch_count - 1).map(|i| (i, i + 1)).collect();
            // With two switches the wrap-around link would duplicate 0 -> 1
            if switch_count > 2 {
                links.push((switch_count - 1, 0));
            }
            links
        }
        Topology::Line => (0..switch_count - 1).map(|i| (i, i + 1)).collect(),
        Topology::Star => (1..switch_count).map(|i| (0, i)).collect(),
        Topology::Mesh => {
            let mut links = Vec::new();
            for i in 0..switch_count {
                for j in (i + 1)..switch_count {
                    links.push((i, j));
                }
            }
            links
        }
    }
}
