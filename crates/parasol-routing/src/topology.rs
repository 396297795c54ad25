//! Routing topology produced by an estimation model

use parasol_netlist::{Dbu, DbuPoint, PinId};
use serde::{Deserialize, Serialize};

/// A point of a routing topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub position: DbuPoint,
    /// `None` for Steiner points
    pub pin: Option<PinId>,
}

/// Point/segment set describing how the pins of one net are connected.
///
/// Segments are undirected pairs of node indices; the extractor orients them
/// away from `root`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingTopology {
    pub nodes: Vec<TopologyNode>,
    pub segments: Vec<(usize, usize)>,
    pub root: usize,
}

impl RoutingTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, position: DbuPoint, pin: Option<PinId>) -> usize {
        self.nodes.push(TopologyNode { position, pin });
        self.nodes.len() - 1
    }

    pub fn add_segment(&mut self, a: usize, b: usize) {
        self.segments.push((a, b));
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn num_steiner_points(&self) -> usize {
        self.nodes.iter().filter(|n| n.pin.is_none()).count()
    }

    /// Sum of Manhattan segment lengths
    pub fn wirelength(&self) -> Dbu {
        self.segments
            .iter()
            .map(|&(a, b)| {
                self.nodes[a]
                    .position
                    .manhattan_distance(&self.nodes[b].position)
            })
            .sum()
    }

    /// Neighbour lists indexed by node
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for &(a, b) in &self.segments {
            if a < self.nodes.len() && b < self.nodes.len() {
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wirelength_and_adjacency() {
        let mut topology = RoutingTopology::new();
        let a = topology.add_node(DbuPoint::new(0, 0), None);
        let b = topology.add_node(DbuPoint::new(3, 4), None);
        let c = topology.add_node(DbuPoint::new(3, 10), None);
        topology.add_segment(a, b);
        topology.add_segment(b, c);

        assert_eq!(topology.wirelength(), 13);
        assert_eq!(topology.adjacency()[b], vec![a, c]);
        assert_eq!(topology.num_steiner_points(), 3);
    }
}
