//! Rectilinear minimum spanning tree estimation

use super::{placed_pins, RoutingEstimationModel};
use crate::error::Result;
use crate::topology::RoutingTopology;
use parasol_netlist::{Dbu, Design, NetId};
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graph::UnGraph;

/// Connects the pins of a net with a Manhattan-weighted minimum spanning
/// tree. No Steiner points are introduced; the driver is the root.
///
/// The spanning tree is taken over the complete pin graph, so cost grows
/// with the square of the pin count. High-fanout nets are better served by
/// [`TrunkSteinerModel`](super::TrunkSteinerModel).
#[derive(Debug, Clone, Copy, Default)]
pub struct MstEstimationModel;

impl RoutingEstimationModel for MstEstimationModel {
    fn name(&self) -> &'static str {
        "mst"
    }

    fn estimate(&self, design: &Design, net: NetId) -> Result<(RoutingTopology, Dbu)> {
        let placed = placed_pins(design, net)?;

        let mut topology = RoutingTopology::new();
        let mut graph = UnGraph::<usize, Dbu>::with_capacity(placed.pins.len(), 0);
        for &(pin, position) in &placed.pins {
            let node = topology.add_node(position, Some(pin));
            graph.add_node(node);
        }

        let indices: Vec<_> = graph.node_indices().collect();
        for (i, &a) in indices.iter().enumerate() {
            for &b in &indices[i + 1..] {
                let length = topology.nodes[graph[a]]
                    .position
                    .manhattan_distance(&topology.nodes[graph[b]].position);
                graph.add_edge(a, b, length);
            }
        }

        for element in min_spanning_tree(&graph) {
            if let Element::Edge { source, target, .. } = element {
                topology.add_segment(source, target);
            }
        }
        // placed_pins lists the driver first
        topology.root = 0;

        let wirelength = topology.wirelength();
        Ok((topology, wirelength))
    }
}
