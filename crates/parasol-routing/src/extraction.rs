//! Parasitic extraction from routing topologies

use crate::rctree::{RcNode, RcTree};
use crate::topology::RoutingTopology;
use parasol_netlist::{Dbu, DbuPoint};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Strategy converting a routing topology into an RC tree
pub trait RoutingExtractionModel: Send + Sync {
    fn extract(&self, topology: &RoutingTopology) -> RcTree;

    /// Wire resistance per DBU
    fn resistance_per_unit(&self) -> f64;

    /// Wire capacitance per DBU
    fn capacitance_per_unit(&self) -> f64;
}

/// Wire parasitics used by [`DefaultExtractionModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub resistance_per_unit: f64,
    pub capacitance_per_unit: f64,
    /// Segments longer than this are split into equal pieces; 0 disables
    /// splitting
    pub max_segment_length: Dbu,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            resistance_per_unit: 0.002535,
            capacitance_per_unit: 0.00016,
            max_segment_length: 100_000,
        }
    }
}

/// π-model extractor.
///
/// Walks the topology breadth-first from its root. Every segment follows an
/// L-shaped route (horizontal leg first); long segments are cut into pieces
/// of at most `max_segment_length`. Each piece gets `R = r * len` on its far
/// node and `C = c * len` split evenly between its two ends. Pin nodes other
/// than the root that end up as leaves are flagged as endpoints.
#[derive(Debug, Clone, Default)]
pub struct DefaultExtractionModel {
    config: ExtractionConfig,
}

impl DefaultExtractionModel {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn num_pieces(&self, length: Dbu) -> Dbu {
        let max = self.config.max_segment_length;
        if max <= 0 || length <= max {
            1
        } else {
            (length + max - 1) / max
        }
    }
}

/// Point at `distance` along the L route from `from` to `to`
fn point_along(from: DbuPoint, to: DbuPoint, distance: Dbu) -> DbuPoint {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if distance <= dx.abs() {
        DbuPoint::new(from.x + dx.signum() * distance, from.y)
    } else {
        DbuPoint::new(to.x, from.y + dy.signum() * (distance - dx.abs()))
    }
}

impl RoutingExtractionModel for DefaultExtractionModel {
    fn extract(&self, topology: &RoutingTopology) -> RcTree {
        let mut tree = RcTree::new();
        if topology.nodes.is_empty() || topology.root >= topology.nodes.len() {
            return tree;
        }

        let r = self.config.resistance_per_unit;
        let c = self.config.capacitance_per_unit;
        let adjacency = topology.adjacency();
        let mut mapped: Vec<Option<usize>> = vec![None; topology.nodes.len()];

        let root = &topology.nodes[topology.root];
        mapped[topology.root] = Some(tree.add_node(RcNode {
            position: root.position,
            pin: root.pin,
            ..Default::default()
        }));

        let mut queue = VecDeque::from([topology.root]);
        while let Some(current) = queue.pop_front() {
            let Some(current_rc) = mapped[current] else {
                continue;
            };
            for &next in &adjacency[current] {
                if mapped[next].is_some() {
                    continue;
                }
                let from = topology.nodes[current].position;
                let target = topology.nodes[next];
                let length = from.manhattan_distance(&target.position);
                let pieces = self.num_pieces(length);

                let mut parent = current_rc;
                let mut travelled = 0;
                for k in 1..=pieces {
                    let reached = length * k / pieces;
                    let piece = (reached - travelled) as f64;
                    travelled = reached;

                    let (position, pin) = if k == pieces {
                        (target.position, target.pin)
                    } else {
                        (point_along(from, target.position, reached), None)
                    };
                    if let Some(node) = tree.node_mut(parent) {
                        node.capacitance += c * piece / 2.0;
                    }
                    parent = tree.add_node(RcNode {
                        position,
                        pin,
                        parent: Some(parent),
                        endpoint: false,
                        wire_split: k < pieces,
                        resistance: r * piece,
                        capacitance: c * piece / 2.0,
                    });
                }
                mapped[next] = Some(parent);
                queue.push_back(next);
            }
        }

        let leaves: Vec<usize> = {
            let mut has_child = vec![false; tree.num_nodes()];
            for node in tree.nodes() {
                if let Some(parent) = node.parent {
                    has_child[parent] = true;
                }
            }
            (0..tree.num_nodes())
                .filter(|&i| !has_child[i])
                .collect()
        };
        for index in leaves {
            if let Some(node) = tree.node_mut(index) {
                if node.pin.is_some() && node.parent.is_some() {
                    node.endpoint = true;
                }
            }
        }

        tree
    }

    fn resistance_per_unit(&self) -> f64 {
        self.config.resistance_per_unit
    }

    fn capacitance_per_unit(&self) -> f64 {
        self.config.capacitance_per_unit
    }
}
