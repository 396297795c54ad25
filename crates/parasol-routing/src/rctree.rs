//! RC tree parasitic model
//!
//! One tree per routed net. Node 0 is usually the root (the driver), but
//! nothing here relies on it: the root is the single node without a parent.
//! Each non-root node carries the resistance of the wire to its parent;
//! capacitances are lumped at the nodes.

use crate::error::{Result, RoutingError};
use parasol_netlist::{DbuPoint, PinId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A node of an [`RcTree`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RcNode {
    pub position: DbuPoint,
    /// Pin owning this node, `None` for Steiner and wire-segment nodes
    pub pin: Option<PinId>,
    pub parent: Option<usize>,
    /// Pin leaf hanging off a shared routing junction
    pub endpoint: bool,
    /// Intermediate point inserted when a long wire is cut into pieces
    #[serde(default)]
    pub wire_split: bool,
    /// Resistance of the wire to the parent
    pub resistance: f64,
    /// Lumped capacitance at this node
    pub capacitance: f64,
}

impl RcNode {
    /// Internal (non pin) node
    pub fn steiner(position: DbuPoint) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Node owned by `pin`
    pub fn pin(position: DbuPoint, pin: PinId) -> Self {
        Self {
            position,
            pin: Some(pin),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_parasitics(mut self, resistance: f64, capacitance: f64) -> Self {
        self.resistance = resistance;
        self.capacitance = capacitance;
        self
    }

    pub fn as_endpoint(mut self) -> Self {
        self.endpoint = true;
        self
    }

    pub fn as_wire_split(mut self) -> Self {
        self.wire_split = true;
        self
    }
}

/// Tree-shaped parasitic network of one net
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RcTree {
    nodes: Vec<RcNode>,
}

impl RcTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<RcNode>) -> Self {
        Self { nodes }
    }

    pub fn add_node(&mut self, node: RcNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[RcNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&RcNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut RcNode> {
        self.nodes.get_mut(index)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node without a parent
    pub fn root(&self) -> Option<usize> {
        self.nodes.iter().position(|node| node.parent.is_none())
    }

    pub fn children(&self, index: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent == Some(index))
            .map(|(child, _)| child)
            .collect()
    }

    fn children_lists(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent < self.nodes.len() {
                    children[parent].push(index);
                }
            }
        }
        children
    }

    /// Nodes in breadth-first order from the root (parents before children).
    /// Nodes not reachable from the root are omitted.
    pub fn topological_order(&self) -> Vec<usize> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        let children = self.children_lists();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([root]);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            queue.extend(children[index].iter().copied());
        }
        order
    }

    /// Index of the node owned by `pin`
    pub fn pin_node_index(&self, pin: PinId) -> Option<usize> {
        self.nodes.iter().position(|node| node.pin == Some(pin))
    }

    pub fn num_pin_nodes(&self) -> usize {
        self.nodes.iter().filter(|node| node.pin.is_some()).count()
    }

    /// Node through which `pin` joins the routing: the pin's own node, or
    /// for an endpoint leaf the junction its branch starts from. Wire-split
    /// points along the branch are skipped.
    pub fn connecting_node_index(&self, pin: PinId) -> Option<usize> {
        let index = self.pin_node_index(pin)?;
        let node = &self.nodes[index];
        if !node.endpoint {
            return Some(index);
        }
        let Some(mut junction) = node.parent else {
            return Some(index);
        };
        // Bounded walk, a malformed tree may contain a cycle
        for _ in 0..self.nodes.len() {
            match self.nodes.get(junction) {
                Some(RcNode {
                    wire_split: true,
                    parent: Some(parent),
                    ..
                }) => junction = *parent,
                _ => break,
            }
        }
        Some(junction)
    }

    pub fn connecting_point(&self, pin: PinId) -> Option<DbuPoint> {
        self.connecting_node_index(pin)
            .and_then(|index| self.nodes.get(index))
            .map(|node| node.position)
    }

    pub fn total_capacitance(&self) -> f64 {
        self.nodes.iter().map(|node| node.capacitance).sum()
    }

    pub fn total_resistance(&self) -> f64 {
        self.nodes.iter().map(|node| node.resistance).sum()
    }

    /// Capacitance of each node's subtree, itself included
    pub fn downstream_capacitances(&self) -> Vec<f64> {
        let mut downstream: Vec<f64> = self.nodes.iter().map(|node| node.capacitance).collect();
        for &index in self.topological_order().iter().rev() {
            if let Some(parent) = self.nodes[index].parent {
                downstream[parent] += downstream[index];
            }
        }
        downstream
    }

    /// Elmore delay from the root to every node
    pub fn elmore_delays(&self) -> Vec<f64> {
        let downstream = self.downstream_capacitances();
        let mut delays = vec![0.0; self.nodes.len()];
        for index in self.topological_order() {
            let node = &self.nodes[index];
            if let Some(parent) = node.parent {
                delays[index] = delays[parent] + node.resistance * downstream[index];
            }
        }
        delays
    }

    /// Check the tree invariants: exactly one root, every node reaches the
    /// root, and `pins` each own exactly one node with no other pin nodes
    pub fn validate(&self, pins: &[PinId]) -> Result<()> {
        if self.nodes.is_empty() {
            return if pins.len() < 2 {
                Ok(())
            } else {
                Err(RoutingError::InvalidTree(format!(
                    "empty tree for {} pins",
                    pins.len()
                )))
            };
        }

        let roots = self.nodes.iter().filter(|n| n.parent.is_none()).count();
        if roots != 1 {
            return Err(RoutingError::InvalidTree(format!("{} roots", roots)));
        }
        if let Some(bad) = self
            .nodes
            .iter()
            .position(|n| n.parent.is_some_and(|p| p >= self.nodes.len()))
        {
            return Err(RoutingError::InvalidTree(format!(
                "node {} has an out of range parent",
                bad
            )));
        }
        let reached = self.topological_order().len();
        if reached != self.nodes.len() {
            return Err(RoutingError::InvalidTree(format!(
                "{} of {} nodes unreachable from the root",
                self.nodes.len() - reached,
                self.nodes.len()
            )));
        }

        for &pin in pins {
            let owners = self.nodes.iter().filter(|n| n.pin == Some(pin)).count();
            if owners != 1 {
                return Err(RoutingError::InvalidTree(format!(
                    "pin {} owns {} nodes",
                    pin, owners
                )));
            }
        }
        if self.num_pin_nodes() != pins.len() {
            return Err(RoutingError::InvalidTree(format!(
                "{} pin nodes for {} pins",
                self.num_pin_nodes(),
                pins.len()
            )));
        }
        Ok(())
    }
}
