//! Single-trunk rectilinear Steiner tree estimation

use super::{placed_pins, RoutingEstimationModel};
use crate::error::Result;
use crate::topology::RoutingTopology;
use parasol_netlist::{Dbu, DbuPoint, Design, NetId};
use std::collections::BTreeMap;

/// Horizontal trunk at the median pin y spanning the pin x range, with a
/// vertical branch from each pin down (or up) to the trunk.
///
/// A trunk point is placed at every distinct pin x. When a pin already lies
/// on the trunk it serves as the trunk point itself, otherwise a Steiner
/// point is introduced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrunkSteinerModel;

impl RoutingEstimationModel for TrunkSteinerModel {
    fn name(&self) -> &'static str {
        "trunk"
    }

    fn estimate(&self, design: &Design, net: NetId) -> Result<(RoutingTopology, Dbu)> {
        let placed = placed_pins(design, net)?;

        let mut ys: Vec<Dbu> = placed.pins.iter().map(|(_, p)| p.y).collect();
        ys.sort_unstable();
        let trunk_y = ys[(ys.len() - 1) / 2];

        let mut topology = RoutingTopology::new();
        for &(pin, position) in &placed.pins {
            topology.add_node(position, Some(pin));
        }
        topology.root = 0;

        // x -> trunk node index
        let mut trunk: BTreeMap<Dbu, usize> = BTreeMap::new();
        for (index, node) in topology.nodes.iter().enumerate() {
            if node.position.y == trunk_y {
                trunk.entry(node.position.x).or_insert(index);
            }
        }
        let branch_xs: Vec<Dbu> = placed.pins.iter().map(|(_, p)| p.x).collect();
        for x in branch_xs {
            if !trunk.contains_key(&x) {
                let steiner = topology.add_node(DbuPoint::new(x, trunk_y), None);
                trunk.insert(x, steiner);
            }
        }

        let trunk_nodes: Vec<usize> = trunk.values().copied().collect();
        for pair in trunk_nodes.windows(2) {
            topology.add_segment(pair[0], pair[1]);
        }
        for index in 0..placed.pins.len() {
            let x = topology.nodes[index].position.x;
            if let Some(&junction) = trunk.get(&x) {
                if junction != index {
                    topology.add_segment(junction, index);
                }
            }
        }

        let wirelength = topology.wirelength();
        Ok((topology, wirelength))
    }
}
