//! Routing estimation strategies
//!
//! An estimation model turns the placed pins of one net into a
//! [`RoutingTopology`] and its wirelength. The engine does not care how the
//! topology is built; any implementation of [`RoutingEstimationModel`] can be
//! installed.

mod mst;
mod trunk;

pub use mst::MstEstimationModel;
pub use trunk::TrunkSteinerModel;

use crate::error::{Result, RoutingError};
use crate::topology::RoutingTopology;
use parasol_netlist::{Dbu, DbuPoint, Design, NetId, PinId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Strategy computing a routing topology for one net
pub trait RoutingEstimationModel: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Topology and wirelength of `net` for the current placement
    fn estimate(&self, design: &Design, net: NetId) -> Result<(RoutingTopology, Dbu)>;
}

/// Built-in estimation strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationModelKind {
    /// Rectilinear minimum spanning tree
    Mst,
    /// Single-trunk rectilinear Steiner tree
    #[default]
    Trunk,
    /// No estimation model installed
    None,
}

impl EstimationModelKind {
    pub fn build(self) -> Option<Arc<dyn RoutingEstimationModel>> {
        match self {
            EstimationModelKind::Mst => Some(Arc::new(MstEstimationModel)),
            EstimationModelKind::Trunk => Some(Arc::new(TrunkSteinerModel)),
            EstimationModelKind::None => None,
        }
    }
}

/// Pins of a net with their positions, driver first
pub(crate) struct PlacedPins {
    pub pins: Vec<(PinId, DbuPoint)>,
}

pub(crate) fn placed_pins(design: &Design, net: NetId) -> Result<PlacedPins> {
    let net_data = design.net(net)?;
    let driver = design.driver(net).ok_or_else(|| RoutingError::NoDriver {
        net: net_data.name.clone(),
    })?;

    let mut pins = Vec::with_capacity(net_data.num_pins());
    pins.push((driver, design.pin_position(driver)?));
    for &pin in net_data.pins() {
        if pin != driver {
            pins.push((pin, design.pin_position(pin)?));
        }
    }
    Ok(PlacedPins { pins })
}

#[cfg(test)]
pub(crate) mod test_support {
    use parasol_netlist::{DbuPoint, Design, Library, NetId, PinDirection, PinId};

    /// Design with one net driven by an input port at `driver` and loaded by
    /// output ports at each of `sinks`
    pub fn port_net(driver: DbuPoint, sinks: &[DbuPoint]) -> (Design, NetId, Vec<PinId>) {
        let mut design = Design::new("test", Library::new("empty"));
        let net = design.create_net("n").unwrap();
        let source = design
            .create_port("src", PinDirection::Input, driver)
            .unwrap();
        design.connect(source, net).unwrap();
        let mut pins = vec![source];
        for (i, &position) in sinks.iter().enumerate() {
            let port = design
                .create_port(&format!("out{}", i), PinDirection::Output, position)
                .unwrap();
            design.connect(port, net).unwrap();
            pins.push(port);
        }
        (design, net, pins)
    }
}
