//! Parasol routing estimation
//!
//! This crate keeps a per-net parasitic model consistent with an evolving
//! netlist and placement:
//! - Routing topologies (Steiner-like point/segment sets)
//! - Pluggable estimation strategies (MST, single-trunk Steiner)
//! - Pluggable extraction into RC trees
//! - The incremental [`RoutingEstimator`] engine with dirty-net tracking and
//!   a parallel full-update path

pub mod error;
pub mod estimation;
pub mod estimator;
pub mod extraction;
pub mod rctree;
pub mod topology;

pub use error::{Result, RoutingError};
pub use estimation::{
    EstimationModelKind, MstEstimationModel, RoutingEstimationModel, TrunkSteinerModel,
};
pub use estimator::{
    EstimatorConfig, RoutingEstimator, RoutingEstimatorBuilder, RoutingRecord, UpdateStats,
};
pub use extraction::{DefaultExtractionModel, ExtractionConfig, RoutingExtractionModel};
pub use rctree::{RcNode, RcTree};
pub use topology::{RoutingTopology, TopologyNode};
