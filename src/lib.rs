//! Parasol: incremental routing and timing estimation
//!
//! Facade over the workspace crates:
//! - [`netlist`]: design, library and change notification
//! - [`routing`]: per-net Steiner estimation, RC extraction and the
//!   incremental [`RoutingEstimator`](routing::RoutingEstimator)
//! - [`timing`]: logical-effort library characterization
//!
//! [`config`] loads a `parasol.toml` document and [`Session`] wires it to
//! both engines.

pub mod config;
pub mod error;
pub mod session;

pub use config::{from_path, from_str, ParasolConfig, RoutingConfig};
pub use error::{ParasolError, Result};
pub use session::Session;

pub use parasol_netlist as netlist;
pub use parasol_routing as routing;
pub use parasol_timing as timing;
