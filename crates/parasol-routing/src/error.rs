//! Error types for routing estimation

use parasol_netlist::NetlistError;
use thiserror::Error;

/// Errors that can occur during routing estimation and extraction
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Net has pins but none of them drives it
    #[error("Net {net} has no driver")]
    NoDriver { net: String },

    /// A strategy required by the configuration is not installed
    #[error("Routing {0} model not configured")]
    MissingStrategy(&'static str),

    /// RC tree violates a structural invariant
    #[error("Invalid RC tree: {0}")]
    InvalidTree(String),

    /// Netlist lookup failed
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;
