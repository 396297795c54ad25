//! Top-level error type

use parasol_netlist::NetlistError;
use parasol_routing::RoutingError;
use parasol_timing::CharacterizationError;
use thiserror::Error;

/// Errors surfaced by configuration loading and sessions
#[derive(Debug, Error)]
pub enum ParasolError {
    /// I/O error reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration document
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered back to TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Netlist(#[from] NetlistError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Characterization(#[from] CharacterizationError),
}

/// Result type for top-level operations
pub type Result<T> = std::result::Result<T, ParasolError>;
