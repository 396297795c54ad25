//! Error types for netlist operations

use thiserror::Error;

/// Errors raised by structural edits and lookups on a design or library
#[derive(Debug, Error)]
pub enum NetlistError {
    /// Handle refers to a removed or never-created net
    #[error("Stale or unknown net handle: {0}")]
    UnknownNet(String),

    /// Handle refers to a removed or never-created pin
    #[error("Stale or unknown pin handle: {0}")]
    UnknownPin(String),

    /// Handle refers to a removed or never-created instance
    #[error("Stale or unknown instance handle: {0}")]
    UnknownInstance(String),

    /// Library entity index out of range
    #[error("Unknown library {kind}: {index}")]
    UnknownLibraryEntity { kind: &'static str, index: u32 },

    /// Name already taken in its namespace
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    /// Timing arc endpoints do not belong to the same cell or have wrong directions
    #[error("Invalid timing arc {from} -> {to}: {reason}")]
    InvalidArc {
        from: String,
        to: String,
        reason: String,
    },

    /// Cell remap target does not expose the same pins as the current cell
    #[error("Cannot remap {instance} from {from} to {to}: pin {pin} missing")]
    IncompatibleRemap {
        instance: String,
        from: String,
        to: String,
        pin: String,
    },
}

/// Result type for netlist operations
pub type Result<T> = std::result::Result<T, NetlistError>;
