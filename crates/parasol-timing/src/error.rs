//! Error types for library characterization

use parasol_netlist::NetlistError;
use thiserror::Error;

/// Errors that can occur during library characterization
#[derive(Debug, Error)]
pub enum CharacterizationError {
    /// No timing arc to pick a reference from
    #[error("Library '{0}' has no timing arcs")]
    EmptyLibrary(String),

    /// Arc sense is not positive, negative or non unate
    #[error("Timing arc {arc} has an unclassified timing sense")]
    InvalidTimingSense { arc: String },

    /// Query issued before `run_library_analysis`
    #[error("Library has not been characterized")]
    NotCharacterized,

    /// The delay evaluator has no timing data for an arc
    #[error("No timing tables for arc {arc}")]
    MissingTable { arc: String },

    /// Writing the report failed
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Library lookup failed
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

/// Result type for characterization operations
pub type Result<T> = std::result::Result<T, CharacterizationError>;
