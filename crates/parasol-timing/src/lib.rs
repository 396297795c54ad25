//! Parasol timing characterization
//!
//! Fits a logical-effort model `delay = p + g * h` to every timing arc of a
//! library so that arc delays can be estimated without consulting the
//! nonlinear delay tables:
//! - [`DelayEvaluator`]: the timing model being characterized
//! - [`NldmTable`] / [`NldmDelayEvaluator`]: table-based evaluator
//! - [`LibraryCharacterizer`]: reference arc selection, reference slew fixed
//!   point, per-arc regression and driver resistance bounds
//! - [`write_report`](LibraryCharacterizer::write_report): fit quality report

pub mod characterizer;
pub mod error;
pub mod evaluator;
pub mod least_squares;
pub mod nldm;
mod report;

pub use characterizer::{
    ArcDelayModel, CharacterizerConfig, LibraryArcCharacterization, LibraryCharacterization,
    LibraryCharacterizer, LogicalEffort, ReferenceArc, ResistanceBounds,
};
pub use error::{CharacterizationError, Result};
pub use evaluator::{ArcTiming, DelayEvaluator};
pub use least_squares::LinearFit;
pub use nldm::{NldmDelayEvaluator, NldmTable};
pub use parasol_netlist::{PerEdge, PerMode, TimingMode, TimingSense, TimingTransition};
