//! Timing model contract

use crate::error::Result;
use parasol_netlist::{LibraryArcId, TimingMode, TimingTransition};

/// Delay and output slew of one arc evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcTiming {
    pub delay: f64,
    pub slew: f64,
}

/// Source of arc timing being characterized.
///
/// `transition` is the transition at the arc's output pin. Implementations
/// must be deterministic: the characterizer evaluates the same point more
/// than once and expects identical answers.
pub trait DelayEvaluator {
    fn arc_timing(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        transition: TimingTransition,
        input_slew: f64,
        load: f64,
    ) -> Result<ArcTiming>;
}
