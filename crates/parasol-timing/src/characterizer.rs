//! Logical-effort library characterization
//!
//! Every timing arc is reduced to the linear model `delay = p + g * h`, where
//! `h = load / cin` is the electrical effort (gain) of the arc. The pass runs
//! once per library:
//!
//! 1. Per timing mode, pick the reference arc: the one with the smallest
//!    average rise/fall delay at zero slew and zero load (usually the
//!    smallest inverter).
//! 2. Per mode and transition, find the reference slew: drive the reference
//!    arc with a gain of one and feed its output slew back as input slew
//!    until it settles.
//! 3. For every arc, mode and output transition, sample the delay at gains
//!    `0..=max_gain` with the timing-sense aware input slew and capacitance,
//!    then fit `g` and `p` by least squares.
//! 4. Driver resistance of an arc is `g / cin`; the library bounds are
//!    collected per mode.

use crate::error::{CharacterizationError, Result};
use crate::evaluator::DelayEvaluator;
use crate::least_squares;
use indexmap::IndexMap;
use log::{debug, info, warn};
use parasol_netlist::{
    Library, LibraryArcId, LibraryCellId, NetlistError, PerEdge, PerMode, TimingMode,
    TimingSense, TimingTransition,
};
use serde::{Deserialize, Serialize};

/// Sweep parameters of the characterization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterizerConfig {
    /// Gains `0..=max_gain` are sampled for each regression
    pub max_gain: u32,
    /// Iteration cap of the reference slew fixed point
    pub max_slew_iterations: usize,
    /// Relative tolerance for two consecutive slews to count as equal
    pub slew_tolerance: f64,
}

impl Default for CharacterizerConfig {
    fn default() -> Self {
        Self {
            max_gain: 32,
            max_slew_iterations: 100,
            slew_tolerance: 1e-6,
        }
    }
}

impl CharacterizerConfig {
    pub fn gains(&self) -> Vec<f64> {
        (0..=self.max_gain).map(f64::from).collect()
    }
}

fn approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}

/// Logical-effort parameters of one arc in one timing mode, indexed by the
/// transition at the arc's output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalEffort {
    /// Timing-sense aware input capacitance
    pub cin: PerEdge<f64>,
    /// Timing-sense aware reference input slew
    pub slew: PerEdge<f64>,
    pub g: PerEdge<f64>,
    pub p: PerEdge<f64>,
    /// Sum of squared errors of the fit
    pub residuum: PerEdge<f64>,
    /// False when `cin` is not strictly positive
    pub valid: PerEdge<bool>,
}

impl LogicalEffort {
    fn driver_resistance(&self, edge: TimingTransition) -> f64 {
        if self.valid[edge] {
            self.g[edge] / self.cin[edge]
        } else {
            0.0
        }
    }
}

/// Characterization of one library arc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryArcCharacterization {
    pub cell: LibraryCellId,
    pub sense: TimingSense,
    pub le: PerMode<LogicalEffort>,
}

/// Flattened view of one arc, mode and transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcDelayModel {
    pub g: f64,
    pub p: f64,
    pub cin: f64,
    pub slew: f64,
    pub residuum: f64,
    pub valid: bool,
}

/// Reference arc of a timing mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceArc {
    pub arc: LibraryArcId,
    pub cell: LibraryCellId,
    /// Average rise/fall delay at zero slew and zero load
    pub zero_load_delay: f64,
}

/// Driver resistance range over the valid arcs of a library
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceBounds {
    /// Smallest strictly positive per-transition resistance
    pub min: f64,
    /// Largest per-arc resistance (worst transition)
    pub max: f64,
}

/// Result of a characterization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryCharacterization {
    pub library: String,
    pub gains: Vec<f64>,
    pub reference: PerMode<ReferenceArc>,
    pub reference_slew: PerMode<PerEdge<f64>>,
    /// Fixed point iterations spent per mode and transition
    pub slew_iterations: PerMode<PerEdge<usize>>,
    pub arcs: IndexMap<LibraryArcId, LibraryArcCharacterization>,
    pub resistance: PerMode<Option<ResistanceBounds>>,
}

impl LibraryCharacterization {
    pub fn arc(&self, arc: LibraryArcId) -> Result<&LibraryArcCharacterization> {
        self.arcs.get(&arc).ok_or_else(|| {
            NetlistError::UnknownLibraryEntity {
                kind: "arc",
                index: arc.0,
            }
            .into()
        })
    }
}

/// One-time logical-effort characterizer of a library
#[derive(Debug, Clone, Default)]
pub struct LibraryCharacterizer {
    config: CharacterizerConfig,
    result: Option<LibraryCharacterization>,
}

impl LibraryCharacterizer {
    pub fn new(config: CharacterizerConfig) -> Self {
        Self {
            config,
            result: None,
        }
    }

    pub fn config(&self) -> &CharacterizerConfig {
        &self.config
    }

    pub fn is_characterized(&self) -> bool {
        self.result.is_some()
    }

    /// Data of the completed pass
    pub fn data(&self) -> Result<&LibraryCharacterization> {
        self.result
            .as_ref()
            .ok_or(CharacterizationError::NotCharacterized)
    }

    /// Characterize every arc of `library` against `evaluator`.
    ///
    /// The pass runs once; later calls log a warning and return the existing
    /// result. Nothing is stored when the pass fails.
    pub fn run_library_analysis(
        &mut self,
        library: &Library,
        evaluator: &dyn DelayEvaluator,
    ) -> Result<&LibraryCharacterization> {
        if self.result.is_some() {
            warn!(
                "Library '{}' already characterized, keeping the first result",
                library.name
            );
            return self.data();
        }
        if library.num_arcs() == 0 {
            return Err(CharacterizationError::EmptyLibrary(library.name.clone()));
        }

        let reference = self.find_reference_arcs(library, evaluator)?;
        let (reference_slew, slew_iterations) =
            self.reference_slews(library, evaluator, &reference)?;
        let gains = self.config.gains();

        let mut arcs = IndexMap::with_capacity(library.num_arcs());
        for (_, cell) in library.cells() {
            for &arc_id in &cell.arcs {
                let characterization =
                    characterize_arc(library, evaluator, arc_id, &reference_slew, &gains)?;
                arcs.insert(arc_id, characterization);
            }
        }

        let resistance = PerMode::new(
            resistance_bounds(&arcs, TimingMode::Early),
            resistance_bounds(&arcs, TimingMode::Late),
        );

        info!(
            "Characterized {} timing arcs of library '{}' (reference: {} / {})",
            arcs.len(),
            library.name,
            library.arc_name(reference[TimingMode::Early].arc),
            library.arc_name(reference[TimingMode::Late].arc)
        );

        self.result = Some(LibraryCharacterization {
            library: library.name.clone(),
            gains,
            reference,
            reference_slew,
            slew_iterations,
            arcs,
            resistance,
        });
        self.data()
    }

    fn find_reference_arcs(
        &self,
        library: &Library,
        evaluator: &dyn DelayEvaluator,
    ) -> Result<PerMode<ReferenceArc>> {
        let mut best: PerMode<Option<ReferenceArc>> = PerMode::splat(None);
        for (cell_id, cell) in library.cells() {
            for mode in TimingMode::ALL {
                for &arc in &cell.arcs {
                    let rise = evaluator.arc_timing(arc, mode, TimingTransition::Rise, 0.0, 0.0)?;
                    let fall = evaluator.arc_timing(arc, mode, TimingTransition::Fall, 0.0, 0.0)?;
                    let average = (rise.delay + fall.delay) / 2.0;

                    if best[mode].map_or(true, |b| average < b.zero_load_delay) {
                        best[mode] = Some(ReferenceArc {
                            arc,
                            cell: cell_id,
                            zero_load_delay: average,
                        });
                    }
                }
            }
        }

        match (best[TimingMode::Early], best[TimingMode::Late]) {
            (Some(early), Some(late)) => Ok(PerMode::new(early, late)),
            _ => Err(CharacterizationError::EmptyLibrary(library.name.clone())),
        }
    }

    fn reference_slews(
        &self,
        library: &Library,
        evaluator: &dyn DelayEvaluator,
        reference: &PerMode<ReferenceArc>,
    ) -> Result<(PerMode<PerEdge<f64>>, PerMode<PerEdge<usize>>)> {
        let mut slews = PerMode::splat(PerEdge::splat(0.0));
        let mut iterations = PerMode::splat(PerEdge::splat(0usize));

        for mode in TimingMode::ALL {
            let arc = reference[mode].arc;
            for edge in TimingTransition::ALL {
                let load = library.arc_input_capacitance(arc, edge)?;

                let mut previous = 0.0;
                let mut current = 0.0;
                let mut spent = 0;
                let mut settled = false;
                while spent < self.config.max_slew_iterations {
                    spent += 1;
                    current = evaluator.arc_timing(arc, mode, edge, previous, load)?.slew;
                    if approx_equal(previous, current, self.config.slew_tolerance) {
                        settled = true;
                        break;
                    }
                    previous = current;
                }
                if !settled {
                    warn!(
                        "Reference slew for {} {} did not settle after {} iterations",
                        mode, edge, spent
                    );
                }
                debug!(
                    "Reference slew {} {}: {} after {} iterations",
                    mode, edge, current, spent
                );

                slews[mode][edge] = current;
                iterations[mode][edge] = spent;
            }
        }
        Ok((slews, iterations))
    }

    /// Characterization of one arc, mode and output transition
    pub fn characterization(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        edge: TimingTransition,
    ) -> Result<ArcDelayModel> {
        let le = &self.data()?.arc(arc)?.le[mode];
        Ok(ArcDelayModel {
            g: le.g[edge],
            p: le.p[edge],
            cin: le.cin[edge],
            slew: le.slew[edge],
            residuum: le.residuum[edge],
            valid: le.valid[edge],
        })
    }

    /// Logical-effort delay `p + g * load / cin`. Invalid arcs report `p`.
    pub fn estimate_delay(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        edge: TimingTransition,
        load: f64,
    ) -> Result<f64> {
        let model = self.characterization(arc, mode, edge)?;
        let gain = if model.valid { load / model.cin } else { 0.0 };
        Ok(model.p + model.g * gain)
    }

    /// Delay when the arc drives a copy of its own input (`h = 1`)
    pub fn unit_gain_delay(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        edge: TimingTransition,
    ) -> Result<f64> {
        let model = self.characterization(arc, mode, edge)?;
        self.estimate_delay(arc, mode, edge, model.cin)
    }

    /// `g / cin`; zero for invalid arcs
    pub fn driver_resistance(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        edge: TimingTransition,
    ) -> Result<f64> {
        Ok(self.data()?.arc(arc)?.le[mode].driver_resistance(edge))
    }

    /// Worst transition driver resistance of an arc
    pub fn arc_driver_resistance(&self, arc: LibraryArcId, mode: TimingMode) -> Result<f64> {
        let le = &self.data()?.arc(arc)?.le[mode];
        Ok(le
            .driver_resistance(TimingTransition::Rise)
            .max(le.driver_resistance(TimingTransition::Fall)))
    }

    /// Largest arc driver resistance among the arcs of `cell`; zero for
    /// cells without arcs
    pub fn cell_max_driver_resistance(&self, cell: LibraryCellId, mode: TimingMode) -> Result<f64> {
        let data = self.data()?;
        Ok(data
            .arcs
            .iter()
            .filter(|(_, c)| c.cell == cell)
            .map(|(_, c)| {
                c.le[mode]
                    .driver_resistance(TimingTransition::Rise)
                    .max(c.le[mode].driver_resistance(TimingTransition::Fall))
            })
            .fold(0.0, f64::max))
    }

    /// Driver resistance range of the library; `None` when no arc is valid
    pub fn library_driver_resistance(&self, mode: TimingMode) -> Result<Option<ResistanceBounds>> {
        Ok(self.data()?.resistance[mode])
    }

    pub fn reference_arc(&self, mode: TimingMode) -> Result<ReferenceArc> {
        Ok(self.data()?.reference[mode])
    }

    pub fn reference_slew(&self, mode: TimingMode, edge: TimingTransition) -> Result<f64> {
        Ok(self.data()?.reference_slew[mode][edge])
    }

    pub fn gains(&self) -> Result<&[f64]> {
        Ok(&self.data()?.gains)
    }

    /// RMS error `sqrt(SSE / (N - 2))` of a fit over `N` gains
    pub fn rms_error(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        edge: TimingTransition,
    ) -> Result<f64> {
        let data = self.data()?;
        let residuum = data.arc(arc)?.le[mode].residuum[edge];
        Ok(least_squares::rms_error(residuum, data.gains.len()))
    }
}

fn characterize_arc(
    library: &Library,
    evaluator: &dyn DelayEvaluator,
    arc_id: LibraryArcId,
    reference_slew: &PerMode<PerEdge<f64>>,
    gains: &[f64],
) -> Result<LibraryArcCharacterization> {
    let arc = library.arc(arc_id)?;
    let capacitance = library.pin(arc.from)?.capacitance;
    let mut le = PerMode::splat(LogicalEffort::default());

    for mode in TimingMode::ALL {
        let slews = reference_slew[mode];
        let effort = &mut le[mode];
        for edge in TimingTransition::ALL {
            // Output transition `edge` is caused by input transition `source`
            let (cin, slew) = match arc.sense {
                TimingSense::PositiveUnate => (capacitance[edge], slews[edge]),
                TimingSense::NegativeUnate => {
                    let source = edge.opposite();
                    (capacitance[source], slews[source])
                }
                TimingSense::NonUnate => (
                    (capacitance[TimingTransition::Rise] + capacitance[TimingTransition::Fall])
                        / 2.0,
                    (slews[TimingTransition::Rise] + slews[TimingTransition::Fall]) / 2.0,
                ),
                TimingSense::Unknown => {
                    return Err(CharacterizationError::InvalidTimingSense {
                        arc: library.arc_name(arc_id),
                    })
                }
            };

            let mut delays = Vec::with_capacity(gains.len());
            for &h in gains {
                delays.push(evaluator.arc_timing(arc_id, mode, edge, slew, h * cin)?.delay);
            }
            let fit = least_squares::fit(gains, &delays);

            effort.cin[edge] = cin;
            effort.slew[edge] = slew;
            effort.g[edge] = fit.slope;
            effort.p[edge] = fit.intercept;
            effort.residuum[edge] = least_squares::sum_squared_error(gains, &delays, &fit);
            effort.valid[edge] = cin > 0.0;
            if !effort.valid[edge] {
                warn!(
                    "Timing arc {} has no input capacitance for {} {}; excluded from driver resistance",
                    library.arc_name(arc_id),
                    mode,
                    edge
                );
            }
        }
    }

    Ok(LibraryArcCharacterization {
        cell: arc.cell,
        sense: arc.sense,
        le,
    })
}

fn resistance_bounds(
    arcs: &IndexMap<LibraryArcId, LibraryArcCharacterization>,
    mode: TimingMode,
) -> Option<ResistanceBounds> {
    let mut bounds: Option<ResistanceBounds> = None;
    for characterization in arcs.values() {
        let le = &characterization.le[mode];
        for edge in TimingTransition::ALL {
            if !le.valid[edge] {
                continue;
            }
            let r = le.driver_resistance(edge);
            let entry = bounds.get_or_insert(ResistanceBounds {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            });
            entry.max = entry.max.max(r);
            if r > 0.0 {
                entry.min = entry.min.min(r);
            }
        }
    }
    bounds.map(|b| ResistanceBounds {
        min: if b.min.is_finite() { b.min } else { 0.0 },
        max: b.max,
    })
}
