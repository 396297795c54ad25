//! Non-Linear Delay Model tables
//!
//! Delay and output slew as functions of input slew and output load, read
//! from 2D tables with bilinear interpolation. Queries outside the axis range
//! clamp to the table edge.

use crate::error::{CharacterizationError, Result};
use crate::evaluator::{ArcTiming, DelayEvaluator};
use indexmap::IndexMap;
use parasol_netlist::{Library, LibraryArcId, TimingMode, TimingTransition};
use serde::{Deserialize, Serialize};

/// 2D lookup table indexed by `[slew_idx][load_idx]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NldmTable {
    pub input_slew_axis: Vec<f64>,
    pub output_load_axis: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl NldmTable {
    pub fn new(input_slew_axis: Vec<f64>, output_load_axis: Vec<f64>, values: Vec<Vec<f64>>) -> Self {
        Self {
            input_slew_axis,
            output_load_axis,
            values,
        }
    }

    /// Table with a single value
    pub fn constant(value: f64) -> Self {
        Self::new(vec![0.0], vec![0.0], vec![vec![value]])
    }

    pub fn lookup(&self, input_slew: f64, output_load: f64) -> f64 {
        let Some(first_row) = self.values.first() else {
            return 0.0;
        };
        let Some(&v00_origin) = first_row.first() else {
            return 0.0;
        };
        if self.input_slew_axis.len() <= 1 && self.output_load_axis.len() <= 1 {
            return v00_origin;
        }

        let (si, sf) = interval(&self.input_slew_axis, input_slew);
        let (li, lf) = interval(&self.output_load_axis, output_load);

        let at = |s: usize, l: usize, fallback: f64| {
            self.values
                .get(s)
                .and_then(|row| row.get(l))
                .copied()
                .unwrap_or(fallback)
        };
        let v00 = at(si, li, v00_origin);
        let v01 = at(si, li + 1, v00);
        let v10 = at(si + 1, li, v00);
        let v11 = at(si + 1, li + 1, v00);

        let v0 = v00 + (v01 - v00) * lf;
        let v1 = v10 + (v11 - v10) * lf;
        v0 + (v1 - v0) * sf
    }
}

impl Default for NldmTable {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

/// Interval index and fraction of `value` on `axis`, clamped
fn interval(axis: &[f64], value: f64) -> (usize, f64) {
    if axis.len() <= 1 || value <= axis[0] {
        return (0, 0.0);
    }
    let last = axis.len() - 1;
    if value >= axis[last] {
        return (last - 1, 1.0);
    }
    let i = axis
        .windows(2)
        .position(|w| value >= w[0] && value < w[1])
        .unwrap_or(last - 1);
    let span = axis[i + 1] - axis[i];
    let frac = if span > 0.0 { (value - axis[i]) / span } else { 0.0 };
    (i, frac)
}

/// Delay and output slew tables of one arc, mode and output transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcTables {
    pub delay: NldmTable,
    pub slew: NldmTable,
}

/// Table-driven [`DelayEvaluator`]
#[derive(Debug, Clone, Default)]
pub struct NldmDelayEvaluator {
    tables: IndexMap<(LibraryArcId, TimingMode, TimingTransition), ArcTables>,
    arc_names: IndexMap<LibraryArcId, String>,
}

impl NldmDelayEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator whose missing-table errors name arcs the way `library` does
    pub fn for_library(library: &Library) -> Self {
        Self {
            tables: IndexMap::new(),
            arc_names: library
                .arcs()
                .map(|(id, _)| (id, library.arc_name(id)))
                .collect(),
        }
    }

    pub fn set_tables(
        &mut self,
        arc: LibraryArcId,
        mode: TimingMode,
        transition: TimingTransition,
        delay: NldmTable,
        slew: NldmTable,
    ) {
        self.tables
            .insert((arc, mode, transition), ArcTables { delay, slew });
    }

    /// Install the same tables for both modes and transitions
    pub fn set_all_tables(&mut self, arc: LibraryArcId, delay: NldmTable, slew: NldmTable) {
        for mode in TimingMode::ALL {
            for transition in TimingTransition::ALL {
                self.set_tables(arc, mode, transition, delay.clone(), slew.clone());
            }
        }
    }

    pub fn tables(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        transition: TimingTransition,
    ) -> Option<&ArcTables> {
        self.tables.get(&(arc, mode, transition))
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }
}

impl DelayEvaluator for NldmDelayEvaluator {
    fn arc_timing(
        &self,
        arc: LibraryArcId,
        mode: TimingMode,
        transition: TimingTransition,
        input_slew: f64,
        load: f64,
    ) -> Result<ArcTiming> {
        let tables = self.tables(arc, mode, transition).ok_or_else(|| {
            CharacterizationError::MissingTable {
                arc: self
                    .arc_names
                    .get(&arc)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", arc.0)),
            }
        })?;
        Ok(ArcTiming {
            delay: tables.delay.lookup(input_slew, load),
            slew: tables.slew.lookup(input_slew, load),
        })
    }
}
