//! Logical-effort fit report

use crate::characterizer::LibraryCharacterizer;
use crate::error::Result;
use crate::evaluator::DelayEvaluator;
use crate::least_squares;
use parasol_netlist::{Library, TimingMode, TimingTransition};
use std::io::Write;

const RULE: &str =
    "--------------------------------------------------------------------------------";

impl LibraryCharacterizer {
    /// Write per-arc fit parameters followed by the table-vs-model delay at
    /// every sampled gain. Library delays are re-evaluated at the arc's
    /// timing-sense aware slew and load.
    pub fn write_report(
        &self,
        library: &Library,
        evaluator: &dyn DelayEvaluator,
        out: &mut dyn Write,
    ) -> Result<()> {
        let data = self.data()?;

        writeln!(out, "{}", RULE)?;
        writeln!(out, "Logical Effort Report: {}", data.library)?;
        writeln!(out, "{}", RULE)?;
        for mode in TimingMode::ALL {
            let reference = data.reference[mode];
            writeln!(
                out,
                "Reference {}: {} slew fall={:.4} rise={:.4}",
                mode,
                library.arc_name(reference.arc),
                data.reference_slew[mode][TimingTransition::Fall],
                data.reference_slew[mode][TimingTransition::Rise]
            )?;
            match data.resistance[mode] {
                Some(bounds) => writeln!(
                    out,
                    "Driver resistance {}: min={:.6} max={:.6}",
                    mode, bounds.min, bounds.max
                )?,
                None => writeln!(out, "Driver resistance {}: no valid arcs", mode)?,
            }
        }

        for (_, cell) in library.cells() {
            writeln!(out, "Cell: {}", cell.name)?;
            for &arc in &cell.arcs {
                let characterization = data.arc(arc)?;
                for mode in TimingMode::ALL {
                    let le = &characterization.le[mode];
                    for edge in TimingTransition::ALL {
                        let rms = least_squares::rms_error(le.residuum[edge], data.gains.len());
                        writeln!(
                            out,
                            "\t{}: mode={} edge={} g={:.6} p={:.6} cin={:.6} slew={:.6} error={:.6} valid={}",
                            library.arc_name(arc),
                            mode,
                            edge,
                            le.g[edge],
                            le.p[edge],
                            le.cin[edge],
                            le.slew[edge],
                            rms,
                            le.valid[edge]
                        )?;
                        writeln!(
                            out,
                            "\t\t{:>4}{:>12}{:>12}{:>12}",
                            "gain", "load", "delay", "le_delay"
                        )?;
                        for &h in &data.gains {
                            let load = h * le.cin[edge];
                            let delay = evaluator
                                .arc_timing(arc, mode, edge, le.slew[edge], load)?
                                .delay;
                            let le_delay = le.p[edge] + le.g[edge] * h;
                            writeln!(
                                out,
                                "\t\t{:>4}{:>12.4}{:>12.4}{:>12.4}",
                                h, load, delay, le_delay
                            )?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
