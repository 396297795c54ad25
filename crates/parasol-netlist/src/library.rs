//! Timing library model
//!
//! Static description of the standard cells a design instantiates:
//! cells, their pins (direction, input capacitance, offset inside the cell)
//! and the timing arcs between pins. The library is append-only, so its
//! entities use plain index ids.
//!
//! # Key Concepts
//!
//! - **Timing mode**: EARLY (best case) or LATE (worst case) analysis corner.
//! - **Transition**: RISE or FALL at the arc's output pin.
//! - **Timing sense**: whether the output tracks (positive unate), inverts
//!   (negative unate) or is ambiguous relative to (non unate) the input.

use crate::error::{NetlistError, Result};
use crate::geometry::DbuPoint;
use crate::ids::{LibraryArcId, LibraryCellId, LibraryPinId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Analysis corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingMode {
    Early,
    Late,
}

impl TimingMode {
    pub const ALL: [TimingMode; 2] = [TimingMode::Early, TimingMode::Late];

    fn slot(self) -> usize {
        match self {
            TimingMode::Early => 0,
            TimingMode::Late => 1,
        }
    }
}

impl fmt::Display for TimingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingMode::Early => write!(f, "EARLY"),
            TimingMode::Late => write!(f, "LATE"),
        }
    }
}

/// Signal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingTransition {
    Fall,
    Rise,
}

impl TimingTransition {
    pub const ALL: [TimingTransition; 2] = [TimingTransition::Fall, TimingTransition::Rise];

    pub fn opposite(self) -> Self {
        match self {
            TimingTransition::Fall => TimingTransition::Rise,
            TimingTransition::Rise => TimingTransition::Fall,
        }
    }

    fn slot(self) -> usize {
        match self {
            TimingTransition::Fall => 0,
            TimingTransition::Rise => 1,
        }
    }
}

impl fmt::Display for TimingTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingTransition::Fall => write!(f, "FALL"),
            TimingTransition::Rise => write!(f, "RISE"),
        }
    }
}

/// One value per timing mode
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerMode<T>(pub [T; 2]);

impl<T> PerMode<T> {
    pub fn new(early: T, late: T) -> Self {
        Self([early, late])
    }
}

impl<T: Clone> PerMode<T> {
    pub fn splat(value: T) -> Self {
        Self([value.clone(), value])
    }
}

impl<T> Index<TimingMode> for PerMode<T> {
    type Output = T;

    fn index(&self, mode: TimingMode) -> &T {
        &self.0[mode.slot()]
    }
}

impl<T> IndexMut<TimingMode> for PerMode<T> {
    fn index_mut(&mut self, mode: TimingMode) -> &mut T {
        &mut self.0[mode.slot()]
    }
}

/// One value per transition
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerEdge<T>(pub [T; 2]);

impl<T> PerEdge<T> {
    pub fn new(fall: T, rise: T) -> Self {
        Self([fall, rise])
    }
}

impl<T: Clone> PerEdge<T> {
    pub fn splat(value: T) -> Self {
        Self([value.clone(), value])
    }
}

impl<T> Index<TimingTransition> for PerEdge<T> {
    type Output = T;

    fn index(&self, edge: TimingTransition) -> &T {
        &self.0[edge.slot()]
    }
}

impl<T> IndexMut<TimingTransition> for PerEdge<T> {
    fn index_mut(&mut self, edge: TimingTransition) -> &mut T {
        &mut self.0[edge.slot()]
    }
}

/// Timing sense of an arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingSense {
    /// Output rises when input rises
    PositiveUnate,
    /// Output falls when input rises
    NegativeUnate,
    /// Output can rise or fall depending on other inputs
    NonUnate,
    /// Not classified by the library source (e.g. a missing `timing_sense`)
    Unknown,
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
}

/// A cell of the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryCell {
    pub name: String,
    pub area: f64,
    pub pins: Vec<LibraryPinId>,
    pub arcs: Vec<LibraryArcId>,
}

/// A pin of a library cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryPin {
    pub name: String,
    pub cell: LibraryCellId,
    pub direction: PinDirection,
    /// Input capacitance seen by a rising / falling signal
    pub capacitance: PerEdge<f64>,
    /// Pin location relative to the cell origin
    pub offset: DbuPoint,
}

/// A timing arc from an input pin to an output pin of the same cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArc {
    pub cell: LibraryCellId,
    pub from: LibraryPinId,
    pub to: LibraryPinId,
    pub sense: TimingSense,
}

/// Standard cell library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    cells: Vec<LibraryCell>,
    pins: Vec<LibraryPin>,
    arcs: Vec<LibraryArc>,
    cell_names: IndexMap<String, LibraryCellId>,
}

impl Library {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Add an empty cell
    pub fn add_cell(&mut self, name: &str, area: f64) -> Result<LibraryCellId> {
        if self.cell_names.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "library cell",
                name: name.to_string(),
            });
        }
        let id = LibraryCellId(self.cells.len() as u32);
        self.cells.push(LibraryCell {
            name: name.to_string(),
            area,
            pins: Vec::new(),
            arcs: Vec::new(),
        });
        self.cell_names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Add a pin with the same capacitance for both transitions
    pub fn add_pin(
        &mut self,
        cell: LibraryCellId,
        name: &str,
        direction: PinDirection,
        capacitance: f64,
    ) -> Result<LibraryPinId> {
        let cell_name = &self.cell(cell)?.name;
        if self.find_pin(cell, name).is_some() {
            return Err(NetlistError::DuplicateName {
                kind: "library pin",
                name: format!("{}:{}", cell_name, name),
            });
        }
        let id = LibraryPinId(self.pins.len() as u32);
        self.pins.push(LibraryPin {
            name: name.to_string(),
            cell,
            direction,
            capacitance: PerEdge::splat(capacitance),
            offset: DbuPoint::default(),
        });
        self.cells[cell.0 as usize].pins.push(id);
        Ok(id)
    }

    pub fn set_pin_capacitance(&mut self, pin: LibraryPinId, capacitance: PerEdge<f64>) -> Result<()> {
        self.pin_mut(pin)?.capacitance = capacitance;
        Ok(())
    }

    pub fn set_pin_offset(&mut self, pin: LibraryPinId, offset: DbuPoint) -> Result<()> {
        self.pin_mut(pin)?.offset = offset;
        Ok(())
    }

    /// Add a timing arc `from -> to`; both pins must belong to the same cell,
    /// `from` must be an input and `to` an output
    pub fn add_arc(
        &mut self,
        from: LibraryPinId,
        to: LibraryPinId,
        sense: TimingSense,
    ) -> Result<LibraryArcId> {
        let from_pin = self.pin(from)?;
        let to_pin = self.pin(to)?;
        let reason = if from_pin.cell != to_pin.cell {
            Some("pins belong to different cells")
        } else if from_pin.direction != PinDirection::Input {
            Some("source pin is not an input")
        } else if to_pin.direction != PinDirection::Output {
            Some("sink pin is not an output")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(NetlistError::InvalidArc {
                from: from_pin.name.clone(),
                to: to_pin.name.clone(),
                reason: reason.to_string(),
            });
        }

        let cell = from_pin.cell;
        let id = LibraryArcId(self.arcs.len() as u32);
        self.arcs.push(LibraryArc {
            cell,
            from,
            to,
            sense,
        });
        self.cells[cell.0 as usize].arcs.push(id);
        Ok(id)
    }

    pub fn cell(&self, id: LibraryCellId) -> Result<&LibraryCell> {
        self.cells
            .get(id.0 as usize)
            .ok_or(NetlistError::UnknownLibraryEntity {
                kind: "cell",
                index: id.0,
            })
    }

    pub fn pin(&self, id: LibraryPinId) -> Result<&LibraryPin> {
        self.pins
            .get(id.0 as usize)
            .ok_or(NetlistError::UnknownLibraryEntity {
                kind: "pin",
                index: id.0,
            })
    }

    fn pin_mut(&mut self, id: LibraryPinId) -> Result<&mut LibraryPin> {
        self.pins
            .get_mut(id.0 as usize)
            .ok_or(NetlistError::UnknownLibraryEntity {
                kind: "pin",
                index: id.0,
            })
    }

    pub fn arc(&self, id: LibraryArcId) -> Result<&LibraryArc> {
        self.arcs
            .get(id.0 as usize)
            .ok_or(NetlistError::UnknownLibraryEntity {
                kind: "arc",
                index: id.0,
            })
    }

    pub fn find_cell(&self, name: &str) -> Option<LibraryCellId> {
        self.cell_names.get(name).copied()
    }

    pub fn find_pin(&self, cell: LibraryCellId, name: &str) -> Option<LibraryPinId> {
        let cell = self.cells.get(cell.0 as usize)?;
        cell.pins
            .iter()
            .copied()
            .find(|pin| self.pins[pin.0 as usize].name == name)
    }

    /// All cells in insertion order
    pub fn cells(&self) -> impl Iterator<Item = (LibraryCellId, &LibraryCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (LibraryCellId(index as u32), cell))
    }

    /// All arcs in insertion order
    pub fn arcs(&self) -> impl Iterator<Item = (LibraryArcId, &LibraryArc)> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .map(|(index, arc)| (LibraryArcId(index as u32), arc))
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Input capacitance of the arc's source pin for the given transition
    pub fn arc_input_capacitance(&self, arc: LibraryArcId, edge: TimingTransition) -> Result<f64> {
        let arc = self.arc(arc)?;
        Ok(self.pin(arc.from)?.capacitance[edge])
    }

    /// Human readable `CELL:FROM->TO` name of an arc
    pub fn arc_name(&self, arc: LibraryArcId) -> String {
        let describe = || -> Result<String> {
            let arc = self.arc(arc)?;
            Ok(format!(
                "{}:{}->{}",
                self.cell(arc.cell)?.name,
                self.pin(arc.from)?.name,
                self.pin(arc.to)?.name
            ))
        };
        describe().unwrap_or_else(|_| format!("<arc {}>", arc.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inverter_library() -> (Library, LibraryArcId) {
        let mut lib = Library::new("test");
        let inv = lib.add_cell("INV_X1", 1.0).unwrap();
        let a = lib.add_pin(inv, "A", PinDirection::Input, 2.0).unwrap();
        let y = lib.add_pin(inv, "Y", PinDirection::Output, 0.0).unwrap();
        let arc = lib.add_arc(a, y, TimingSense::NegativeUnate).unwrap();
        (lib, arc)
    }

    #[test]
    fn test_cell_pins_and_arcs() {
        let (lib, arc) = inverter_library();
        let inv = lib.find_cell("INV_X1").unwrap();

        assert_eq!(lib.cell(inv).unwrap().pins.len(), 2);
        assert_eq!(lib.cell(inv).unwrap().arcs, vec![arc]);
        assert_eq!(lib.arc_name(arc), "INV_X1:A->Y");
        assert_eq!(lib.arc_input_capacitance(arc, TimingTransition::Rise).unwrap(), 2.0);
    }

    #[test]
    fn test_arc_direction_checked() {
        let (mut lib, _) = inverter_library();
        let inv = lib.find_cell("INV_X1").unwrap();
        let a = lib.find_pin(inv, "A").unwrap();
        let y = lib.find_pin(inv, "Y").unwrap();

        assert!(matches!(
            lib.add_arc(y, a, TimingSense::PositiveUnate),
            Err(NetlistError::InvalidArc { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (mut lib, _) = inverter_library();
        assert!(lib.add_cell("INV_X1", 2.0).is_err());
        let inv = lib.find_cell("INV_X1").unwrap();
        assert!(lib.add_pin(inv, "A", PinDirection::Input, 1.0).is_err());
    }

    #[test]
    fn test_per_edge_indexing() {
        let mut caps = PerEdge::new(1.0, 2.0);
        assert_eq!(caps[TimingTransition::Fall], 1.0);
        assert_eq!(caps[TimingTransition::Rise], 2.0);
        caps[TimingTransition::Rise.opposite()] = 3.0;
        assert_eq!(caps[TimingTransition::Fall], 3.0);

        let modes = PerMode::new("early", "late");
        assert_eq!(modes[TimingMode::Late], "late");
    }
}
