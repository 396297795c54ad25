//! Parasol netlist substrate
//!
//! This crate provides the entity/attribute layer the estimation engines
//! are built on:
//! - Generational entity ids and arena storage
//! - Per-entity attribute maps
//! - Netlist, placement and timing library model
//! - Synchronous change notification (observers)
//! - Scenario queries (clock net)

pub mod arena;
pub mod attribute;
pub mod design;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod library;
pub mod observer;
pub mod scenario;

pub use arena::Arena;
pub use attribute::Attribute;
pub use design::{Design, Instance, Net, Pin, PinOwner};
pub use error::{NetlistError, Result};
pub use geometry::{Dbu, DbuPoint};
pub use ids::{EntityId, InstanceId, LibraryArcId, LibraryCellId, LibraryPinId, NetId, PinId};
pub use library::{
    Library, LibraryArc, LibraryCell, LibraryPin, PerEdge, PerMode, PinDirection, TimingMode,
    TimingSense, TimingTransition,
};
pub use observer::{DesignObserver, ObserverHandle};
pub use scenario::{ClockNet, Scenario};
