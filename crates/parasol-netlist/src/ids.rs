//! Entity identifiers
//!
//! Netlist entities (nets, pins, instances) can be removed, so their ids
//! carry a generation counter: a slot index may be reused, but a handle
//! taken before the removal keeps the old generation and no longer matches.
//! Library entities are append-only and use plain indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generational handle into an [`Arena`](crate::Arena) or
/// [`Attribute`](crate::Attribute)
pub trait EntityId: Copy + Eq + std::hash::Hash + fmt::Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl EntityId for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            fn index(self) -> u32 {
                self.index
            }

            fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}v{}", $prefix, self.index, self.generation)
            }
        }
    };
}

entity_id!(
    /// Identifier of a net in a [`Design`](crate::Design)
    NetId,
    "n"
);
entity_id!(
    /// Identifier of a pin (instance pin or top-level port)
    PinId,
    "p"
);
entity_id!(
    /// Identifier of a placed cell instance
    InstanceId,
    "i"
);

/// Identifier of a cell in a [`Library`](crate::Library)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryCellId(pub u32);

/// Identifier of a pin of a library cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryPinId(pub u32);

/// Identifier of a timing arc of a library cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryArcId(pub u32);
