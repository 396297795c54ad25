//! Change notification
//!
//! Observers are called synchronously, in registration order, from inside
//! the mutating [`Design`] call, so anything they derive (dirty marks,
//! incremental sums) is up to date before that call returns. `post` hooks
//! see the design after the edit, `pre` hooks before it.

use crate::design::Design;
use crate::ids::{InstanceId, LibraryCellId, NetId, PinId};
use serde::{Deserialize, Serialize};

/// Handle returned by [`Design::register_observer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverHandle(pub u64);

/// Receiver of structural and placement edits. All hooks default to no-ops.
pub trait DesignObserver: Send + Sync {
    fn on_post_net_create(&self, _design: &Design, _net: NetId) {}

    fn on_pre_net_remove(&self, _design: &Design, _net: NetId) {}

    fn on_post_instance_move(&self, _design: &Design, _instance: InstanceId) {}

    fn on_post_cell_remap(
        &self,
        _design: &Design,
        _instance: InstanceId,
        _previous: LibraryCellId,
    ) {
    }

    fn on_post_pin_connect(&self, _design: &Design, _pin: PinId, _net: NetId) {}

    fn on_pre_pin_disconnect(&self, _design: &Design, _pin: PinId, _net: NetId) {}
}
