//! Scenario queries used by the estimation engines

use crate::ids::NetId;

/// Constraint-derived facts about a design
pub trait Scenario: Send + Sync {
    /// Whether `net` is the designated clock net
    fn is_clock_net(&self, net: NetId) -> bool;
}

/// Scenario with at most one clock net
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockNet(pub Option<NetId>);

impl ClockNet {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(net: NetId) -> Self {
        Self(Some(net))
    }
}

impl Scenario for ClockNet {
    fn is_clock_net(&self, net: NetId) -> bool {
        self.0 == Some(net)
    }
}
