//! Placed netlist
//!
//! A [`Design`] owns nets, pins, cell instances and top-level ports together
//! with their placement, and the [`Library`] the instances refer to. Every
//! structural or placement edit goes through a `Design` method so registered
//! [`DesignObserver`]s see it.

use crate::arena::Arena;
use crate::error::{NetlistError, Result};
use crate::geometry::DbuPoint;
use crate::ids::{InstanceId, LibraryCellId, LibraryPinId, NetId, PinId};
use crate::library::{Library, PinDirection};
use crate::observer::{DesignObserver, ObserverHandle};
use indexmap::IndexMap;
use std::sync::Arc;

/// A net and the pins it connects
#[derive(Debug, Clone)]
pub struct Net {
    pub name: String,
    pins: Vec<PinId>,
}

impl Net {
    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }

    pub fn num_pins(&self) -> usize {
        self.pins.len()
    }
}

/// What a pin is attached to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinOwner {
    /// Pin of a cell instance, located at instance origin + library pin offset
    Instance {
        instance: InstanceId,
        library_pin: LibraryPinId,
    },
    /// Top-level port at a fixed location
    Port { position: DbuPoint },
}

/// A connection point of a net
#[derive(Debug, Clone)]
pub struct Pin {
    pub name: String,
    pub direction: PinDirection,
    pub owner: PinOwner,
    net: Option<NetId>,
}

impl Pin {
    pub fn net(&self) -> Option<NetId> {
        self.net
    }

    pub fn instance(&self) -> Option<InstanceId> {
        match self.owner {
            PinOwner::Instance { instance, .. } => Some(instance),
            PinOwner::Port { .. } => None,
        }
    }

    pub fn is_port(&self) -> bool {
        matches!(self.owner, PinOwner::Port { .. })
    }

    /// Cell outputs drive their net; so do input ports, which drive into the design
    pub fn is_driver(&self) -> bool {
        match self.owner {
            PinOwner::Instance { .. } => self.direction == PinDirection::Output,
            PinOwner::Port { .. } => self.direction == PinDirection::Input,
        }
    }
}

/// A placed cell instance
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub library_cell: LibraryCellId,
    pub position: DbuPoint,
    pins: Vec<PinId>,
}

impl Instance {
    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }
}

/// Netlist + placement database
pub struct Design {
    pub name: String,
    library: Library,
    nets: Arena<NetId, Net>,
    pins: Arena<PinId, Pin>,
    instances: Arena<InstanceId, Instance>,
    net_names: IndexMap<String, NetId>,
    instance_names: IndexMap<String, InstanceId>,
    port_names: IndexMap<String, PinId>,
    observers: Vec<(ObserverHandle, Arc<dyn DesignObserver>)>,
    next_observer: u64,
}

impl Design {
    pub fn new(name: &str, library: Library) -> Self {
        Self {
            name: name.to_string(),
            library,
            nets: Arena::new(),
            pins: Arena::new(),
            instances: Arena::new(),
            net_names: IndexMap::new(),
            instance_names: IndexMap::new(),
            port_names: IndexMap::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn register_observer(&mut self, observer: Arc<dyn DesignObserver>) -> ObserverHandle {
        let handle = ObserverHandle(self.next_observer);
        self.next_observer += 1;
        self.observers.push((handle, observer));
        handle
    }

    /// Returns false if the handle was not registered
    pub fn unregister_observer(&mut self, handle: ObserverHandle) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(h, _)| *h != handle);
        self.observers.len() != before
    }

    pub fn num_observers(&self) -> usize {
        self.observers.len()
    }

    fn notify(&self, event: impl Fn(&dyn DesignObserver)) {
        for (_, observer) in &self.observers {
            event(observer.as_ref());
        }
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    pub fn create_net(&mut self, name: &str) -> Result<NetId> {
        if self.net_names.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "net",
                name: name.to_string(),
            });
        }
        let net = self.nets.insert(Net {
            name: name.to_string(),
            pins: Vec::new(),
        });
        self.net_names.insert(name.to_string(), net);
        log::debug!("Created net {} ({})", name, net);
        self.notify(|o| o.on_post_net_create(self, net));
        Ok(net)
    }

    /// Remove a net; its pins are left unconnected
    pub fn remove_net(&mut self, net: NetId) -> Result<()> {
        if !self.nets.contains(net) {
            return Err(NetlistError::UnknownNet(net.to_string()));
        }
        self.notify(|o| o.on_pre_net_remove(self, net));

        let Some(removed) = self.nets.remove(net) else {
            return Err(NetlistError::UnknownNet(net.to_string()));
        };
        for pin in &removed.pins {
            if let Some(pin) = self.pins.get_mut(*pin) {
                pin.net = None;
            }
        }
        self.net_names.shift_remove(&removed.name);
        log::debug!("Removed net {} ({})", removed.name, net);
        Ok(())
    }

    /// Place an instance of `cell`; one pin is created per library pin
    pub fn create_instance(
        &mut self,
        name: &str,
        cell: LibraryCellId,
        position: DbuPoint,
    ) -> Result<InstanceId> {
        if self.instance_names.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "instance",
                name: name.to_string(),
            });
        }
        let library_pins: Vec<(LibraryPinId, String, PinDirection)> = self
            .library
            .cell(cell)?
            .pins
            .iter()
            .map(|&lpin| {
                self.library
                    .pin(lpin)
                    .map(|p| (lpin, p.name.clone(), p.direction))
            })
            .collect::<Result<_>>()?;

        let instance = self.instances.insert(Instance {
            name: name.to_string(),
            library_cell: cell,
            position,
            pins: Vec::with_capacity(library_pins.len()),
        });
        let mut pins = Vec::with_capacity(library_pins.len());
        for (library_pin, pin_name, direction) in library_pins {
            pins.push(self.pins.insert(Pin {
                name: pin_name,
                direction,
                owner: PinOwner::Instance {
                    instance,
                    library_pin,
                },
                net: None,
            }));
        }
        if let Some(inst) = self.instances.get_mut(instance) {
            inst.pins = pins;
        }
        self.instance_names.insert(name.to_string(), instance);
        Ok(instance)
    }

    /// Create a top-level port. An `Input` port drives its net.
    pub fn create_port(
        &mut self,
        name: &str,
        direction: PinDirection,
        position: DbuPoint,
    ) -> Result<PinId> {
        if self.port_names.contains_key(name) {
            return Err(NetlistError::DuplicateName {
                kind: "port",
                name: name.to_string(),
            });
        }
        let pin = self.pins.insert(Pin {
            name: name.to_string(),
            direction,
            owner: PinOwner::Port { position },
            net: None,
        });
        self.port_names.insert(name.to_string(), pin);
        Ok(pin)
    }

    /// Connect `pin` to `net`, disconnecting it from its previous net first
    pub fn connect(&mut self, pin: PinId, net: NetId) -> Result<()> {
        if !self.nets.contains(net) {
            return Err(NetlistError::UnknownNet(net.to_string()));
        }
        let current = self.pin(pin)?.net;
        if current == Some(net) {
            return Ok(());
        }
        if current.is_some() {
            self.disconnect(pin)?;
        }

        if let Some(p) = self.pins.get_mut(pin) {
            p.net = Some(net);
        }
        if let Some(n) = self.nets.get_mut(net) {
            n.pins.push(pin);
        }
        self.notify(|o| o.on_post_pin_connect(self, pin, net));
        Ok(())
    }

    /// Detach `pin` from its net, if any
    pub fn disconnect(&mut self, pin: PinId) -> Result<()> {
        let Some(net) = self.pin(pin)?.net else {
            return Ok(());
        };
        self.notify(|o| o.on_pre_pin_disconnect(self, pin, net));

        if let Some(n) = self.nets.get_mut(net) {
            n.pins.retain(|p| *p != pin);
        }
        if let Some(p) = self.pins.get_mut(pin) {
            p.net = None;
        }
        Ok(())
    }

    /// Move an instance to a new origin
    pub fn move_instance(&mut self, instance: InstanceId, position: DbuPoint) -> Result<()> {
        let inst = self
            .instances
            .get_mut(instance)
            .ok_or_else(|| NetlistError::UnknownInstance(instance.to_string()))?;
        inst.position = position;
        self.notify(|o| o.on_post_instance_move(self, instance));
        Ok(())
    }

    /// Swap the library cell of an instance (e.g. gate sizing). The new cell
    /// must expose every pin name of the current one.
    pub fn remap_cell(&mut self, instance: InstanceId, cell: LibraryCellId) -> Result<()> {
        let inst = self.instance(instance)?;
        let previous = inst.library_cell;
        if previous == cell {
            return Ok(());
        }

        let mut remapped = Vec::with_capacity(inst.pins.len());
        for &pin in &inst.pins {
            let name = &self.pin(pin)?.name;
            let library_pin = self.library.find_pin(cell, name).ok_or_else(|| {
                NetlistError::IncompatibleRemap {
                    instance: inst.name.clone(),
                    from: self.library.cell(previous).map(|c| c.name.clone()).unwrap_or_default(),
                    to: self.library.cell(cell).map(|c| c.name.clone()).unwrap_or_default(),
                    pin: name.clone(),
                }
            })?;
            remapped.push((pin, library_pin));
        }

        for (pin, library_pin) in remapped {
            if let Some(p) = self.pins.get_mut(pin) {
                p.owner = PinOwner::Instance {
                    instance,
                    library_pin,
                };
            }
        }
        if let Some(inst) = self.instances.get_mut(instance) {
            inst.library_cell = cell;
        }
        self.notify(|o| o.on_post_cell_remap(self, instance, previous));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn net(&self, net: NetId) -> Result<&Net> {
        self.nets
            .get(net)
            .ok_or_else(|| NetlistError::UnknownNet(net.to_string()))
    }

    pub fn pin(&self, pin: PinId) -> Result<&Pin> {
        self.pins
            .get(pin)
            .ok_or_else(|| NetlistError::UnknownPin(pin.to_string()))
    }

    pub fn instance(&self, instance: InstanceId) -> Result<&Instance> {
        self.instances
            .get(instance)
            .ok_or_else(|| NetlistError::UnknownInstance(instance.to_string()))
    }

    pub fn contains_net(&self, net: NetId) -> bool {
        self.nets.contains(net)
    }

    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_names.get(name).copied()
    }

    pub fn find_instance(&self, name: &str) -> Option<InstanceId> {
        self.instance_names.get(name).copied()
    }

    pub fn find_port(&self, name: &str) -> Option<PinId> {
        self.port_names.get(name).copied()
    }

    /// Pin `name` of an instance
    pub fn find_instance_pin(&self, instance: InstanceId, name: &str) -> Option<PinId> {
        let inst = self.instances.get(instance)?;
        inst.pins
            .iter()
            .copied()
            .find(|&pin| self.pins.get(pin).is_some_and(|p| p.name == name))
    }

    /// Live nets in slot order
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> + '_ {
        self.nets.iter()
    }

    pub fn net_ids(&self) -> Vec<NetId> {
        self.nets.ids().collect()
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> + '_ {
        self.instances.iter()
    }

    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// Number of pins on a net; zero for stale handles
    pub fn num_pins(&self, net: NetId) -> usize {
        self.nets.get(net).map_or(0, Net::num_pins)
    }

    /// First driving pin of a net
    pub fn driver(&self, net: NetId) -> Option<PinId> {
        let net = self.nets.get(net)?;
        net.pins
            .iter()
            .copied()
            .find(|&pin| self.pins.get(pin).is_some_and(Pin::is_driver))
    }

    /// Absolute pin location
    pub fn pin_position(&self, pin: PinId) -> Result<DbuPoint> {
        match self.pin(pin)?.owner {
            PinOwner::Port { position } => Ok(position),
            PinOwner::Instance {
                instance,
                library_pin,
            } => {
                let origin = self.instance(instance)?.position;
                Ok(origin + self.library.pin(library_pin)?.offset)
            }
        }
    }

    /// Distinct nets attached to the pins of an instance
    pub fn instance_nets(&self, instance: InstanceId) -> Vec<NetId> {
        let Some(inst) = self.instances.get(instance) else {
            return Vec::new();
        };
        let mut nets = Vec::new();
        for pin in &inst.pins {
            if let Some(net) = self.pins.get(*pin).and_then(Pin::net) {
                if !nets.contains(&net) {
                    nets.push(net);
                }
            }
        }
        nets
    }

    /// Human readable `instance:pin` (or port) name
    pub fn pin_full_name(&self, pin: PinId) -> String {
        match self.pins.get(pin) {
            Some(p) => match p.instance().and_then(|i| self.instances.get(i)) {
                Some(inst) => format!("{}:{}", inst.name, p.name),
                None => p.name.clone(),
            },
            None => format!("<stale {}>", pin),
        }
    }
}
