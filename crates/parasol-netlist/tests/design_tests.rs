//! Structural edits and change notification on a small design

use parasol_netlist::{
    DbuPoint, Design, DesignObserver, InstanceId, Library, LibraryCellId, NetId, NetlistError,
    PinDirection, PinId, TimingSense,
};
use std::sync::{Arc, Mutex};

fn library() -> Library {
    let mut lib = Library::new("cells");
    for (name, offset) in [("INV_X1", 1), ("INV_X2", 3)] {
        let cell = lib.add_cell(name, offset as f64).unwrap();
        let a = lib.add_pin(cell, "A", PinDirection::Input, 1.0).unwrap();
        let y = lib.add_pin(cell, "Y", PinDirection::Output, 0.0).unwrap();
        lib.set_pin_offset(y, DbuPoint::new(offset, 0)).unwrap();
        lib.add_arc(a, y, TimingSense::NegativeUnate).unwrap();
    }
    let nand = lib.add_cell("NAND2", 2.0).unwrap();
    let a = lib.add_pin(nand, "A", PinDirection::Input, 1.0).unwrap();
    let b = lib.add_pin(nand, "B", PinDirection::Input, 1.0).unwrap();
    let zn = lib.add_pin(nand, "ZN", PinDirection::Output, 0.0).unwrap();
    lib.add_arc(a, zn, TimingSense::NegativeUnate).unwrap();
    lib.add_arc(b, zn, TimingSense::NegativeUnate).unwrap();
    lib
}

#[derive(Default)]
struct Log(Mutex<Vec<String>>);

impl Log {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl DesignObserver for Log {
    fn on_post_net_create(&self, design: &Design, net: NetId) {
        self.push(format!("create {}", design.net(net).unwrap().name));
    }

    fn on_pre_net_remove(&self, design: &Design, net: NetId) {
        self.push(format!("remove {}", design.net(net).unwrap().name));
    }

    fn on_post_instance_move(&self, design: &Design, instance: InstanceId) {
        let inst = design.instance(instance).unwrap();
        self.push(format!("move {} {}", inst.name, inst.position));
    }

    fn on_post_cell_remap(&self, design: &Design, instance: InstanceId, previous: LibraryCellId) {
        let inst = design.instance(instance).unwrap();
        let lib = design.library();
        self.push(format!(
            "remap {} {} -> {}",
            inst.name,
            lib.cell(previous).unwrap().name,
            lib.cell(inst.library_cell).unwrap().name
        ));
    }

    fn on_post_pin_connect(&self, design: &Design, pin: PinId, net: NetId) {
        self.push(format!(
            "connect {} {}",
            design.pin_full_name(pin),
            design.net(net).unwrap().name
        ));
    }

    fn on_pre_pin_disconnect(&self, design: &Design, pin: PinId, net: NetId) {
        self.push(format!(
            "disconnect {} {}",
            design.pin_full_name(pin),
            design.net(net).unwrap().name
        ));
    }
}

#[test]
fn test_edit_sequence_notifications() {
    let mut design = Design::new("top", library());
    let log = Arc::new(Log::default());
    let handle = design.register_observer(log.clone());

    let x1 = design.library().find_cell("INV_X1").unwrap();
    let x2 = design.library().find_cell("INV_X2").unwrap();
    let u1 = design.create_instance("u1", x1, DbuPoint::new(0, 0)).unwrap();
    let n1 = design.create_net("n1").unwrap();
    let n2 = design.create_net("n2").unwrap();
    let y = design.find_instance_pin(u1, "Y").unwrap();
    design.connect(y, n1).unwrap();
    design.connect(y, n2).unwrap();
    design.move_instance(u1, DbuPoint::new(5, 5)).unwrap();
    design.remap_cell(u1, x2).unwrap();
    design.remove_net(n2).unwrap();

    assert_eq!(
        log.take(),
        vec![
            "create n1",
            "create n2",
            "connect u1:Y n1",
            "disconnect u1:Y n1",
            "connect u1:Y n2",
            "move u1 (5, 5)",
            "remap u1 INV_X1 -> INV_X2",
            "remove n2",
        ]
    );

    assert!(design.unregister_observer(handle));
    design.create_net("n3").unwrap();
    assert!(log.take().is_empty());
}

#[test]
fn test_remap_moves_pin_positions() {
    let mut design = Design::new("top", library());
    let x1 = design.library().find_cell("INV_X1").unwrap();
    let x2 = design.library().find_cell("INV_X2").unwrap();
    let u1 = design.create_instance("u1", x1, DbuPoint::new(10, 20)).unwrap();
    let y = design.find_instance_pin(u1, "Y").unwrap();

    assert_eq!(design.pin_position(y).unwrap(), DbuPoint::new(11, 20));
    design.remap_cell(u1, x2).unwrap();
    assert_eq!(design.pin_position(y).unwrap(), DbuPoint::new(13, 20));
    assert_eq!(design.find_instance_pin(u1, "Y"), Some(y));
}

#[test]
fn test_incompatible_remap_is_rejected() {
    let mut design = Design::new("top", library());
    let x1 = design.library().find_cell("INV_X1").unwrap();
    let nand = design.library().find_cell("NAND2").unwrap();
    let u1 = design.create_instance("u1", x1, DbuPoint::new(0, 0)).unwrap();

    let err = design.remap_cell(u1, nand).unwrap_err();
    assert!(matches!(err, NetlistError::IncompatibleRemap { ref pin, .. } if pin == "Y"));
    assert_eq!(design.instance(u1).unwrap().library_cell, x1);
}

#[test]
fn test_stale_net_handle_after_reuse() {
    let mut design = Design::new("top", library());
    let old = design.create_net("old").unwrap();
    design.remove_net(old).unwrap();
    let new = design.create_net("new").unwrap();

    assert_ne!(old, new);
    assert!(design.net(old).is_err());
    assert_eq!(design.num_pins(old), 0);

    let port = design
        .create_port("in", PinDirection::Input, DbuPoint::new(0, 0))
        .unwrap();
    assert!(matches!(
        design.connect(port, old),
        Err(NetlistError::UnknownNet(_))
    ));
    design.connect(port, new).unwrap();
    assert_eq!(design.driver(new), Some(port));
}
