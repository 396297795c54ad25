//! Library characterization against synthetic timing models

use parasol_netlist::{Library, LibraryArcId, PerEdge, PinDirection};
use parasol_timing::{
    ArcTiming, CharacterizationError, CharacterizerConfig, DelayEvaluator, LibraryCharacterizer,
    NldmDelayEvaluator, NldmTable, Result, TimingMode, TimingSense, TimingTransition,
};

/// Per-arc linear delay `intercept + slope * load`, output slew tracks the
/// input slew with a per-arc offset
struct Synthetic {
    arcs: Vec<(f64, f64)>,
}

impl DelayEvaluator for Synthetic {
    fn arc_timing(
        &self,
        arc: LibraryArcId,
        _mode: TimingMode,
        transition: TimingTransition,
        input_slew: f64,
        load: f64,
    ) -> Result<ArcTiming> {
        let (intercept, slope) = self.arcs[arc.0 as usize];
        // Rise is slightly slower than fall
        let skew = match transition {
            TimingTransition::Rise => 1.0,
            TimingTransition::Fall => 0.0,
        };
        Ok(ArcTiming {
            delay: intercept + skew + slope * load,
            slew: 0.25 * input_slew + 4.0 + skew,
        })
    }
}

struct Fixture {
    library: Library,
    inv: LibraryArcId,
    nand_a: LibraryArcId,
    xor_a: LibraryArcId,
    tie: LibraryArcId,
}

fn fixture() -> Fixture {
    let mut library = Library::new("synthetic");

    let inv = library.add_cell("INV", 1.0).unwrap();
    let a = library.add_pin(inv, "A", PinDirection::Input, 1.0).unwrap();
    library
        .set_pin_capacitance(a, PerEdge::new(1.0, 2.0))
        .unwrap();
    let y = library.add_pin(inv, "Y", PinDirection::Output, 0.0).unwrap();
    let inv_arc = library.add_arc(a, y, TimingSense::NegativeUnate).unwrap();

    let nand = library.add_cell("NAND2", 2.0).unwrap();
    let na = library.add_pin(nand, "A", PinDirection::Input, 4.0).unwrap();
    let ny = library.add_pin(nand, "Y", PinDirection::Output, 0.0).unwrap();
    let nand_arc = library.add_arc(na, ny, TimingSense::NegativeUnate).unwrap();

    let xor = library.add_cell("XOR2", 3.0).unwrap();
    let xa = library.add_pin(xor, "A", PinDirection::Input, 1.0).unwrap();
    library
        .set_pin_capacitance(xa, PerEdge::new(3.0, 5.0))
        .unwrap();
    let xy = library.add_pin(xor, "Y", PinDirection::Output, 0.0).unwrap();
    let xor_arc = library.add_arc(xa, xy, TimingSense::NonUnate).unwrap();

    // Tie cell input without capacitance
    let tie = library.add_cell("TIE", 1.0).unwrap();
    let ta = library.add_pin(tie, "A", PinDirection::Input, 0.0).unwrap();
    let ty = library.add_pin(tie, "Y", PinDirection::Output, 0.0).unwrap();
    let tie_arc = library.add_arc(ta, ty, TimingSense::PositiveUnate).unwrap();

    Fixture {
        library,
        inv: inv_arc,
        nand_a: nand_arc,
        xor_a: xor_arc,
        tie: tie_arc,
    }
}

fn evaluator() -> Synthetic {
    Synthetic {
        // (intercept, slope per unit load) in arc order
        arcs: vec![(2.0, 3.0), (4.0, 1.5), (6.0, 2.0), (2.0, 9.0)],
    }
}

#[test]
fn test_reference_arc_is_fastest_first_found() {
    let fx = fixture();
    let mut characterizer = LibraryCharacterizer::default();
    characterizer
        .run_library_analysis(&fx.library, &evaluator())
        .unwrap();

    // INV and TIE tie on zero-load delay; the first one wins
    for mode in TimingMode::ALL {
        let reference = characterizer.reference_arc(mode).unwrap();
        assert_eq!(reference.arc, fx.inv);
        assert!((reference.zero_load_delay - 2.5).abs() < 1e-12);
    }
}

#[test]
fn test_reference_slew_converges_to_fixed_point() {
    let fx = fixture();
    let mut characterizer = LibraryCharacterizer::default();
    characterizer
        .run_library_analysis(&fx.library, &evaluator())
        .unwrap();

    // s = s / 4 + 4 + skew  =>  s = (4 + skew) * 4 / 3
    let fall = characterizer
        .reference_slew(TimingMode::Late, TimingTransition::Fall)
        .unwrap();
    let rise = characterizer
        .reference_slew(TimingMode::Late, TimingTransition::Rise)
        .unwrap();
    assert!((fall - 16.0 / 3.0).abs() < 1e-4);
    assert!((rise - 20.0 / 3.0).abs() < 1e-4);
}

#[test]
fn test_sense_aware_capacitance_and_slew() {
    let fx = fixture();
    let mut characterizer = LibraryCharacterizer::default();
    characterizer
        .run_library_analysis(&fx.library, &evaluator())
        .unwrap();
    let mode = TimingMode::Early;
    let slew_fall = characterizer
        .reference_slew(mode, TimingTransition::Fall)
        .unwrap();
    let slew_rise = characterizer
        .reference_slew(mode, TimingTransition::Rise)
        .unwrap();

    // Negative unate: an output rise comes from an input fall
    let rise = characterizer
        .characterization(fx.inv, mode, TimingTransition::Rise)
        .unwrap();
    assert_eq!(rise.cin, 1.0);
    assert_eq!(rise.slew, slew_fall);
    let fall = characterizer
        .characterization(fx.inv, mode, TimingTransition::Fall)
        .unwrap();
    assert_eq!(fall.cin, 2.0);
    assert_eq!(fall.slew, slew_rise);

    // Non unate: averages of both transitions
    let xor = characterizer
        .characterization(fx.xor_a, mode, TimingTransition::Rise)
        .unwrap();
    assert_eq!(xor.cin, 4.0);
    assert!((xor.slew - (slew_fall + slew_rise) / 2.0).abs() < 1e-12);
}

#[test]
fn test_fit_and_driver_resistance() {
    let fx = fixture();
    let mut characterizer = LibraryCharacterizer::default();
    characterizer
        .run_library_analysis(&fx.library, &evaluator())
        .unwrap();
    let mode = TimingMode::Late;

    // delay = 4 + 1.5 * h * 4 on NAND2: g = 6, p = 4 (fall) / 5 (rise)
    let fall = characterizer
        .characterization(fx.nand_a, mode, TimingTransition::Fall)
        .unwrap();
    assert!((fall.g - 6.0).abs() < 1e-9);
    assert!((fall.p - 4.0).abs() < 1e-9);
    let r = characterizer
        .driver_resistance(fx.nand_a, mode, TimingTransition::Fall)
        .unwrap();
    assert!((r - 1.5).abs() < 1e-9);

    // Each arc's driver resistance is its load slope
    let inv_r = characterizer.arc_driver_resistance(fx.inv, mode).unwrap();
    assert!((inv_r - 3.0).abs() < 1e-9);

    let inv_cell = fx.library.find_cell("INV").unwrap();
    let cell_r = characterizer
        .cell_max_driver_resistance(inv_cell, mode)
        .unwrap();
    assert!((cell_r - 3.0).abs() < 1e-9);

    // The tie arc has no input capacitance and stays out of the bounds
    let tie = characterizer
        .characterization(fx.tie, mode, TimingTransition::Rise)
        .unwrap();
    assert!(!tie.valid);
    let bounds = characterizer
        .library_driver_resistance(mode)
        .unwrap()
        .unwrap();
    assert!((bounds.min - 1.5).abs() < 1e-9);
    assert!((bounds.max - 3.0).abs() < 1e-9);
}

#[test]
fn test_second_run_keeps_first_result() {
    let fx = fixture();
    let mut characterizer = LibraryCharacterizer::default();
    let first = characterizer
        .run_library_analysis(&fx.library, &evaluator())
        .unwrap()
        .clone();

    let other = Synthetic {
        arcs: vec![(1.0, 1.0); 4],
    };
    let second = characterizer
        .run_library_analysis(&fx.library, &other)
        .unwrap();
    assert_eq!(&first, second);
}

#[test]
fn test_nldm_evaluator_characterization() {
    let mut library = Library::new("nldm");
    let inv = library.add_cell("INV_X1", 1.0).unwrap();
    let a = library.add_pin(inv, "A", PinDirection::Input, 2.0).unwrap();
    let y = library.add_pin(inv, "Y", PinDirection::Output, 0.0).unwrap();
    let arc = library.add_arc(a, y, TimingSense::NegativeUnate).unwrap();

    // Linear in load across the swept range (loads 0..=64)
    let delay = NldmTable::new(
        vec![0.0, 50.0],
        vec![0.0, 64.0],
        vec![vec![10.0, 138.0], vec![10.0, 138.0]],
    );
    let slew = NldmTable::new(
        vec![0.0, 50.0],
        vec![0.0, 64.0],
        vec![vec![8.0, 40.0], vec![18.0, 50.0]],
    );
    let mut evaluator = NldmDelayEvaluator::for_library(&library);
    evaluator.set_all_tables(arc, delay, slew);

    let mut characterizer = LibraryCharacterizer::new(CharacterizerConfig::default());
    characterizer.run_library_analysis(&library, &evaluator).unwrap();

    let model = characterizer
        .characterization(arc, TimingMode::Late, TimingTransition::Rise)
        .unwrap();
    // 128 / 64 per unit load, times cin = 2
    assert!((model.g - 4.0).abs() < 1e-9);
    assert!((model.p - 10.0).abs() < 1e-9);
    assert!(characterizer
        .rms_error(arc, TimingMode::Late, TimingTransition::Rise)
        .unwrap()
        < 1e-9);
}

#[test]
fn test_missing_tables_abort_pass() {
    let fx = fixture();
    let evaluator = NldmDelayEvaluator::for_library(&fx.library);
    let mut characterizer = LibraryCharacterizer::default();
    let err = characterizer
        .run_library_analysis(&fx.library, &evaluator)
        .unwrap_err();
    match err {
        CharacterizationError::MissingTable { arc } => assert_eq!(arc, "INV:A->Y"),
        other => panic!("unexpected error: {}", other),
    }
    assert!(!characterizer.is_characterized());
}
