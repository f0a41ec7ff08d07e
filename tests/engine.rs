use eurodsp::engine::{Calibration, EditMode, Engine, Function, Settings};
use eurodsp::processors::ProcessorFunction;
use eurodsp::voices::ControlMode;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scratch(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("eurodsp-it-{}-{name}", std::process::id()))
}

fn drums() -> Engine {
    let mut engine = Engine::with_settings(&Settings {
        function: [Function::DrumGenerator; 2],
        ..Settings::default()
    });
    for index in 0..4 {
        engine.set_pot(index, 32768).unwrap();
    }
    engine
}

#[test]
fn twin_mode_feeds_both_channels() {
    let mut engine = Engine::new();
    for (index, value) in [(0, 1000), (1, 20000), (2, 40000), (3, 65535)] {
        engine.set_pot(index, value).unwrap();
    }
    assert_eq!(
        engine.processors(0).parameters(),
        engine.processors(1).parameters()
    );
    assert_eq!(engine.processors(1).parameters()[3], 65535);
}

#[test]
fn gates_only_fire_their_own_channel() {
    let mut engine = drums();
    assert_eq!(engine.processors(0).function(), ProcessorFunction::BassDrum);
    let mut moved = false;
    for n in 0..4800 {
        engine.poll();
        let gate = if n < 100 { 0b01 } else { 0 };
        let [kick, snare] = engine.tick(gate, 0);
        moved |= kick != 32767;
        assert_eq!(snare, 32767);
    }
    assert!(moved);
}

#[test]
fn split_mode_halves_the_knobs() {
    let mut engine = Engine::new();
    engine.set_pot(0, 11111).unwrap();
    engine.set_pot(2, 22222).unwrap();
    engine.press_mode_button(false);
    assert_eq!(engine.edit_mode(), EditMode::Split);
    assert_eq!(engine.processors(0).control_mode(), ControlMode::Half);
    // Entering split copies knobs 1-2 to the first channel and 3-4 to the
    // second.
    assert_eq!(engine.processors(0).parameters()[0], 11111);
    assert_eq!(engine.processors(1).parameters()[0], 22222);
}

#[test]
fn settings_survive_a_restart() {
    init_logging();
    let path = scratch("engine-settings.json");
    let mut engine = Engine::new();
    engine.press_mode_button(true);
    engine.set_pot(0, 0x4000).unwrap();
    engine.press_mode_button(false);
    engine.press_function_button(false);
    engine.set_pot(1, 0x8000).unwrap();
    engine.settings().save(&path).unwrap();

    let restored = Engine::with_settings(&Settings::load(&path).unwrap());
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored.settings(), engine.settings());
    assert_eq!(restored.edit_mode(), EditMode::Second);
    assert_eq!(restored.function(), Function::Lfo);
    assert_eq!(restored.processors(0).parameters()[0], 0x4000);
    assert_eq!(restored.processors(1).parameters()[1], 0x8000);
    assert_eq!(restored.processors(1).function(), ProcessorFunction::Lfo);
    assert_eq!(
        restored.processors(0).function(),
        ProcessorFunction::MultistageEnvelope
    );
}

#[test]
fn calibration_trims_the_dac_codes() {
    init_logging();
    let path = scratch("engine-calibration.json");
    Calibration {
        dac_offset: [250, -250],
    }
    .save(&path)
    .unwrap();
    let mut engine = Engine::new();
    engine.set_calibration(Calibration::load(&path).unwrap());
    std::fs::remove_file(&path).unwrap();

    engine.tick(0, 0);
    assert_eq!(engine.dac_codes(), [32767 + 250, 32767 - 250]);
}

#[test]
fn drum_brightness_follows_the_hit() {
    let mut engine = drums();
    assert_eq!(engine.brightness(0), 0);
    let mut brightest = 0;
    for n in 0..2400 {
        engine.poll();
        engine.tick(u8::from(n < 10), 0);
        brightest = brightest.max(engine.brightness(0));
    }
    assert!(brightest > 16, "brightest {brightest}");
}
