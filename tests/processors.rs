use eurodsp::processors::gate::{Control, GateDetector};
use eurodsp::processors::{ProcessorFunction, Processors};
use eurodsp::BLOCK_SIZE;

/// Run a channel against a square-wave gate, polling like a control thread
/// would between samples.
fn run(processors: &mut Processors, samples: usize, period: usize) -> Vec<i16> {
    let mut gate = GateDetector::new();
    (0..samples)
        .map(|n| {
            processors.buffer();
            assert!(processors.pending() <= 2 * BLOCK_SIZE);
            processors.process(gate.process(n % period < period / 2))
        })
        .collect()
}

fn channel(function: ProcessorFunction) -> Processors {
    let mut processors = Processors::new();
    processors.set_function(function);
    processors.set_parameters(&[32768, 24000, 40000, 16384]);
    processors
}

#[test]
fn every_function_runs_from_a_clock() {
    for function in ProcessorFunction::ALL {
        let mut processors = channel(function);
        let out = run(&mut processors, 9600, 2400);
        assert_eq!(out.len(), 9600, "{}", function.name());
    }
}

#[test]
fn sound_sources_respond_to_the_gate() {
    for function in [
        ProcessorFunction::BassDrum,
        ProcessorFunction::SnareDrum,
        ProcessorFunction::MultistageEnvelope,
        ProcessorFunction::Lfo,
    ] {
        let mut processors = channel(function);
        let out = run(&mut processors, 9600, 2400);
        assert!(out.iter().any(|&s| s != 0), "{}", function.name());
    }
}

#[test]
fn output_is_reproducible() {
    for function in ProcessorFunction::ALL {
        let a = run(&mut channel(function), 4800, 1200);
        let b = run(&mut channel(function), 4800, 1200);
        assert_eq!(a, b, "{}", function.name());
    }
}

#[test]
fn drums_stay_silent_without_a_trigger() {
    let mut processors = channel(ProcessorFunction::BassDrum);
    for _ in 0..2000 {
        assert_eq!(processors.process(Control::NONE), 0);
    }
}

#[test]
fn buffered_functions_lag_by_about_two_blocks() {
    let mut processors = channel(ProcessorFunction::MultistageEnvelope);
    processors.set_parameters(&[0, 0, 65535, 0]);
    let mut gate = GateDetector::new();
    let mut first_sound = None;
    for n in 0..200 {
        processors.buffer();
        if processors.process(gate.process(true)) != 0 && first_sound.is_none() {
            first_sound = Some(n);
        }
    }
    let latency = first_sound.unwrap_or(usize::MAX);
    assert!(
        (BLOCK_SIZE..=2 * BLOCK_SIZE + 8).contains(&latency),
        "latency {latency}"
    );
}
