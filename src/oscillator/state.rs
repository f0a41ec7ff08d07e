//! Per-shape scratch state.
//!
//! Each shape family has its own struct. The whole set is reset to its
//! default whenever the shape changes, so a shape never starts from values
//! another shape left behind.

pub(crate) const NUM_FORMANTS: usize = 5;
pub(crate) const NUM_PLUCK_VOICES: usize = 3;
pub(crate) const NUM_BELL_PARTIALS: usize = 11;
pub(crate) const NUM_DRUM_PARTIALS: usize = 6;
pub(crate) const NUM_ADDITIVE_HARMONICS: usize = 12;

pub(crate) const BRIDGE_LENGTH: usize = 1024;
pub(crate) const NECK_LENGTH: usize = 4096;
pub(crate) const BORE_LENGTH: usize = 2048;
pub(crate) const JET_LENGTH: usize = 1024;
pub(crate) const FLUTE_BORE_LENGTH: usize = 4096;
pub(crate) const COMB_LENGTH: usize = 8192;
/// One extra slot per string repeats its first sample for interpolation.
pub(crate) const STRING_LENGTH: usize = 1025;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RingModState {
    pub modulator_phase: [u32; 2],
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SwarmState {
    pub phase: [u32; 6],
    pub filter_state: [i32; 2],
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ToyState {
    pub held_sample: u8,
    pub decimation_counter: u16,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ResonantFilterState {
    pub modulator_phase_increment: u32,
    pub modulator_phase: u32,
    pub square_modulator_phase: u32,
    pub integrator: i32,
    pub polarity: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VosimState {
    pub formant_phase: [u32; 2],
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VowelState {
    pub formant_increment: [u32; 3],
    pub formant_phase: [u32; 3],
    pub formant_amplitude: [u32; 3],
    pub consonant_frames: u16,
    pub noise: u16,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FofState {
    pub next_saw_sample: i32,
    pub previous_sample: i32,
    pub svf_lp: [i32; NUM_FORMANTS],
    pub svf_bp: [i32; NUM_FORMANTS],
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HarmonicsState {
    pub amplitude: [i32; NUM_ADDITIVE_HARMONICS],
}

/// Shared by the FM shapes, the comb filter and the wave line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FmState {
    pub modulator_phase: u32,
    pub previous_sample: i32,
    pub smoothed_parameter: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AdditiveState {
    pub partial_phase: [u32; NUM_BELL_PARTIALS],
    pub partial_phase_increment: [u32; NUM_BELL_PARTIALS],
    pub partial_amplitude: [i32; NUM_BELL_PARTIALS],
    pub target_partial_amplitude: [i32; NUM_BELL_PARTIALS],
    pub lp_noise: [i32; 3],
    pub current_partial: usize,
    pub previous_sample: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KickState {
    pub lp_state: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CymbalState {
    pub rng_state: u32,
    pub phase: [u32; 6],
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PluckState {
    pub shift: u32,
    pub size: usize,
    pub mask: usize,
    pub write_ptr: usize,
    pub initialization_ptr: usize,
    pub phase: u32,
    pub phase_increment: u32,
    pub max_phase_increment: u32,
    pub previous_sample: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PhysicalModelState {
    pub delay_ptr: usize,
    pub excitation_ptr: usize,
    pub lp_state: i32,
    pub filter_state: [i32; 2],
    pub previous_sample: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoiseFilterState {
    pub lp: i32,
    pub bp: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ClockedNoiseState {
    pub cycle_phase: u32,
    pub cycle_phase_increment: u32,
    pub seed: u32,
    pub rng_state: u32,
    pub sample: i16,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Grain {
    pub phase: u32,
    pub phase_increment: u32,
    pub envelope_phase: u32,
    pub envelope_phase_increment: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ResonatorState {
    pub filter_state: [[i32; 2]; 3],
    pub filter_scale: [i32; 3],
    pub filter_coefficient: [i32; 3],
    pub amplitude: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ModemState {
    pub symbol_phase: u32,
    pub symbol_count: u16,
    pub filter_state: i32,
    pub data_byte: u8,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MorseState {
    pub tone: bool,
    pub dit_counter: u32,
    pub remaining_dits: u32,
    /// Index of the current 2-bit symbol, -1 before the message starts.
    pub symbol: i32,
    pub noise_walk: i32,
}

impl Default for MorseState {
    fn default() -> Self {
        Self {
            tone: false,
            dit_counter: 0,
            remaining_dits: 10,
            symbol: -1,
            noise_walk: 32767,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct State {
    pub ring: RingModState,
    pub swarm: SwarmState,
    pub toy: ToyState,
    pub filter: ResonantFilterState,
    pub vosim: VosimState,
    pub vowel: VowelState,
    pub fof: FofState,
    pub harmonics: HarmonicsState,
    pub fm: FmState,
    pub additive: AdditiveState,
    pub kick: KickState,
    pub cymbal: CymbalState,
    pub pluck: [PluckState; NUM_PLUCK_VOICES],
    pub physical: PhysicalModelState,
    pub noise_filter: NoiseFilterState,
    pub clocked: ClockedNoiseState,
    pub grains: [Grain; 4],
    pub resonators: ResonatorState,
    pub modem: ModemState,
    pub morse: MorseState,
}

/// Delay memory for the comb filter and the physical models, allocated once.
#[derive(Debug, Clone)]
pub(crate) struct DelayLines {
    pub comb: Box<[i16]>,
    pub strings: Box<[i16]>,
    pub bridge: Box<[i8]>,
    pub neck: Box<[i8]>,
    pub bore: Box<[i16]>,
    pub flute_bore: Box<[i8]>,
    pub jet: Box<[i8]>,
}

impl DelayLines {
    pub fn new() -> Self {
        Self {
            comb: vec![0; COMB_LENGTH].into_boxed_slice(),
            strings: vec![0; STRING_LENGTH * NUM_PLUCK_VOICES].into_boxed_slice(),
            bridge: vec![0; BRIDGE_LENGTH].into_boxed_slice(),
            neck: vec![0; NECK_LENGTH].into_boxed_slice(),
            bore: vec![0; BORE_LENGTH].into_boxed_slice(),
            flute_bore: vec![0; FLUTE_BORE_LENGTH].into_boxed_slice(),
            jet: vec![0; JET_LENGTH].into_boxed_slice(),
        }
    }

    pub fn clear(&mut self) {
        self.comb.fill(0);
        self.strings.fill(0);
        self.bridge.fill(0);
        self.neck.fill(0);
        self.bore.fill(0);
        self.flute_bore.fill(0);
        self.jet.fill(0);
    }
}
