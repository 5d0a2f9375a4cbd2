#![cfg_attr(not(feature = "std"), no_std)]
//! tinysynth core — fixed-point 8-bit synthesis primitives, no_std-ready.
//!
//! Features
//! - `std`       : (default) use the Rust standard library
//! - `no-std`    : build with `#![no_std]` and use `libm` for float math
//! - `micromath` : use `micromath` as the float backend instead
//! - `fast-math` : polynomial sine for filter coefficients
//!
//! Modules
//! - [`dsp`]        : math backend, fixed-point increment, rational tanh
//! - [`wavetable`]  : 256-entry 8-bit sine table
//! - [`oscillator`] : 16-bit phase-accumulator oscillator, [`Waveform`](oscillator::Waveform)
//! - [`lfo`]        : 24-bit phase-accumulator LFO with depth scaling
//! - [`envelopes`]  : ADSR state machine with a 16-bit level
//! - [`filters`]    : one-pole, state-variable, ladder, DC blocker
//! - [`midi`]       : compressed note table, pitch bend, detune, note names
//!
//! Design
//! - No heap allocations; every primitive advances one sample per call
//! - Every setter clamps, saturates or wraps: nothing returns an error
//! - Components share no mutable state; lookup tables are read-only `const`s
//! - Not internally synchronised: confine each instance to one producer thread

pub mod dsp;
pub mod envelopes;
pub mod filters;
pub mod lfo;
pub mod midi;
pub mod oscillator;
pub mod wavetable;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::envelopes::{Adsr, EnvelopeState};
    pub use crate::filters::{DcBlocker, MoogFilter, OnePoleFilter, StateVariableFilter, SvfMode, SvfOutputs};
    pub use crate::lfo::Lfo;
    pub use crate::midi::{
        apply_pitch_bend, detune_by_cents, frequency_to_midi_note, midi_note_to_frequency, notes, NoteLabel,
    };
    pub use crate::oscillator::{Oscillator, Waveform};
}
