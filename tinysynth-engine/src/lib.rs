//! tinysynth engine: voices, note scenes and the sample-clock boundary.
//!
//! Crate layout:
//! - [`graph`]  : `Generator` trait and `Engine<G>` wrapper
//! - [`voice`]  : one monophonic voice (oscillator, LFO, ADSR, filter, DC blocker)
//! - [`scenes`] : note patterns stepped at a tempo, implementing `Generator`
//! - [`output`] : sample sinks, PWM timer arithmetic and the sample clock
//!
//! The engine avoids heap allocations in the per-sample path. Voices and
//! scenes are plain structs; everything runs off one tick per output sample.

pub mod graph;
pub mod output;
pub mod scenes;
pub mod voice;

pub use graph::{Engine, Generator, DEFAULT_SAMPLE_RATE};
pub use output::{u8_to_f32, u8_to_i16, CallbackSink, PwmTimer, SampleClock, SampleSink};
pub use scenes::{Scene, StepOrder, REST};
pub use voice::{FilterKind, LfoTarget, Voice};
