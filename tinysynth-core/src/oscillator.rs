//! Phase-accumulator tone generator with five 8-bit waveforms.
//!
//! The phase is a 16-bit unsigned accumulator; its top 8 bits select the
//! position inside one cycle. Each call to [`Oscillator::next_sample`] shapes the
//! current index and then advances the phase by a fixed increment with natural
//! `u16` wraparound.
//!
//! `increment = round(frequency * 65536 / sample_rate)`
//!
//! No band-limiting is attempted: frequencies above Nyquist alias, exactly as
//! an 8-bit accumulator running on a microcontroller would.

use core::fmt;

use crate::dsp::{phase_increment, PHASE16_SCALE};
use crate::wavetable;

/// Waveform selector shared by oscillators and LFOs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Pulse,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
        Waveform::Pulse,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Sawtooth => "Sawtooth",
            Waveform::Triangle => "Triangle",
            Waveform::Pulse => "Pulse",
        }
    }

    /// Unsigned 8-bit value of this waveform at phase `index` (0..=255).
    ///
    /// `pulse_width` is only read by [`Waveform::Pulse`]: output is high while
    /// `index < pulse_width`.
    #[inline]
    pub fn shape(self, index: u8, pulse_width: u8) -> u8 {
        match self {
            Waveform::Sine => wavetable::sine(index),
            Waveform::Square => square(index),
            Waveform::Sawtooth => index,
            Waveform::Triangle => triangle(index),
            Waveform::Pulse => pulse(index, pulse_width),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn square(index: u8) -> u8 {
    if index < 128 { 255 } else { 0 }
}

#[inline]
fn triangle(index: u8) -> u8 {
    // 0, 2, .. 254 up; 255, 253, .. 1 down
    if index < 128 {
        index * 2
    } else {
        255 - (index - 128) * 2
    }
}

#[inline]
fn pulse(index: u8, width: u8) -> u8 {
    if index < width { 255 } else { 0 }
}

/// 16-bit phase-accumulator oscillator producing unsigned 8-bit samples.
#[derive(Copy, Clone, Debug)]
pub struct Oscillator {
    sample_rate: u32,
    frequency: f32,
    phase: u16,
    phase_inc: u16,
    waveform: Waveform,
    pulse_width: u8,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl Oscillator {
    /// A 440 Hz sine at `sample_rate` with a 50% pulse width.
    pub fn new(sample_rate: u32) -> Self {
        let mut s = Self {
            sample_rate: sample_rate.max(1),
            frequency: 440.0,
            phase: 0,
            phase_inc: 0,
            waveform: Waveform::Sine,
            pulse_width: 128,
        };
        s.set_frequency(s.frequency);
        s
    }

    /// Store `freq` (Hz) and recompute the phase increment. No validation.
    #[inline]
    pub fn set_frequency(&mut self, freq: f32) {
        self.frequency = freq;
        // mask keeps the low 16 bits, so the truncation is exact
        #[allow(clippy::cast_possible_truncation)]
        {
            self.phase_inc = phase_increment(freq, self.sample_rate, PHASE16_SCALE, 0xFFFF) as u16;
        }
    }

    #[inline]
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    #[inline]
    pub fn set_pulse_width(&mut self, width: u8) {
        self.pulse_width = width;
    }

    /// Change the sample rate and recompute the increment for the stored frequency.
    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.set_frequency(self.frequency);
    }

    /// Shape the current phase, then advance it. Returns 0..=255.
    #[inline]
    pub fn next_sample(&mut self) -> u8 {
        let index = (self.phase >> 8) as u8;
        let sample = self.waveform.shape(index, self.pulse_width);
        self.phase = self.phase.wrapping_add(self.phase_inc);
        sample
    }

    /// Same as [`next_sample`](Self::next_sample), recentred to -128..=127.
    #[inline]
    pub fn next_sample_signed(&mut self) -> i8 {
        (i16::from(self.next_sample()) - 128) as i8
    }

    /// Zero the phase. Frequency and waveform are kept.
    #[inline]
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    #[inline] pub fn frequency(&self) -> f32 { self.frequency }
    #[inline] pub fn waveform(&self) -> Waveform { self.waveform }
    #[inline] pub fn pulse_width(&self) -> u8 { self.pulse_width }
    #[inline] pub fn phase(&self) -> u16 { self.phase }
    #[inline] pub fn phase_increment(&self) -> u16 { self.phase_inc }
    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }
}

// ------------------------------------ Tests --------------------------------------
