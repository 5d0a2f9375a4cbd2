//! Low-frequency oscillator for vibrato, tremolo and parameter sweeps.
//!
//! Same phase-accumulator technique as [`Oscillator`](crate::oscillator::Oscillator),
//! but with a 24-bit phase so sub-Hz rates still get a usable increment:
//! at 44.1 kHz the smallest non-zero rate is ~0.0026 Hz instead of ~0.67 Hz.
//!
//! Every output is scaled by `depth` (0..=255) with truncating `>> 8`
//! arithmetic; the slight downward bias is part of the output contract.
//!
//! Audio-rate settings are accepted and simply behave like an undersampled
//! oscillator.

use crate::dsp::{phase_increment, PHASE24_MASK, PHASE24_SCALE};
use crate::oscillator::Waveform;

/// Default LFO pulse width: 25% duty.
pub const DEFAULT_PULSE_WIDTH: u8 = 64;

#[derive(Copy, Clone, Debug)]
pub struct Lfo {
    sample_rate: u32,
    rate: f32,
    depth: u8,
    phase: u32,
    phase_inc: u32,
    waveform: Waveform,
    pulse_width: u8,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl Lfo {
    /// 1 Hz sine at roughly half depth (127).
    pub fn new(sample_rate: u32) -> Self {
        let mut s = Self {
            sample_rate: sample_rate.max(1),
            rate: 1.0,
            depth: 127,
            phase: 0,
            phase_inc: 0,
            waveform: Waveform::Sine,
            pulse_width: DEFAULT_PULSE_WIDTH,
        };
        s.set_rate(s.rate);
        s
    }

    /// Rate in Hz (typically 0.1 - 20).
    #[inline]
    pub fn set_rate(&mut self, hz: f32) {
        self.rate = hz;
        self.phase_inc = phase_increment(hz, self.sample_rate, PHASE24_SCALE, PHASE24_MASK);
    }

    #[inline] pub fn set_depth(&mut self, depth: u8) { self.depth = depth; }
    #[inline] pub fn set_waveform(&mut self, waveform: Waveform) { self.waveform = waveform; }
    #[inline] pub fn set_pulse_width(&mut self, width: u8) { self.pulse_width = width; }

    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.set_rate(self.rate);
    }

    /// Unscaled waveform value at the current phase; advances the phase.
    #[inline]
    fn step_raw(&mut self) -> u8 {
        // top 8 bits of the 24-bit phase
        let index = (self.phase >> 16) as u8;
        let sample = self.waveform.shape(index, self.pulse_width);
        self.phase = (self.phase + self.phase_inc) & PHASE24_MASK;
        sample
    }

    #[inline]
    fn scale(&self, raw: u8) -> u8 {
        ((u16::from(raw) * u16::from(self.depth)) >> 8) as u8
    }

    /// Unipolar output `sample * depth / 256` (truncating), 0..=254.
    #[inline]
    pub fn next_sample(&mut self) -> u8 {
        let raw = self.step_raw();
        self.scale(raw)
    }

    /// Unipolar output shifted down by half the depth.
    #[inline]
    pub fn next_sample_bipolar(&mut self) -> i8 {
        let half = i16::from(self.depth >> 1);
        (i16::from(self.next_sample()) - half) as i8
    }

    /// Bipolar float in -1.0..1.0, scaled by `depth / 255`.
    #[inline]
    pub fn next_sample_float(&mut self) -> f32 {
        let centred = f32::from(i16::from(self.step_raw()) - 128);
        centred / 128.0 * (f32::from(self.depth) / 255.0)
    }

    /// Vibrato: `base * (1 + lfo * max_deviation)`, where `lfo` is
    /// [`next_sample_float`](Self::next_sample_float).
    #[inline]
    pub fn modulate_frequency(&mut self, base: f32, max_deviation: f32) -> f32 {
        let m = self.next_sample_float() * max_deviation;
        base * (1.0 + m)
    }

    /// Tremolo: depth-weighted crossfade between `base` and `base * lfo`.
    ///
    /// `mod = 255 - ((255 - lfo) * depth) >> 8`, `out = (base * mod) >> 8`.
    /// At depth 0 the LFO has no effect beyond the `>> 8` truncation; at
    /// depth 255 the amplitude sweeps from ~0 to ~`base`.
    #[inline]
    pub fn modulate_amplitude(&mut self, base: u8) -> u8 {
        let lfo = u16::from(self.step_raw());
        let amount = 255 - (((255 - lfo) * u16::from(self.depth)) >> 8);
        ((u16::from(base) * amount) >> 8) as u8
    }

    /// Zero the phase.
    #[inline]
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    /// Zero the phase so the LFO restarts in lockstep with a note event.
    #[inline]
    pub fn sync(&mut self) {
        self.reset();
    }

    #[inline] pub fn rate(&self) -> f32 { self.rate }
    #[inline] pub fn depth(&self) -> u8 { self.depth }
    #[inline] pub fn waveform(&self) -> Waveform { self.waveform }
    #[inline] pub fn phase(&self) -> u32 { self.phase }
    #[inline] pub fn phase_increment(&self) -> u32 { self.phase_inc }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_scaling_truncates() {
        let mut lfo = Lfo::new(44_100);
        lfo.set_waveform(Waveform::Square);
        lfo.set_depth(255);
        // 255 * 255 >> 8 = 254, not 255
        assert_eq!(lfo.next_sample(), 254);

        lfo.reset();
        lfo.set_depth(3);
        // 255 * 3 = 765 >> 8 = 2
        assert_eq!(lfo.next_sample(), 2);

        lfo.reset();
        lfo.set_depth(0);
        assert_eq!(lfo.next_sample(), 0);
    }

    #[test]
    fn phase_wraps_at_24_bits() {
        let mut lfo = Lfo::new(1000);
        lfo.set_rate(250.0); // quarter cycle per tick
        assert_eq!(lfo.phase_increment(), 1 << 22);
        for _ in 0..4 {
            lfo.next_sample();
        }
        assert_eq!(lfo.phase(), 0);
        for _ in 0..3 {
            lfo.next_sample();
            assert!(lfo.phase() <= PHASE24_MASK);
        }
    }

    #[test]
    fn sub_hz_rate_has_nonzero_increment() {
        let lfo = {
            let mut l = Lfo::new(44_100);
            l.set_rate(0.05);
            l
        };
        assert!(lfo.phase_increment() > 0);
    }

    #[test]
    fn bipolar_subtracts_half_depth() {
        let mut lfo = Lfo::new(44_100);
        lfo.set_waveform(Waveform::Sine);
        lfo.set_depth(200);
        // sine(0) = 128 -> 128 * 200 >> 8 = 100, minus 100
        assert_eq!(lfo.next_sample_bipolar(), 0);
    }

    #[test]
    fn float_output_range() {
        let mut lfo = Lfo::new(1000);
        lfo.set_rate(10.0);
        lfo.set_depth(255);
        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        for _ in 0..1000 {
            let v = lfo.next_sample_float();
            lo = lo.min(v);
            hi = hi.max(v);
        }
        assert!(lo >= -1.0 && hi <= 1.0, "lo={lo} hi={hi}");
        assert!(lo < -0.9 && hi > 0.9, "lo={lo} hi={hi}");
    }

    #[test]
    fn zero_depth_leaves_frequency_alone() {
        let mut lfo = Lfo::new(44_100);
        lfo.set_depth(0);
        for _ in 0..100 {
            assert_eq!(lfo.modulate_frequency(440.0, 0.05), 440.0);
        }
    }

    #[test]
    fn vibrato_stays_within_deviation() {
        let mut lfo = Lfo::new(1000);
        lfo.set_rate(5.0);
        lfo.set_depth(255);
        for _ in 0..1000 {
            let f = lfo.modulate_frequency(440.0, 0.02);
            assert!((f - 440.0).abs() <= 440.0 * 0.02 + 1e-3, "f={f}");
        }
    }

    #[test]
    fn tremolo_depth_zero_and_full() {
        let mut lfo = Lfo::new(44_100);
        lfo.set_waveform(Waveform::Square);
        lfo.set_depth(0);
        // mod = 255 -> 200 * 255 >> 8 = 199
        assert_eq!(lfo.modulate_amplitude(200), 199);

        // second half of the square is 0: full depth pulls the amplitude down
        let mut lfo = Lfo::new(2);
        lfo.set_waveform(Waveform::Square);
        lfo.set_rate(1.0); // half cycle per tick
        lfo.set_depth(255);
        let high = lfo.modulate_amplitude(200);
        let low = lfo.modulate_amplitude(200);
        assert_eq!(high, 199);
        assert_eq!(low, 0);
    }

    #[test]
    fn sync_restarts_cycle() {
        let mut lfo = Lfo::new(1000);
        lfo.set_rate(3.0);
        let first = lfo.next_sample();
        for _ in 0..37 {
            lfo.next_sample();
        }
        lfo.sync();
        assert_eq!(lfo.phase(), 0);
        assert_eq!(lfo.next_sample(), first);
    }
}
