//! Filters: 8-bit one-pole smoother, state-variable, ladder, DC blocker.
//!
//! Goals
//! - `no_std`-friendly, allocation free
//! - One sample in, one sample out; no block latency
//! - Coefficients recomputed only when a parameter changes
//!
//! Contents
//! - `OnePoleFilter`       : integer one-pole low-pass on 8-bit samples
//! - `StateVariableFilter` : Chamberlin SVF with LP/BP/HP/notch taps on 16-bit samples
//! - `MoogFilter`          : four cascaded one-poles with rational-tanh saturation
//! - `DcBlocker`           : `y[n] = x[n] - x[n-1] + R y[n-1]`
//!
//! Notes
//! - Resonance clamps (0.99 for the SVF, 1.0 for the ladder) sit right at the
//!   edge of self-oscillation. Ringing at those settings is expected output.
//! - The ladder pole `p = fc * (1.8 - 0.8 fc)` is an empirical tuning curve,
//!   not a bilinear match of an analog prototype. Keep it as is: reference
//!   renders depend on it.

use crate::dsp::{clamp, fast_sin, rational_tanh, saturate_i16, sqrt};
use core::f32::consts::PI;

// ------------------------------------ One-pole -----------------------------------

/// Integer one-pole low-pass.
///
/// `y = (x * (256 - c) + y_prev * c) >> 8`
///
/// `c = 0` passes the input through; `c = 255` smooths the most.
#[derive(Copy, Clone, Debug)]
pub struct OnePoleFilter {
    coefficient: u8,
    last: u8,
    last_signed: i8,
}

impl Default for OnePoleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl OnePoleFilter {
    #[inline]
    pub fn new() -> Self {
        Self { coefficient: 128, last: 0, last_signed: 0 }
    }

    #[inline] pub fn set_coefficient(&mut self, c: u8) { self.coefficient = c; }
    #[inline] pub fn coefficient(&self) -> u8 { self.coefficient }

    /// Cutoff as a ratio of the sample rate, 0.0..1.0.
    ///
    /// `c = (1 - ratio) * 255`; `ratio >= 1` passes through, `ratio <= 0` smooths fully.
    #[inline]
    pub fn set_cutoff(&mut self, ratio: f32) {
        self.coefficient = if ratio >= 1.0 {
            0
        } else if ratio <= 0.0 {
            255
        } else {
            ((1.0 - ratio) * 255.0) as u8
        };
    }

    #[inline]
    pub fn process(&mut self, input: u8) -> u8 {
        let c = u16::from(self.coefficient);
        let acc = u16::from(input) * (256 - c) + u16::from(self.last) * c;
        self.last = (acc >> 8) as u8;
        self.last
    }

    #[inline]
    pub fn process_signed(&mut self, input: i8) -> i8 {
        let c = i16::from(self.coefficient);
        let acc = i16::from(input) * (256 - c) + i16::from(self.last_signed) * c;
        self.last_signed = (acc >> 8) as i8;
        self.last_signed
    }

    #[inline]
    pub fn reset(&mut self) {
        self.last = 0;
        self.last_signed = 0;
    }
}

// --------------------------------- State variable --------------------------------

/// SVF output tap selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SvfMode {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

/// All four SVF taps after one sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SvfOutputs {
    pub low: i16,
    pub band: i16,
    pub high: i16,
    pub notch: i16,
}

/// Chamberlin state-variable filter on signed 16-bit samples.
///
/// Per sample:
/// ```text
/// low  += f * band
/// high  = scale * input - low - q * band
/// band += f * high
/// ```
/// each accumulator saturating to the `i16` range after its update, with
/// `f = 2 sin(π fc / sr)`, `q = 2 - 2 res`, `scale = sqrt(q)`.
#[derive(Copy, Clone, Debug)]
pub struct StateVariableFilter {
    sample_rate: u32,
    cutoff: f32,
    resonance: f32,
    // derived
    f: f32,
    q: f32,
    scale: f32,
    // states
    low: i16,
    band: i16,
    high: i16,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl StateVariableFilter {
    /// 1 kHz cutoff, resonance 0.5.
    pub fn new(sample_rate: u32) -> Self {
        let mut s = Self {
            sample_rate: sample_rate.max(1),
            cutoff: 1000.0,
            resonance: 0.5,
            f: 0.0,
            q: 0.0,
            scale: 0.0,
            low: 0,
            band: 0,
            high: 0,
        };
        s.recalc();
        s
    }

    #[inline]
    fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Cutoff in Hz, clamped to [20, sr/2]. NaN maps to 20 Hz.
    #[inline]
    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = clamp(or_floor(hz, 20.0), 20.0, self.nyquist().max(20.0));
        self.recalc();
    }

    /// Resonance in [0, 0.99]; the upper clamp keeps `q` above zero.
    #[inline]
    pub fn set_resonance(&mut self, res: f32) {
        self.resonance = clamp(or_floor(res, 0.0), 0.0, 0.99);
        self.recalc();
    }

    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.recalc();
    }

    #[inline]
    fn recalc(&mut self) {
        self.f = 2.0 * fast_sin(PI * self.cutoff / self.sample_rate as f32);
        self.q = 2.0 - 2.0 * self.resonance;
        self.scale = sqrt(self.q);
    }

    /// Run one sample through the filter and return every tap.
    #[inline]
    pub fn process(&mut self, input: i16) -> SvfOutputs {
        self.low = saturate_i16(f32::from(self.low) + self.f * f32::from(self.band));
        self.high = saturate_i16(
            self.scale * f32::from(input) - f32::from(self.low) - self.q * f32::from(self.band),
        );
        self.band = saturate_i16(f32::from(self.band) + self.f * f32::from(self.high));
        self.outputs()
    }

    /// Run one sample and return only the requested tap.
    #[inline]
    pub fn process_mode(&mut self, input: i16, mode: SvfMode) -> i16 {
        let out = self.process(input);
        match mode {
            SvfMode::LowPass => out.low,
            SvfMode::HighPass => out.high,
            SvfMode::BandPass => out.band,
            SvfMode::Notch => out.notch,
        }
    }

    #[inline]
    fn outputs(&self) -> SvfOutputs {
        SvfOutputs {
            low: self.low,
            band: self.band,
            high: self.high,
            notch: self.notch(),
        }
    }

    #[inline] pub fn low_pass(&self) -> i16 { self.low }
    #[inline] pub fn high_pass(&self) -> i16 { self.high }
    #[inline] pub fn band_pass(&self) -> i16 { self.band }

    /// Band-reject: `low + high`, saturating.
    #[inline]
    pub fn notch(&self) -> i16 {
        self.low.saturating_add(self.high)
    }

    #[inline] pub fn low_pass8(&self) -> u8 { to_u8(self.low) }
    #[inline] pub fn high_pass8(&self) -> u8 { to_u8(self.high) }
    #[inline] pub fn band_pass8(&self) -> u8 { to_u8(self.band) }

    #[inline]
    pub fn reset(&mut self) {
        self.low = 0;
        self.band = 0;
        self.high = 0;
    }

    #[inline] pub fn cutoff(&self) -> f32 { self.cutoff }
    #[inline] pub fn resonance(&self) -> f32 { self.resonance }

    /// Derived `(f, q, scale)`.
    #[inline]
    pub(crate) fn coefficients(&self) -> (f32, f32, f32) {
        (self.f, self.q, self.scale)
    }
}

/// NaN parameters fall to the bottom of their range; clamp alone lets NaN through.
#[inline]
fn or_floor(x: f32, floor: f32) -> f32 {
    if x.is_nan() { floor } else { x }
}

/// `(x >> 8) + 128`, always within 0..=255.
#[inline]
fn to_u8(x: i16) -> u8 {
    ((x >> 8) + 128) as u8
}

// ------------------------------------- Ladder ------------------------------------

/// Four-pole ladder low-pass (24 dB/oct) with resonance feedback.
///
/// Input and output are signed 16-bit. Internally the signal is normalised to
/// roughly ±1 and each stage is soft-saturated with [`rational_tanh`].
#[derive(Copy, Clone, Debug)]
pub struct MoogFilter {
    sample_rate: u32,
    cutoff: f32,
    resonance: f32,
    p: f32,
    stage: [f32; 4],
}

impl Default for MoogFilter {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl MoogFilter {
    /// 1 kHz cutoff, no resonance.
    pub fn new(sample_rate: u32) -> Self {
        let mut s = Self {
            sample_rate: sample_rate.max(1),
            cutoff: 1000.0,
            resonance: 0.0,
            p: 0.0,
            stage: [0.0; 4],
        };
        s.recalc();
        s
    }

    /// Cutoff in Hz, clamped to [20, sr/2.5].
    #[inline]
    pub fn set_cutoff(&mut self, hz: f32) {
        let hi = (self.sample_rate as f32 / 2.5).max(20.0);
        self.cutoff = clamp(or_floor(hz, 20.0), 20.0, hi);
        self.recalc();
    }

    /// Resonance in [0, 1]. Near 1.0 the ladder self-oscillates.
    #[inline]
    pub fn set_resonance(&mut self, res: f32) {
        self.resonance = clamp(or_floor(res, 0.0), 0.0, 1.0);
        self.recalc();
    }

    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.recalc();
    }

    #[inline]
    fn recalc(&mut self) {
        let fc = self.cutoff / self.sample_rate as f32;
        // empirical tuning curve
        self.p = fc * (1.8 - 0.8 * fc);
    }

    #[inline]
    pub fn process(&mut self, input: i16) -> i16 {
        let mut x = f32::from(input) / 32_768.0;

        // ladder feedback
        x -= self.resonance * self.stage[3];

        let p = self.p;
        let s = &mut self.stage;
        s[0] += p * (rational_tanh(x) - rational_tanh(s[0]));
        s[1] += p * (rational_tanh(s[0]) - rational_tanh(s[1]));
        s[2] += p * (rational_tanh(s[1]) - rational_tanh(s[2]));
        s[3] += p * (rational_tanh(s[2]) - rational_tanh(s[3]));

        saturate_i16(s[3] * 32_767.0)
    }

    /// 8-bit unsigned convenience wrapper around [`process`](Self::process).
    #[inline]
    pub fn process8(&mut self, input: u8) -> u8 {
        let x = (i16::from(input) - 128) << 8;
        to_u8(self.process(x))
    }

    #[inline]
    pub fn reset(&mut self) {
        self.stage = [0.0; 4];
    }

    #[inline] pub fn cutoff(&self) -> f32 { self.cutoff }
    #[inline] pub fn resonance(&self) -> f32 { self.resonance }
    /// Pole coefficient currently in use.
    #[inline] pub fn pole(&self) -> f32 { self.p }
}

// ----------------------------------- DC blocker ----------------------------------

/// Default DC blocker pole radius.
pub const DC_BLOCKER_R: f32 = 0.995;

/// Single-pole high-pass: `y[n] = x[n] - x[n-1] + R y[n-1]`.
#[derive(Copy, Clone, Debug)]
pub struct DcBlocker {
    r: f32,
    x1: f32,
    y1: f32,
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new(DC_BLOCKER_R)
    }
}

impl DcBlocker {
    #[inline]
    pub fn new(r: f32) -> Self {
        Self { r, x1: 0.0, y1: 0.0 }
    }

    #[inline] pub fn set_coefficient(&mut self, r: f32) { self.r = r; }
    #[inline] pub fn coefficient(&self) -> f32 { self.r }

    #[inline]
    pub fn process(&mut self, input: i16) -> i16 {
        let x = f32::from(input);
        let y = x - self.x1 + self.r * self.y1;
        self.x1 = x;
        self.y1 = y;
        saturate_i16(y)
    }

    #[inline]
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

// ------------------------------------ Tests --------------------------------------
