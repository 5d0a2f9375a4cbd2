//! Math backend and small numeric helpers shared by every primitive.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Fixed-point helpers that reproduce unsigned wraparound exactly
//!
//! Features used by this file:
//! - `fast-math` : polynomial sine for coefficient computation
//! - `micromath` / `no-std` : alternative float backends
//!
//! Conventions:
//! - Nothing here allocates or panics; out-of-domain input clamps or wraps.
//! - Argument and return domains are documented per function.

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // micromath preferred if explicitly requested (works in no_std)
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_sqrt(x: f32) -> f32 { x.sqrt() }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { 2.0_f32.powf(x) }
        #[inline] pub(crate) fn m_log2(x: f32) -> f32 { x.log2() }
        #[inline] pub(crate) fn m_round(x: f32) -> f32 { x.round() }
    // libm (C math) in no_std
    } else if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] pub(crate) fn m_sqrt(x: f32) -> f32 { libm::sqrtf(x) }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { libm::exp2f(x) }
        #[inline] pub(crate) fn m_log2(x: f32) -> f32 { libm::log2f(x) }
        #[inline] pub(crate) fn m_round(x: f32) -> f32 { libm::roundf(x) }
    // std backend
    } else {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_sqrt(x: f32) -> f32 { x.sqrt() }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { x.exp2() }
        #[inline] pub(crate) fn m_log2(x: f32) -> f32 { x.log2() }
        #[inline] pub(crate) fn m_round(x: f32) -> f32 { x.round() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f32 = 2.0 * PI;

/// Full scale of the 16-bit oscillator phase accumulator.
pub const PHASE16_SCALE: f32 = 65_536.0;

/// Full scale of the 24-bit LFO phase accumulator.
pub const PHASE24_SCALE: f32 = 16_777_216.0;

/// Mask applied to keep a 24-bit accumulator in range.
pub const PHASE24_MASK: u32 = 0x00FF_FFFF;

// --------------------------------- Utilities -------------------------------------

/// Clamp `x` into `[lo, hi]`. NaN passes through unchanged.
#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    num_traits::clamp(x, lo, hi)
}

/// Round to nearest, ties away from zero (backend independent).
#[inline]
pub fn round(x: f32) -> f32 {
    m_round(x)
}

/// Truncate toward zero and saturate into the signed 16-bit domain.
///
/// Float-to-int `as` casts already saturate in Rust; the explicit clamp keeps
/// the contract visible at call sites that model 16-bit accumulators.
#[inline]
pub fn saturate_i16(x: f32) -> i16 {
    num_traits::clamp(x, -32_768.0, 32_767.0) as i16
}

/// Fixed-point phase increment: `round(freq * scale / sample_rate)`, wrapped by `mask`.
///
/// `scale` is the accumulator's full range (2^16 or 2^24). Frequencies above the
/// sample rate wrap instead of failing, which reproduces the aliasing of a real
/// accumulator. Negative or NaN frequencies give an increment of 0.
#[inline]
pub fn phase_increment(freq: f32, sample_rate: u32, scale: f32, mask: u32) -> u32 {
    let sr = sample_rate.max(1) as f32;
    let inc = m_round(freq * scale / sr);
    // `as` saturates: negative/NaN -> 0, huge -> u32::MAX (then masked)
    (inc as u32) & mask
}

/// Frequency ratio for `semitones` of equal-tempered transposition.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    m_exp2(semitones / 12.0)
}

// --------------------------------- Fast trig -------------------------------------

/// Fast sine with range reduction into [-π, π] and 5th-order minimax-style poly.
/// Max abs error ~1e-3 for musical uses when `fast-math` is enabled; falls back to exact otherwise.
#[inline]
pub fn fast_sin(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            let mut xr = x;
            let k = m_round(xr / TAU);
            xr -= k * TAU;

            // 5th-order odd polynomial: sin(x) ≈ x * (a + b x^2 + c x^4)
            let x2 = xr * xr;
            xr * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        } else {
            m_sin(x)
        }
    }
}

/// Square root through the selected backend. Negative input yields NaN.
#[inline]
pub fn sqrt(x: f32) -> f32 {
    m_sqrt(x)
}

// --------------------------------- Nonlinearities --------------------------------

/// Rational tanh approximation used by the ladder filter:
///
/// `tanh(x) ≈ x * (27 + x^2) / (27 + 9 x^2)` on [-3, 3], ±1 outside.
///
/// At ±3 the rational form evaluates to exactly ±1, so the clamp is continuous.
#[inline]
pub fn rational_tanh(x: f32) -> f32 {
    if x < -3.0 {
        return -1.0;
    }
    if x > 3.0 {
        return 1.0;
    }
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

// --------------------------------- Tests (std only) ------------------------------
