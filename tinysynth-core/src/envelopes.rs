//! ADSR envelope generator with a 16-bit internal level.
//!
//! Stage durations are given in milliseconds and converted once per setter
//! call into a per-tick step:
//!
//! `rate = 65535 / max(1, ms * sample_rate / 1000)`, `ms == 0` => 65535.
//!
//! The level lives in `0..=65535`; only its top 8 bits leave the envelope.
//! Each `next_sample()` advances exactly one tick. `note_on` / `note_off`
//! are the only other way the stage can change.
//!
//! Retriggering with `note_on` while a note is sounding keeps the current
//! level and restarts the attack from there (soft retrigger, no click).

use core::fmt;

const LEVEL_MAX: u16 = u16::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EnvelopeState {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

impl EnvelopeState {
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            EnvelopeState::Idle => "Idle",
            EnvelopeState::Attack => "Attack",
            EnvelopeState::Decay => "Decay",
            EnvelopeState::Sustain => "Sustain",
            EnvelopeState::Release => "Release",
        }
    }
}

impl fmt::Display for EnvelopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-tick step for a segment of `ms` milliseconds.
///
/// Never returns 0: segments longer than 65535 ticks move one step per tick.
#[inline]
pub fn rate_for_ms(ms: u16, sample_rate: u32) -> u16 {
    if ms == 0 {
        return LEVEL_MAX;
    }
    let ticks = (u64::from(ms) * u64::from(sample_rate) / 1000).max(1);
    // ticks >= 1, so the quotient is <= 65535
    ((u64::from(LEVEL_MAX) / ticks) as u16).max(1)
}

/// Linear ADSR producing an 8-bit amplitude multiplier per tick.
#[derive(Copy, Clone, Debug)]
pub struct Adsr {
    sample_rate: u32,
    state: EnvelopeState,
    level: u16,

    attack_ms: u16,
    decay_ms: u16,
    sustain: u8,
    release_ms: u16,

    // cached per-tick steps
    attack_rate: u16,
    decay_rate: u16,
    release_rate: u16,
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl Adsr {
    /// 10 ms attack, 50 ms decay, sustain 180/255, 100 ms release.
    pub fn new(sample_rate: u32) -> Self {
        let mut s = Self {
            sample_rate: sample_rate.max(1),
            state: EnvelopeState::Idle,
            level: 0,
            attack_ms: 10,
            decay_ms: 50,
            sustain: 180,
            release_ms: 100,
            attack_rate: 0,
            decay_rate: 0,
            release_rate: 0,
        };
        s.recalc_rates();
        s
    }

    #[inline]
    fn recalc_rates(&mut self) {
        self.attack_rate = rate_for_ms(self.attack_ms, self.sample_rate);
        self.decay_rate = rate_for_ms(self.decay_ms, self.sample_rate);
        self.release_rate = rate_for_ms(self.release_ms, self.sample_rate);
    }

    #[inline]
    pub fn set_attack(&mut self, ms: u16) {
        self.attack_ms = ms;
        self.attack_rate = rate_for_ms(ms, self.sample_rate);
    }

    #[inline]
    pub fn set_decay(&mut self, ms: u16) {
        self.decay_ms = ms;
        self.decay_rate = rate_for_ms(ms, self.sample_rate);
    }

    /// Sustain floor, 0..=255 (compared against the level as `sustain << 8`).
    #[inline]
    pub fn set_sustain(&mut self, level: u8) {
        self.sustain = level;
    }

    #[inline]
    pub fn set_release(&mut self, ms: u16) {
        self.release_ms = ms;
        self.release_rate = rate_for_ms(ms, self.sample_rate);
    }

    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.recalc_rates();
    }

    /// Start (or soft-retrigger) the attack stage. The level is not reset.
    #[inline]
    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    /// Enter release from any sounding stage. Ignored while idle.
    #[inline]
    pub fn note_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
        }
    }

    /// Advance one tick and return the top 8 bits of the level.
    #[inline]
    pub fn next_sample(&mut self) -> u8 {
        match self.state {
            EnvelopeState::Idle => {
                self.level = 0;
            }
            EnvelopeState::Attack => {
                let next = u32::from(self.level) + u32::from(self.attack_rate);
                if next >= u32::from(LEVEL_MAX) {
                    self.level = LEVEL_MAX;
                    self.state = EnvelopeState::Decay;
                } else {
                    self.level = next as u16;
                }
            }
            EnvelopeState::Decay => {
                let floor = u16::from(self.sustain) << 8;
                if u32::from(self.level) > u32::from(floor) + u32::from(self.decay_rate) {
                    self.level -= self.decay_rate;
                } else {
                    self.level = floor;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => {}
            EnvelopeState::Release => {
                if self.level > self.release_rate {
                    self.level -= self.release_rate;
                } else {
                    self.level = 0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        (self.level >> 8) as u8
    }

    /// Advance once and scale an unsigned sample by the envelope: `(s * env) >> 8`.
    #[inline]
    pub fn apply(&mut self, sample: u8) -> u8 {
        let env = u16::from(self.next_sample());
        ((u16::from(sample) * env) >> 8) as u8
    }

    /// Advance once and scale a signed sample by the envelope (arithmetic shift).
    #[inline]
    pub fn apply_signed(&mut self, sample: i8) -> i8 {
        let env = i16::from(self.next_sample());
        ((i16::from(sample) * env) >> 8) as i8
    }

    /// Back to idle with a zero level.
    #[inline]
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0;
    }

    #[inline] pub fn state(&self) -> EnvelopeState { self.state }
    /// Top 8 bits of the internal level.
    #[inline] pub fn level(&self) -> u8 { (self.level >> 8) as u8 }
    /// Full 16-bit internal level.
    #[inline] pub fn level16(&self) -> u16 { self.level }
    #[inline] pub fn is_active(&self) -> bool { self.state != EnvelopeState::Idle }

    #[inline] pub fn attack_ms(&self) -> u16 { self.attack_ms }
    #[inline] pub fn decay_ms(&self) -> u16 { self.decay_ms }
    #[inline] pub fn sustain(&self) -> u8 { self.sustain }
    #[inline] pub fn release_ms(&self) -> u16 { self.release_ms }

    #[inline] pub fn attack_rate(&self) -> u16 { self.attack_rate }
    #[inline] pub fn decay_rate(&self) -> u16 { self.decay_rate }
    #[inline] pub fn release_rate(&self) -> u16 { self.release_rate }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_until(env: &mut Adsr, state: EnvelopeState, limit: usize) -> usize {
        for n in 1..=limit {
            env.next_sample();
            if env.state() == state {
                return n;
            }
        }
        panic!("never reached {state} within {limit} ticks");
    }

    #[test]
    fn rates_from_milliseconds() {
        // 10 ms at 44.1 kHz = 441 ticks -> 65535 / 441 = 148
        assert_eq!(rate_for_ms(10, 44_100), 148);
        assert_eq!(rate_for_ms(0, 44_100), 65_535);
        // 0.02 ticks rounds to 0, clamped to one tick
        assert_eq!(rate_for_ms(1, 20), 65_535);
        // 5 s at 48 kHz is far more than 65535 ticks
        assert_eq!(rate_for_ms(5000, 48_000), 1);
    }

    #[test]
    fn attack_saturates_then_decays_to_sustain() {
        let mut env = Adsr::new(44_100);
        env.set_attack(5);
        env.set_decay(20);
        env.set_sustain(100);
        env.note_on();

        let mut prev_state = env.state();
        let mut peak_seen = false;
        for _ in 0..100_000 {
            env.next_sample();
            if prev_state == EnvelopeState::Attack && env.state() == EnvelopeState::Decay {
                assert_eq!(env.level16(), 65_535);
                peak_seen = true;
                break;
            }
            prev_state = env.state();
        }
        assert!(peak_seen);

        let mut last = env.level16();
        while env.state() == EnvelopeState::Decay {
            env.next_sample();
            assert!(env.level16() <= last);
            last = env.level16();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level16(), 100 << 8);

        for _ in 0..10_000 {
            env.next_sample();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 100);
    }

    #[test]
    fn release_takes_ceil_level_over_rate_ticks() {
        let mut env = Adsr::new(44_100);
        env.set_attack(0);
        env.set_decay(0);
        env.set_sustain(180);
        env.set_release(100);
        env.note_on();
        tick_until(&mut env, EnvelopeState::Sustain, 10);

        let level = u32::from(env.level16());
        let rate = u32::from(env.release_rate());
        let expected = level.div_ceil(rate) as usize;

        env.note_off();
        let ticks = tick_until(&mut env, EnvelopeState::Idle, 1_000_000);
        assert_eq!(ticks, expected);
        assert_eq!(env.level16(), 0);
    }

    #[test]
    fn zero_attack_reaches_peak_in_one_tick() {
        let mut env = Adsr::new(44_100);
        env.set_attack(0);
        env.note_on();
        assert_eq!(env.next_sample(), 255);
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn retrigger_keeps_level() {
        let mut env = Adsr::new(44_100);
        env.note_on();
        for _ in 0..200 {
            env.next_sample();
        }
        let before = env.level16();
        env.note_off();
        env.next_sample();
        env.note_on();
        assert_eq!(env.state(), EnvelopeState::Attack);
        assert!(env.level16() > 0 && env.level16() < before);
    }

    #[test]
    fn note_off_when_idle_is_ignored() {
        let mut env = Adsr::new(44_100);
        env.note_off();
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0);
    }

    #[test]
    fn apply_advances_once() {
        let mut env = Adsr::new(44_100);
        env.set_attack(0);
        env.note_on();
        // peak after one tick: 200 * 255 >> 8
        assert_eq!(env.apply(200), 199);
        assert_eq!(env.state(), EnvelopeState::Decay);

        let mut env = Adsr::new(44_100);
        env.set_attack(0);
        env.note_on();
        assert_eq!(env.apply_signed(-100), -100);
    }

    #[test]
    fn reset_goes_idle() {
        let mut env = Adsr::new(44_100);
        env.note_on();
        env.next_sample();
        env.reset();
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.level16(), 0);
    }
}
