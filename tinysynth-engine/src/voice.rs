//! A monophonic voice: oscillator → envelope → LFO routing → filter → 8-bit out.
//!
//! Per tick:
//! 1. pitch = table frequency of the held note, pitch-bent and detuned
//! 2. LFO vibrato (if routed) modulates the pitch multiplicatively
//! 3. the oscillator sample is recentred and scaled by the ADSR
//! 4. LFO tremolo (if routed) scales the amplitude
//! 5. the signal runs through the selected filter (16-bit signed domain)
//! 6. optional DC blocker, then back to unsigned 8-bit for the PWM stage
//!
//! Everything is `Copy`; no locks, no heap.

use tinysynth_core::envelopes::Adsr;
use tinysynth_core::filters::{DcBlocker, MoogFilter, OnePoleFilter, StateVariableFilter, SvfMode};
use tinysynth_core::lfo::Lfo;
use tinysynth_core::midi::{apply_pitch_bend, detune_by_cents, midi_note_to_frequency, PITCH_BEND_CENTER};
use tinysynth_core::oscillator::{Oscillator, Waveform};

use crate::graph::Generator;

/// Which filter the voice runs its signal through.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Bypass,
    OnePole,
    StateVariable(SvfMode),
    Moog,
}

/// Where the LFO output goes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LfoTarget {
    Off,
    /// Pitch: `f * (1 + lfo * max_deviation)`.
    Vibrato { max_deviation: f32 },
    /// Amplitude, depth-weighted.
    Tremolo,
    /// Filter cutoff swept by ±`span_hz` around the configured cutoff.
    Cutoff { span_hz: f32 },
}

#[derive(Copy, Clone, Debug)]
pub struct Voice {
    sample_rate: u32,

    osc: Oscillator,
    env: Adsr,
    lfo: Lfo,
    lfo_target: LfoTarget,

    filter: FilterKind,
    cutoff_hz: f32,
    one_pole: OnePoleFilter,
    svf: StateVariableFilter,
    moog: MoogFilter,
    dc: Option<DcBlocker>,

    note: u8,
    bend: u16,
    bend_range: f32,
    detune_cents: i16,
    // pitch before LFO; recomputed only on note/bend/detune changes
    pitch_hz: f32,
    pitch_dirty: bool,
}

impl Voice {
    /// Sine voice, default envelope, no LFO, no filter.
    pub fn new(sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        Self {
            sample_rate,
            osc: Oscillator::new(sample_rate),
            env: Adsr::new(sample_rate),
            lfo: Lfo::new(sample_rate),
            lfo_target: LfoTarget::Off,
            filter: FilterKind::Bypass,
            cutoff_hz: 1000.0,
            one_pole: OnePoleFilter::new(),
            svf: StateVariableFilter::new(sample_rate),
            moog: MoogFilter::new(sample_rate),
            dc: None,
            note: 69,
            bend: PITCH_BEND_CENTER,
            bend_range: 2.0,
            detune_cents: 0,
            pitch_hz: midi_note_to_frequency(69),
            pitch_dirty: true,
        }
    }

    // ------------------------------------ presets ------------------------------------

    /// Sawtooth through a resonant SVF low-pass with 5 Hz vibrato.
    pub fn lead(sample_rate: u32) -> Self {
        let mut v = Self::new(sample_rate);
        v.osc.set_waveform(Waveform::Sawtooth);
        v.set_envelope(15, 120, 170, 180);
        v.set_filter(FilterKind::StateVariable(SvfMode::LowPass));
        v.set_cutoff(1_800.0);
        v.set_resonance(0.6);
        v.lfo.set_rate(5.0);
        v.lfo.set_depth(180);
        v.lfo_target = LfoTarget::Vibrato { max_deviation: 0.01 };
        v
    }

    /// Square into the ladder filter, short and punchy.
    pub fn bass(sample_rate: u32) -> Self {
        let mut v = Self::new(sample_rate);
        v.osc.set_waveform(Waveform::Square);
        v.set_envelope(2, 180, 120, 60);
        v.set_filter(FilterKind::Moog);
        v.set_cutoff(600.0);
        v.set_resonance(0.5);
        v.dc = Some(DcBlocker::default());
        v
    }

    /// Slow triangle pad with tremolo and one-pole smoothing.
    pub fn pad(sample_rate: u32) -> Self {
        let mut v = Self::new(sample_rate);
        v.osc.set_waveform(Waveform::Triangle);
        v.set_envelope(400, 300, 200, 800);
        v.set_filter(FilterKind::OnePole);
        v.one_pole.set_coefficient(160);
        v.lfo.set_rate(4.0);
        v.lfo.set_depth(120);
        v.lfo_target = LfoTarget::Tremolo;
        v
    }

    /// Narrow pulse with an instant attack and no sustain; cutoff swept by the LFO.
    pub fn pluck(sample_rate: u32) -> Self {
        let mut v = Self::new(sample_rate);
        v.osc.set_waveform(Waveform::Pulse);
        v.osc.set_pulse_width(64);
        v.set_envelope(0, 150, 0, 40);
        v.set_filter(FilterKind::StateVariable(SvfMode::LowPass));
        v.set_cutoff(2_500.0);
        v.set_resonance(0.3);
        v.lfo.set_rate(0.5);
        v.lfo.set_depth(255);
        v.lfo_target = LfoTarget::Cutoff { span_hz: 1_500.0 };
        v
    }

    // ------------------------------------ control ------------------------------------

    /// Start `note` (0..=127). Retriggers softly if a note is already sounding.
    pub fn note_on(&mut self, note: u8) {
        self.note = note;
        self.pitch_dirty = true;
        if !self.env.is_active() {
            // free-running while sounding; realigned on a fresh note
            self.lfo.sync();
        }
        self.env.note_on();
    }

    pub fn note_off(&mut self) {
        self.env.note_off();
    }

    /// 14-bit pitch bend, centre 8192.
    pub fn pitch_bend(&mut self, value: u16) {
        self.bend = value;
        self.pitch_dirty = true;
    }

    pub fn set_bend_range(&mut self, semitones: f32) {
        self.bend_range = semitones;
        self.pitch_dirty = true;
    }

    pub fn set_detune(&mut self, cents: i16) {
        self.detune_cents = cents;
        self.pitch_dirty = true;
    }

    pub fn set_envelope(&mut self, attack_ms: u16, decay_ms: u16, sustain: u8, release_ms: u16) {
        self.env.set_attack(attack_ms);
        self.env.set_decay(decay_ms);
        self.env.set_sustain(sustain);
        self.env.set_release(release_ms);
    }

    /// Select the filter; the stored cutoff carries over to it.
    pub fn set_filter(&mut self, kind: FilterKind) {
        self.filter = kind;
        self.apply_cutoff(self.cutoff_hz);
    }

    /// Cutoff in Hz for the SVF and ladder; for the one-pole it maps to a
    /// ratio of the sample rate.
    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff_hz = hz;
        self.apply_cutoff(hz);
    }

    fn apply_cutoff(&mut self, hz: f32) {
        match self.filter {
            FilterKind::Bypass => {}
            FilterKind::OnePole => self.one_pole.set_cutoff(hz / self.sample_rate as f32),
            FilterKind::StateVariable(_) => self.svf.set_cutoff(hz),
            FilterKind::Moog => self.moog.set_cutoff(hz),
        }
    }

    pub fn set_resonance(&mut self, res: f32) {
        self.svf.set_resonance(res);
        self.moog.set_resonance(res);
    }

    /// Reroute the LFO. Pitch and cutoff drop back to their unmodulated values.
    pub fn set_lfo_target(&mut self, target: LfoTarget) {
        self.lfo_target = target;
        self.pitch_dirty = true;
        self.apply_cutoff(self.cutoff_hz);
    }

    pub fn set_dc_blocker(&mut self, enabled: bool) {
        self.dc = enabled.then(DcBlocker::default);
    }

    #[inline] pub fn oscillator_mut(&mut self) -> &mut Oscillator { &mut self.osc }
    #[inline] pub fn envelope_mut(&mut self) -> &mut Adsr { &mut self.env }
    #[inline] pub fn lfo_mut(&mut self) -> &mut Lfo { &mut self.lfo }

    #[inline] pub fn envelope(&self) -> &Adsr { &self.env }
    #[inline] pub fn note(&self) -> u8 { self.note }
    #[inline] pub fn filter(&self) -> FilterKind { self.filter }
    #[inline] pub fn is_active(&self) -> bool { self.env.is_active() }

    /// Pitch in Hz before LFO modulation.
    #[inline]
    pub fn pitch_hz(&mut self) -> f32 {
        self.refresh_pitch();
        self.pitch_hz
    }

    #[inline]
    fn refresh_pitch(&mut self) {
        if self.pitch_dirty {
            let f = midi_note_to_frequency(self.note);
            let f = apply_pitch_bend(f, self.bend, self.bend_range);
            self.pitch_hz = detune_by_cents(f, self.detune_cents);
            self.osc.set_frequency(self.pitch_hz);
            self.pitch_dirty = false;
        }
    }

    #[inline]
    fn filter_sample(&mut self, x: i16) -> i16 {
        match self.filter {
            FilterKind::Bypass => x,
            FilterKind::OnePole => i16::from(self.one_pole.process_signed((x >> 8) as i8)) << 8,
            FilterKind::StateVariable(mode) => self.svf.process_mode(x, mode),
            FilterKind::Moog => self.moog.process(x),
        }
    }
}

impl Generator for Voice {
    fn reset(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.osc.set_sample_rate(self.sample_rate);
        self.env.set_sample_rate(self.sample_rate);
        self.lfo.set_sample_rate(self.sample_rate);
        self.svf.set_sample_rate(self.sample_rate);
        self.moog.set_sample_rate(self.sample_rate);
        self.apply_cutoff(self.cutoff_hz);
        self.svf.reset();
        self.moog.reset();
        self.one_pole.reset();
        if let Some(dc) = self.dc.as_mut() {
            dc.reset();
        }
        self.pitch_dirty = true;
    }

    #[inline]
    fn next(&mut self) -> u8 {
        self.refresh_pitch();

        match self.lfo_target {
            LfoTarget::Vibrato { max_deviation } => {
                let f = self.lfo.modulate_frequency(self.pitch_hz, max_deviation);
                self.osc.set_frequency(f);
            }
            LfoTarget::Cutoff { span_hz } => {
                let hz = self.cutoff_hz + self.lfo.next_sample_float() * span_hz;
                self.apply_cutoff(hz);
            }
            LfoTarget::Off | LfoTarget::Tremolo => {}
        }

        let raw = self.osc.next_sample_signed();
        let mut s = self.env.apply_signed(raw);

        if self.lfo_target == LfoTarget::Tremolo {
            let amp = i16::from(self.lfo.modulate_amplitude(255));
            s = ((i16::from(s) * amp) >> 8) as i8;
        }

        let mut y = self.filter_sample(i16::from(s) << 8);
        if let Some(dc) = self.dc.as_mut() {
            y = dc.process(y);
        }
        ((y >> 8) + 128) as u8
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tinysynth_core::envelopes::EnvelopeState;

    const SR: u32 = 22_050;

    #[test]
    fn idle_voice_is_silent() {
        let mut v = Voice::new(SR);
        for _ in 0..1000 {
            assert_eq!(v.next(), 128);
        }
    }

    #[test]
    fn note_on_sets_table_pitch() {
        let mut v = Voice::new(SR);
        v.note_on(69);
        assert!((v.pitch_hz() - 440.0).abs() < 0.5);
        v.pitch_bend(16_383);
        assert!(v.pitch_hz() > 490.0);
        v.pitch_bend(PITCH_BEND_CENTER);
        v.set_detune(1200);
        assert!((v.pitch_hz() - 880.0).abs() < 0.5);
    }

    #[test]
    fn note_produces_signal_and_release_returns_to_silence() {
        let mut v = Voice::new(SR);
        v.note_on(57);
        let mut peak = 0i32;
        for _ in 0..(SR as usize / 10) {
            let s = i32::from(v.next()) - 128;
            peak = peak.max(s.abs());
        }
        assert!(peak > 60, "peak={peak}");

        v.note_off();
        for _ in 0..(SR as usize) {
            v.next();
        }
        assert_eq!(v.envelope().state(), EnvelopeState::Idle);
        assert_eq!(v.next(), 128);
    }

    #[test]
    fn presets_render_in_range() {
        for mut v in [Voice::lead(SR), Voice::bass(SR), Voice::pad(SR), Voice::pluck(SR)] {
            v.note_on(48);
            let mut moved = false;
            for _ in 0..(SR as usize / 4) {
                if v.next() != 128 {
                    moved = true;
                }
            }
            assert!(moved, "preset {:?} stayed silent", v.filter());
            v.note_off();
        }
    }

    #[test]
    fn cutoff_carries_over_to_newly_selected_filter() {
        let mut v = Voice::new(SR);
        v.set_cutoff(300.0);
        v.set_filter(FilterKind::Moog);
        assert_eq!(v.moog.cutoff(), 300.0);
        v.set_filter(FilterKind::StateVariable(SvfMode::BandPass));
        assert_eq!(v.svf.cutoff(), 300.0);
    }

    #[test]
    fn retargeting_lfo_restores_pitch_and_cutoff() {
        let mut v = Voice::lead(SR);
        v.note_on(69);
        for _ in 0..1_500 {
            v.next();
        }
        v.set_lfo_target(LfoTarget::Off);
        v.next();
        assert_eq!(v.oscillator_mut().frequency(), v.pitch_hz());

        let mut p = Voice::pluck(SR);
        p.note_on(60);
        for _ in 0..5_000 {
            p.next();
        }
        assert_ne!(p.svf.cutoff(), 2_500.0);
        p.set_lfo_target(LfoTarget::Tremolo);
        assert_eq!(p.svf.cutoff(), 2_500.0);
    }

    #[test]
    fn reset_propagates_sample_rate() {
        let mut v = Voice::lead(SR);
        v.reset(44_100);
        v.note_on(69);
        v.next();
        assert_eq!(v.oscillator_mut().sample_rate(), 44_100);
    }
}
