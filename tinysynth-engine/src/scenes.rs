//! Note-pattern scenes that implement the tick-driven [`Generator`](crate::graph::Generator) trait.
//!
//! A scene owns one [`Voice`] and steps through a fixed note pattern at a
//! tempo, opening the gate (`note_on`) at the start of every step and closing
//! it (`note_off`) after the gate fraction. Keep scenes allocation-free:
//! patterns are `&'static [u8]`.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tinysynth_core::midi::notes;

use crate::graph::Generator;
use crate::voice::Voice;

/// Pattern entry meaning "no note this step".
pub const REST: u8 = u8::MAX;

pub const ARP_MINOR: &[u8] = &[notes::A3, notes::C4, notes::E4, notes::A4, notes::E4, notes::C4];
pub const BASSLINE: &[u8] = &[36, 36, REST, 48, 36, REST, 43, 46];
pub const DRONE: &[u8] = &[notes::A3];

/// How the scene walks through its pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOrder {
    Forward,
    PingPong,
    /// Uniformly random step each time, from a seeded RNG.
    Random,
}

#[derive(Clone, Debug)]
pub struct Scene {
    voice: Voice,
    pattern: &'static [u8],
    order: StepOrder,
    rng: StdRng,

    sample_rate: u32,
    steps_per_minute: f32,
    gate: f32,
    samples_per_step: u32,
    gate_samples: u32,

    counter: u32,
    step: usize,
    forward: bool,
    current: Option<u8>,
}

impl Scene {
    /// `steps_per_minute` is clamped to [1, 6000]; `gate` (fraction of a step the
    /// note is held) to [0, 1]. An empty pattern plays rests.
    pub fn new(voice: Voice, pattern: &'static [u8], steps_per_minute: f32, gate: f32, sample_rate: u32) -> Self {
        let mut s = Self {
            voice,
            pattern,
            order: StepOrder::Forward,
            rng: StdRng::seed_from_u64(0),
            sample_rate: sample_rate.max(1),
            steps_per_minute: steps_per_minute.clamp(1.0, 6000.0),
            gate: gate.clamp(0.0, 1.0),
            samples_per_step: 1,
            gate_samples: 0,
            counter: 0,
            step: 0,
            forward: true,
            current: None,
        };
        s.recalc_timing();
        debug!(
            "scene: {} steps at {} steps/min, {} samples/step",
            pattern.len(),
            s.steps_per_minute,
            s.samples_per_step
        );
        s
    }

    /// Minor arpeggio on the lead voice, sixteenth notes at 120 BPM.
    pub fn arpeggio(sample_rate: u32) -> Self {
        Self::new(Voice::lead(sample_rate), ARP_MINOR, 480.0, 0.6, sample_rate)
    }

    /// Eighth-note bassline through the ladder filter.
    pub fn bassline(sample_rate: u32) -> Self {
        Self::new(Voice::bass(sample_rate), BASSLINE, 240.0, 0.5, sample_rate)
    }

    /// One held pad note, retriggered every four seconds.
    pub fn drone(sample_rate: u32) -> Self {
        Self::new(Voice::pad(sample_rate), DRONE, 15.0, 0.9, sample_rate)
    }

    /// Plucked arpeggio in random order.
    pub fn plucks(sample_rate: u32, seed: u64) -> Self {
        Self::new(Voice::pluck(sample_rate), ARP_MINOR, 360.0, 0.3, sample_rate).with_order(StepOrder::Random, seed)
    }

    /// Look up a scene by name (`arp`, `bass`, `drone`, `plucks`).
    pub fn by_name(name: &str, sample_rate: u32, seed: u64) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "arp" | "arpeggio" => Some(Self::arpeggio(sample_rate)),
            "bass" | "bassline" => Some(Self::bassline(sample_rate)),
            "drone" | "pad" => Some(Self::drone(sample_rate)),
            "plucks" | "pluck" => Some(Self::plucks(sample_rate, seed)),
            _ => None,
        }
    }

    pub fn with_order(mut self, order: StepOrder, seed: u64) -> Self {
        self.order = order;
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn set_tempo(&mut self, steps_per_minute: f32) {
        self.steps_per_minute = steps_per_minute.clamp(1.0, 6000.0);
        self.recalc_timing();
    }

    pub fn set_gate(&mut self, gate: f32) {
        self.gate = gate.clamp(0.0, 1.0);
        self.recalc_timing();
    }

    fn recalc_timing(&mut self) {
        let per_step = (self.sample_rate as f32 * 60.0 / self.steps_per_minute) as u32;
        self.samples_per_step = per_step.max(1);
        self.gate_samples = (self.samples_per_step as f32 * self.gate) as u32;
        if self.counter >= self.samples_per_step {
            self.counter = 0;
        }
    }

    #[inline] pub fn voice_mut(&mut self) -> &mut Voice { &mut self.voice }
    #[inline] pub fn samples_per_step(&self) -> u32 { self.samples_per_step }
    /// Note currently gated on, if any.
    #[inline] pub fn current_note(&self) -> Option<u8> { self.current }

    fn advance_step(&mut self) -> u8 {
        let len = self.pattern.len();
        if len == 0 {
            return REST;
        }
        let idx = match self.order {
            StepOrder::Forward => {
                let i = self.step % len;
                self.step = (i + 1) % len;
                i
            }
            StepOrder::PingPong => {
                let i = self.step.min(len - 1);
                if len > 1 {
                    if self.forward && i + 1 >= len {
                        self.forward = false;
                    } else if !self.forward && i == 0 {
                        self.forward = true;
                    }
                    self.step = if self.forward { i + 1 } else { i - 1 };
                }
                i
            }
            StepOrder::Random => self.rng.gen_range(0..len),
        };
        self.pattern[idx]
    }
}

impl Generator for Scene {
    fn reset(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.voice.reset(self.sample_rate);
        self.recalc_timing();
    }

    #[inline]
    fn next(&mut self) -> u8 {
        if self.counter == 0 {
            let note = self.advance_step();
            if note == REST {
                if self.current.take().is_some() {
                    self.voice.note_off();
                }
            } else {
                self.voice.note_on(note);
                self.current = Some(note);
            }
        }
        if self.counter == self.gate_samples && self.current.take().is_some() {
            self.voice.note_off();
        }

        self.counter += 1;
        if self.counter >= self.samples_per_step {
            self.counter = 0;
        }
        self.voice.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8_000;

    fn collect_notes(scene: &mut Scene, steps: usize) -> Vec<Option<u8>> {
        let per = scene.samples_per_step() as usize;
        (0..steps)
            .map(|_| {
                scene.next();
                let n = scene.current_note();
                for _ in 1..per {
                    scene.next();
                }
                n
            })
            .collect()
    }

    #[test]
    fn forward_walks_pattern_and_wraps() {
        let mut s = Scene::new(Voice::new(SR), &[60, 62, 64], 600.0, 0.5, SR);
        assert_eq!(s.samples_per_step(), 800);
        let seen = collect_notes(&mut s, 5);
        assert_eq!(seen, vec![Some(60), Some(62), Some(64), Some(60), Some(62)]);
    }

    #[test]
    fn ping_pong_turns_at_the_ends() {
        let mut s = Scene::new(Voice::new(SR), &[1, 2, 3], 600.0, 0.5, SR).with_order(StepOrder::PingPong, 0);
        let seen: Vec<u8> = collect_notes(&mut s, 7).into_iter().flatten().collect();
        assert_eq!(seen, vec![1, 2, 3, 2, 1, 2, 3]);
    }

    #[test]
    fn rests_close_the_gate() {
        let mut s = Scene::new(Voice::new(SR), &[60, REST], 600.0, 1.0, SR);
        let seen = collect_notes(&mut s, 2);
        assert_eq!(seen, vec![Some(60), None]);
    }

    #[test]
    fn gate_releases_voice_inside_step() {
        let mut s = Scene::new(Voice::new(SR), &[60], 600.0, 0.25, SR);
        for _ in 0..=200 {
            s.next();
        }
        assert_eq!(s.current_note(), None);
        assert!(s.voice_mut().envelope().state() != tinysynth_core::envelopes::EnvelopeState::Attack);
    }

    #[test]
    fn random_order_is_reproducible() {
        let a = collect_notes(&mut Scene::plucks(SR, 7), 16);
        let b = collect_notes(&mut Scene::plucks(SR, 7), 16);
        assert_eq!(a, b);
        assert!(a.iter().all(|n| n.is_some_and(|n| ARP_MINOR.contains(&n))));
    }

    #[test]
    fn named_scenes() {
        for name in ["arp", "bass", "drone", "plucks"] {
            assert!(Scene::by_name(name, SR, 1).is_some(), "{name}");
        }
        assert!(Scene::by_name("nope", SR, 1).is_none());
    }
}
