//! Tick-driven synthesis graph core.
//!
//! This module defines the minimal `Generator` trait and a lightweight `Engine<G>`
//! wrapper that owns a generator (voice/scene), tracks sample rate and tick count,
//! and produces one unsigned 8-bit sample at a time with zero heap work per sample.
//!
//! Design goals
//! - No dynamic allocations per tick
//! - SR changes handled lazily (if the host reconfigures), with cheap branching
//! - Generic over the scene type, so scenes can be swapped without trait objects

use log::debug;

/// Default sample rate until the host reports one.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Anything that can generate one 8-bit sample per tick.
pub trait Generator {
    /// Called when the engine is (re)initialized or when the sample rate changes.
    fn reset(&mut self, sample_rate: u32);

    /// Generate the next unsigned sample (128 = silence). Implementations should
    /// assume the sample rate has been communicated via `reset`.
    fn next(&mut self) -> u8;
}

/// Lightweight tick engine that owns a generator.
///
/// The sample clock (timer interrupt, audio callback) calls `next(sr)` for
/// every output sample. If the `sr` reported by the host changes, the engine
/// calls `reset(sr)` on the inner generator once and continues.
pub struct Engine<G: Generator> {
    sample_rate: u32,
    ticks: u64,
    gen: G,
}

impl<G: Generator> Engine<G> {
    /// Construct with an already-configured generator. We immediately `reset`
    /// the generator to communicate the sample rate.
    #[inline]
    pub fn new(gen: G) -> Self {
        Self::with_sample_rate(gen, DEFAULT_SAMPLE_RATE)
    }

    pub fn with_sample_rate(mut gen: G, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        gen.reset(sample_rate);
        debug!("engine created at {sample_rate} Hz");
        Self { sample_rate, ticks: 0, gen }
    }

    /// Produce **one** sample at the given sample rate.
    #[inline]
    pub fn next(&mut self, sample_rate: u32) -> u8 {
        if sample_rate != self.sample_rate && sample_rate > 0 {
            self.sample_rate = sample_rate;
            self.gen.reset(sample_rate);
        }
        self.ticks = self.ticks.wrapping_add(1);
        self.gen.next()
    }

    /// Produce one sample at the current sample rate.
    #[inline]
    pub fn tick(&mut self) -> u8 {
        self.next(self.sample_rate)
    }

    /// Return the engine's current sample rate.
    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }

    /// Number of samples produced since creation.
    #[inline] pub fn ticks(&self) -> u64 { self.ticks }

    /// Elapsed time in seconds, derived from the tick count.
    #[inline]
    pub fn time(&self) -> f64 {
        self.ticks as f64 / f64::from(self.sample_rate)
    }

    /// Replace the inner generator (scene). We call `reset(sr)` on the new scene.
    #[inline]
    pub fn swap_scene(&mut self, mut new_scene: G) {
        new_scene.reset(self.sample_rate);
        debug!("scene swapped at tick {}", self.ticks);
        self.gen = new_scene;
    }

    /// Get a mutable reference to the inner generator for live parameter tweaks.
    #[inline]
    pub fn scene_mut(&mut self) -> &mut G { &mut self.gen }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        resets: Vec<u32>,
        value: u8,
    }

    impl Generator for Counter {
        fn reset(&mut self, sample_rate: u32) {
            self.resets.push(sample_rate);
        }

        fn next(&mut self) -> u8 {
            self.value = self.value.wrapping_add(1);
            self.value
        }
    }

    #[test]
    fn resets_lazily_on_rate_change() {
        let mut e = Engine::with_sample_rate(Counter::default(), 8_000);
        assert_eq!(e.next(8_000), 1);
        assert_eq!(e.next(16_000), 2);
        assert_eq!(e.next(16_000), 3);
        assert_eq!(e.scene_mut().resets, vec![8_000, 16_000]);
        assert_eq!(e.sample_rate(), 16_000);
        assert_eq!(e.ticks(), 3);
    }

    #[test]
    fn time_follows_ticks() {
        let mut e = Engine::with_sample_rate(Counter::default(), 1_000);
        for _ in 0..500 {
            e.tick();
        }
        assert!((e.time() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn swap_resets_new_scene() {
        let mut e = Engine::with_sample_rate(Counter::default(), 4_000);
        e.tick();
        e.swap_scene(Counter::default());
        assert_eq!(e.scene_mut().resets, vec![4_000]);
        assert_eq!(e.tick(), 1);
    }
}
