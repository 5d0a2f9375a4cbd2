//! Output boundary: where finished 8-bit samples leave the engine.
//!
//! The hardware side (a timer-compare register driven from an interrupt) is not
//! modelled here. Instead a single producer, [`SampleClock`], pulls one sample
//! per tick from an [`Engine`] and pushes it into a [`SampleSink`]. Sinks can
//! be a closure, a `Vec<u8>` capture buffer, or a host audio bridge.
//!
//! [`PwmTimer`] carries the fixed-point timer arithmetic a PWM target needs:
//! compare value for the sample interrupt and the per-sample period.

use log::info;

use crate::graph::{Engine, Generator};

/// AVR system clock the timer arithmetic assumes by default.
pub const DEFAULT_CLOCK_HZ: u32 = 16_000_000;

/// Consumer of one unsigned 8-bit sample per tick.
pub trait SampleSink {
    fn write(&mut self, sample: u8);
}

impl SampleSink for Vec<u8> {
    #[inline]
    fn write(&mut self, sample: u8) {
        self.push(sample);
    }
}

/// Adapts any `FnMut(u8)` into a [`SampleSink`].
pub struct CallbackSink<F: FnMut(u8)>(pub F);

impl<F: FnMut(u8)> SampleSink for CallbackSink<F> {
    #[inline]
    fn write(&mut self, sample: u8) {
        (self.0)(sample);
    }
}

/// Timer arithmetic for an 8-bit fast-PWM output with a CTC sample interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PwmTimer {
    clock_hz: u32,
    sample_rate: u32,
}

impl PwmTimer {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_clock(DEFAULT_CLOCK_HZ, sample_rate)
    }

    pub fn with_clock(clock_hz: u32, sample_rate: u32) -> Self {
        Self {
            clock_hz: clock_hz.max(1),
            sample_rate: sample_rate.clamp(1, clock_hz.max(1)),
        }
    }

    #[inline] pub fn sample_rate(&self) -> u32 { self.sample_rate }
    #[inline] pub fn clock_hz(&self) -> u32 { self.clock_hz }

    /// Compare-match value for the sample interrupt: `clock / sr - 1`, saturated to 16 bits.
    pub fn compare_value(&self) -> u16 {
        let v = (self.clock_hz / self.sample_rate).saturating_sub(1);
        u16::try_from(v).unwrap_or(u16::MAX)
    }

    /// Sample rate actually produced by [`compare_value`](Self::compare_value).
    pub fn effective_sample_rate(&self) -> u32 {
        self.clock_hz / (u32::from(self.compare_value()) + 1)
    }

    /// Carrier frequency of an unprescaled 8-bit fast PWM (`clock / 256`).
    pub fn pwm_frequency(&self) -> u32 {
        self.clock_hz / 256
    }

    /// Time between samples in whole microseconds, for polling loops.
    pub fn sample_period_micros(&self) -> u32 {
        1_000_000 / self.sample_rate
    }
}

/// Single producer driving an engine at a fixed sample rate into a sink.
pub struct SampleClock<S: SampleSink> {
    timer: PwmTimer,
    sink: S,
}

impl<S: SampleSink> SampleClock<S> {
    pub fn new(timer: PwmTimer, sink: S) -> Self {
        info!(
            "sample clock: {} Hz (compare {}, effective {} Hz, pwm carrier {} Hz)",
            timer.sample_rate(),
            timer.compare_value(),
            timer.effective_sample_rate(),
            timer.pwm_frequency()
        );
        Self { timer, sink }
    }

    /// Pull `ticks` samples from `engine` and write each to the sink.
    pub fn run<G: Generator>(&mut self, engine: &mut Engine<G>, ticks: usize) {
        let sr = self.timer.sample_rate();
        for _ in 0..ticks {
            let s = engine.next(sr);
            self.sink.write(s);
        }
    }

    #[inline] pub fn timer(&self) -> &PwmTimer { &self.timer }
    #[inline] pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Fill `out` with consecutive samples from `engine` at its current rate.
pub fn render<G: Generator>(engine: &mut Engine<G>, out: &mut [u8]) {
    for s in out.iter_mut() {
        *s = engine.tick();
    }
}

/// Unsigned 8-bit sample to a float in [-1, 1).
#[inline]
pub fn u8_to_f32(sample: u8) -> f32 {
    (f32::from(sample) - 128.0) / 128.0
}

/// Unsigned 8-bit sample to signed 16-bit PCM.
#[inline]
pub fn u8_to_i16(sample: u8) -> i16 {
    (i16::from(sample) - 128) << 8
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp(u8);

    impl Generator for Ramp {
        fn reset(&mut self, _sample_rate: u32) {}
        fn next(&mut self) -> u8 {
            self.0 = self.0.wrapping_add(1);
            self.0
        }
    }

    #[test]
    fn timer_math_for_common_rates() {
        let t = PwmTimer::new(22_050);
        // 16e6 / 22050 = 725.6 -> 725 - 1
        assert_eq!(t.compare_value(), 724);
        assert_eq!(t.effective_sample_rate(), 22_068);
        assert_eq!(t.pwm_frequency(), 62_500);
        assert_eq!(t.sample_period_micros(), 45);

        let slow = PwmTimer::new(1);
        assert_eq!(slow.compare_value(), u16::MAX);
    }

    #[test]
    fn clock_feeds_sink_in_order() {
        let mut engine = Engine::with_sample_rate(Ramp(0), 8_000);
        let mut clock = SampleClock::new(PwmTimer::new(8_000), Vec::new());
        clock.run(&mut engine, 4);
        assert_eq!(clock.into_sink(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn callback_sink_sees_every_sample() {
        let mut engine = Engine::with_sample_rate(Ramp(10), 8_000);
        let mut total = 0u32;
        {
            let mut clock = SampleClock::new(PwmTimer::new(8_000), CallbackSink(|s| total += u32::from(s)));
            clock.run(&mut engine, 3);
        }
        assert_eq!(total, 11 + 12 + 13);
    }

    #[test]
    fn conversions_are_centred() {
        assert_eq!(u8_to_f32(128), 0.0);
        assert_eq!(u8_to_f32(0), -1.0);
        assert_eq!(u8_to_i16(128), 0);
        assert_eq!(u8_to_i16(255), 127 << 8);

        let mut engine = Engine::with_sample_rate(Ramp(0), 8_000);
        let mut buf = [0u8; 3];
        render(&mut engine, &mut buf);
        assert_eq!(buf, [1, 2, 3]);
    }
}
