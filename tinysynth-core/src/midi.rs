//! MIDI note / frequency conversion, pitch bend and detune helpers.
//!
//! A4 (note 69) = 440 Hz, twelve-tone equal temperament.
//!
//! [`MIDI_FREQ_TABLE`] is a compressed integer table with two scales:
//!
//! | notes    | stored value      | decode          |
//! |----------|-------------------|-----------------|
//! | 0..=83   | `round(f * 100)`  | `value / 100`   |
//! | 84..=127 | `round(f / 10)`   | `value * 10`    |
//!
//! The upper octaves trade precision (±5 Hz, well under a semitone at
//! 1 kHz and above) for range.

use core::fmt;

use crate::dsp::{m_exp2, m_log2};

/// First note stored at the coarse (÷10) scale.
pub const COARSE_SCALE_START: u8 = 84;

/// Highest valid MIDI note.
pub const MAX_NOTE: u8 = 127;

/// Centre of the 14-bit pitch-bend range.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Largest 14-bit pitch-bend value.
pub const PITCH_BEND_MAX: u16 = 16_383;

#[rustfmt::skip]
pub const MIDI_FREQ_TABLE: [u32; 128] = [
    // notes 0-11: C-1 to B-1 (Hz * 100)
    817, 866, 918, 972, 1030, 1091, 1156, 1225, 1297, 1375, 1457, 1543,
    // notes 12-23: C0 to B0
    1635, 1732, 1835, 1945, 2060, 2183, 2312, 2450, 2596, 2750, 2914, 3087,
    // notes 24-35: C1 to B1
    3270, 3465, 3671, 3889, 4120, 4365, 4625, 4900, 5191, 5500, 5827, 6174,
    // notes 36-47: C2 to B2
    6541, 6930, 7342, 7778, 8241, 8731, 9250, 9800, 10383, 11000, 11654, 12347,
    // notes 48-59: C3 to B3
    13081, 13859, 14683, 15556, 16481, 17461, 18500, 19600, 20765, 22000, 23308, 24694,
    // notes 60-71: C4 to B4
    26163, 27718, 29366, 31113, 32963, 34923, 36999, 39200, 41530, 44000, 46616, 49388,
    // notes 72-83: C5 to B5 (E5 upward needs 17 bits at this scale)
    52325, 55437, 58733, 62225, 65926, 69846, 73999, 78399, 83061, 88000, 93233, 98777,
    // notes 84-95: C6 to B6 (Hz / 10)
    105, 111, 117, 124, 132, 140, 148, 157, 166, 176, 186, 198,
    // notes 96-107: C7 to B7
    209, 222, 235, 249, 264, 279, 296, 314, 332, 352, 373, 395,
    // notes 108-119: C8 to B8
    419, 443, 470, 498, 527, 559, 592, 627, 664, 704, 746, 790,
    // notes 120-127: C9 to G9
    837, 887, 940, 996, 1055, 1118, 1184, 1254,
];

/// Pitch-class names, C first.
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Table lookup with the note-dependent descale. Notes above 127 clamp to 127.
#[inline]
pub fn midi_note_to_frequency(note: u8) -> f32 {
    let note = note.min(MAX_NOTE);
    let value = MIDI_FREQ_TABLE[note as usize] as f32;
    if note < COARSE_SCALE_START {
        value / 100.0
    } else {
        value * 10.0
    }
}

/// Exact equal-tempered frequency: `440 * 2^((note - 69) / 12)`.
#[inline]
pub fn midi_note_to_frequency_calc(note: u8) -> f32 {
    let semis = f32::from(note.min(MAX_NOTE)) - 69.0;
    440.0 * m_exp2(semis / 12.0)
}

/// Nearest MIDI note: `round(12 * log2(f / 440) + 69)`, clamped to 0..=127.
///
/// Non-positive (and NaN) frequencies map to note 0.
#[inline]
pub fn frequency_to_midi_note(freq: f32) -> u8 {
    if !(freq > 0.0) {
        return 0;
    }
    let note = 12.0 * m_log2(freq / 440.0) + 69.0;
    if note < 0.0 {
        return 0;
    }
    if note > f32::from(MAX_NOTE) {
        return MAX_NOTE;
    }
    // note is in [0, 127]: +0.5 then truncate rounds half up
    (note + 0.5) as u8
}

/// Bend `freq` by a 14-bit pitch-bend value (0..=16383, centre 8192)
/// over ±`range` semitones.
#[inline]
pub fn apply_pitch_bend(freq: f32, bend: u16, range: f32) -> f32 {
    let bend = f32::from(bend.min(PITCH_BEND_MAX));
    let semis = (bend - f32::from(PITCH_BEND_CENTER)) / f32::from(PITCH_BEND_CENTER) * range;
    freq * m_exp2(semis / 12.0)
}

/// Detune by `cents` (100 cents = 1 semitone, 1200 = 1 octave).
#[inline]
pub fn detune_by_cents(freq: f32, cents: i16) -> f32 {
    freq * m_exp2(f32::from(cents) / 1200.0)
}

/// Pitch-class name of `note` ("C", "C#", ...).
#[inline]
pub fn note_name(note: u8) -> &'static str {
    NOTE_NAMES[(note % 12) as usize]
}

/// Octave number in scientific pitch notation (note 60 = C4, note 0 = C-1).
#[inline]
pub fn note_octave(note: u8) -> i8 {
    (note / 12) as i8 - 1
}

/// Formats a note as name plus octave, e.g. "C4", "A#3", "C-1".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NoteLabel(pub u8);

impl fmt::Display for NoteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", note_name(self.0), note_octave(self.0))
    }
}

/// Commonly used note numbers.
pub mod notes {
    pub const C3: u8 = 48;
    pub const A3: u8 = 57;

    pub const C4: u8 = 60;
    pub const CS4: u8 = 61;
    pub const D4: u8 = 62;
    pub const DS4: u8 = 63;
    pub const E4: u8 = 64;
    pub const F4: u8 = 65;
    pub const FS4: u8 = 66;
    pub const G4: u8 = 67;
    pub const GS4: u8 = 68;
    /// 440 Hz reference.
    pub const A4: u8 = 69;
    pub const AS4: u8 = 70;
    pub const B4: u8 = 71;

    pub const C5: u8 = 72;
    pub const A5: u8 = 81;
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    extern crate std;
    use std::string::ToString;

    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((midi_note_to_frequency(notes::A4) - 440.0).abs() < 0.5);
        assert_eq!(frequency_to_midi_note(440.0), 69);
    }

    #[test]
    fn table_round_trips_every_note() {
        for n in 0..=MAX_NOTE {
            let f = midi_note_to_frequency(n);
            assert_eq!(frequency_to_midi_note(f), n, "note {n} f={f}");
        }
    }

    #[test]
    fn table_tracks_exact_formula() {
        for n in 0..=MAX_NOTE {
            let table = midi_note_to_frequency(n);
            let exact = midi_note_to_frequency_calc(n);
            // 0.01 Hz resolution below note 84, 10 Hz steps above
            let tol = if n < COARSE_SCALE_START { 0.01 } else { 5.0 };
            assert!((table - exact).abs() <= tol + exact * 1e-5, "note {n}: {table} vs {exact}");
        }
    }

    #[test]
    fn scale_boundary_decodes_both_sides() {
        assert!((midi_note_to_frequency(83) - 987.77).abs() < 1e-3);
        assert_eq!(midi_note_to_frequency(84), 1050.0);
        assert_eq!(midi_note_to_frequency(200), midi_note_to_frequency(127));
    }

    #[test]
    fn degenerate_frequencies_clamp() {
        assert_eq!(frequency_to_midi_note(0.0), 0);
        assert_eq!(frequency_to_midi_note(-10.0), 0);
        assert_eq!(frequency_to_midi_note(f32::NAN), 0);
        assert_eq!(frequency_to_midi_note(1.0), 0);
        assert_eq!(frequency_to_midi_note(100_000.0), 127);
    }

    #[test]
    fn pitch_bend_range() {
        let f = 440.0;
        assert_eq!(apply_pitch_bend(f, PITCH_BEND_CENTER, 2.0), f);
        let up = apply_pitch_bend(f, PITCH_BEND_MAX, 2.0);
        assert!((up - f * semitone(2.0)).abs() < 0.1, "up={up}");
        let down = apply_pitch_bend(f, 0, 12.0);
        assert!((down - 220.0).abs() < 1e-3, "down={down}");
    }

    fn semitone(n: f32) -> f32 {
        2.0_f32.powf(n / 12.0)
    }

    #[test]
    fn detune_octave_and_cents() {
        assert!((detune_by_cents(440.0, 1200) - 880.0).abs() < 1e-3);
        assert!((detune_by_cents(440.0, -1200) - 220.0).abs() < 1e-3);
        assert!((detune_by_cents(440.0, 100) - 440.0 * semitone(1.0)).abs() < 1e-3);
    }

    #[test]
    fn note_labels() {
        assert_eq!(NoteLabel(notes::C4).to_string(), "C4");
        assert_eq!(NoteLabel(58).to_string(), "A#3");
        assert_eq!(NoteLabel(0).to_string(), "C-1");
        assert_eq!(NoteLabel(127).to_string(), "G9");
        assert_eq!(note_name(notes::FS4), "F#");
    }
}
