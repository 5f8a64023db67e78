//! MIDI note arithmetic and the mapping from a detected frequency to a note.

use serde::{Deserialize, Serialize};

pub mod scale;

pub use scale::Scale;

pub const A4_FREQUENCY: f64 = 440.0;
pub const A4_MIDI: f64 = 69.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Fractional MIDI note number of `frequency` Hz (A4 = 440 Hz = 69).
pub fn frequency_to_midi(frequency: f64) -> f64 {
    12.0 * (frequency / A4_FREQUENCY).log2() + A4_MIDI
}

pub fn midi_to_frequency(midi: f64) -> f64 {
    A4_FREQUENCY * 2f64.powf((midi - A4_MIDI) / 12.0)
}

/// Scientific pitch name of a note, e.g. 60 -> `"C4"`.
pub fn note_name(midi: u8) -> String {
    let octave = i32::from(midi) / 12 - 1;
    format!("{}{}", NOTE_NAMES[usize::from(midi % 12)], octave)
}

/// Whether the octave shift is applied to the rounded note before or after it is
/// snapped to the scale. The two differ when the shift is not a whole number of
/// octaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftOrder {
    #[default]
    BeforeQuantize,
    AfterQuantize,
}

/// Map a detected frequency to the note that should sound: round to the nearest
/// semitone, shift, snap to `scale` when given, and clamp to `0..=127`.
pub fn target_note(
    frequency: f64,
    shift_semitones: i32,
    scale: Option<&Scale>,
    order: ShiftOrder,
) -> u8 {
    let rounded = frequency_to_midi(frequency).round();
    // Frequencies far outside the MIDI range saturate here and are clamped below.
    let rounded = rounded.clamp(f64::from(i32::MIN / 2), f64::from(i32::MAX / 2)) as i32;

    let note = match (scale, order) {
        (None, _) => rounded.saturating_add(shift_semitones),
        (Some(scale), ShiftOrder::BeforeQuantize) => {
            scale.quantize(rounded.saturating_add(shift_semitones))
        }
        (Some(scale), ShiftOrder::AfterQuantize) => {
            scale.quantize(rounded).saturating_add(shift_semitones)
        }
    };
    note.clamp(0, 127) as u8
}
