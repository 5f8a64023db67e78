//! Recorded note sequences.

use serde::{Deserialize, Serialize};

pub mod player;
pub mod recorder;

pub use player::{PlaybackState, SequencePlayer};
pub use recorder::SequenceRecorder;

/// One note of a recording, timed relative to the start of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedNote {
    pub midi: u8,
    pub start_time_seconds: f64,
    pub duration_seconds: f64,
}

impl RecordedNote {
    pub fn end_time_seconds(&self) -> f64 {
        self.start_time_seconds + self.duration_seconds
    }
}

/// Notes in non-decreasing start order. Serializes as a plain list of
/// `{midi, startTimeSeconds, durationSeconds}` objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    notes: Vec<RecordedNote>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from arbitrary notes, ordering them by start time.
    pub fn from_notes(mut notes: Vec<RecordedNote>) -> Self {
        notes.sort_by(|a, b| a.start_time_seconds.total_cmp(&b.start_time_seconds));
        Sequence { notes }
    }

    pub fn notes(&self) -> &[RecordedNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Time from the start of the recording to the end of the last-ending note.
    pub fn duration(&self) -> f64 {
        self.notes
            .iter()
            .map(RecordedNote::end_time_seconds)
            .fold(0.0, f64::max)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let sequence: Sequence = serde_json::from_str(json)?;
        Ok(Sequence::from_notes(sequence.notes))
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a RecordedNote;
    type IntoIter = std::slice::Iter<'a, RecordedNote>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
