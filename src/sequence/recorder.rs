use crate::sequence::{RecordedNote, Sequence};

/// Turns note-on/note-off events into [RecordedNote]s timed from the start of the
/// recording. At most one note is open (duration not final) at a time; it is closed
/// when the next note starts, on note-off, or when the recording finishes.
#[derive(Debug, Default)]
pub struct SequenceRecorder {
    notes: Vec<RecordedNote>,
    open: Option<usize>,
    started_at: f64,
}

impl SequenceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new recording at `now`, discarding the previous one.
    pub fn start(&mut self, now: f64) {
        self.notes.clear();
        self.open = None;
        self.started_at = now;
    }

    pub fn note_on(&mut self, midi: u8, now: f64) {
        self.close_open(now);

        // Clamp so that start times stay non-negative and non-decreasing even if the
        // clock steps backwards.
        let floor = self
            .notes
            .last()
            .map_or(0.0, |note| note.start_time_seconds);
        let start = (now - self.started_at).max(floor);

        self.notes.push(RecordedNote {
            midi: midi.min(127),
            start_time_seconds: start,
            duration_seconds: 0.0,
        });
        self.open = Some(self.notes.len() - 1);
    }

    pub fn note_off(&mut self, now: f64) {
        self.close_open(now);
    }

    /// Close the open note, if any. The recording is complete afterwards.
    pub fn finish(&mut self, now: f64) {
        self.close_open(now);
    }

    pub fn has_open_note(&self) -> bool {
        self.open.is_some()
    }

    pub fn notes(&self) -> &[RecordedNote] {
        &self.notes
    }

    pub fn sequence(&self) -> Sequence {
        Sequence::from_notes(self.notes.clone())
    }

    fn close_open(&mut self, now: f64) {
        if let Some(idx) = self.open.take() {
            let note = &mut self.notes[idx];
            let elapsed = now - self.started_at;
            note.duration_seconds = (elapsed - note.start_time_seconds).max(0.0);
        }
    }
}
