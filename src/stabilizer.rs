//! Debouncing of per-frame pitch estimates into held notes.
//!
//! The stabilizer is either silent, following a candidate note, or holding a stable
//! note (possibly while following a different candidate). A candidate becomes the
//! stable note once it has been seen on `stability_frames` consecutive accepted
//! frames and at least `min_retrigger_seconds` have passed since the previous
//! note-on. A frame that is too quiet or unclear ends the held note.

use crate::config::EngineConfig;
use crate::detector::PitchEstimate;
use crate::music::target_note;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteEvent {
    On { midi: u8, at: f64 },
    Off { midi: u8, at: f64 },
}

impl NoteEvent {
    pub fn midi(&self) -> u8 {
        match *self {
            NoteEvent::On { midi, .. } | NoteEvent::Off { midi, .. } => midi,
        }
    }

    pub fn at(&self) -> f64 {
        match *self {
            NoteEvent::On { at, .. } | NoteEvent::Off { at, .. } => at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizerPhase {
    Silent,
    Candidate { midi: u8, count: u32 },
    Stable { midi: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StabilizerState {
    pub last_stable_midi: Option<u8>,
    pub candidate_midi: Option<u8>,
    pub candidate_frame_count: u32,
    pub last_note_start_time: f64,
}

impl Default for StabilizerState {
    fn default() -> Self {
        Self {
            last_stable_midi: None,
            candidate_midi: None,
            candidate_frame_count: 0,
            last_note_start_time: f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug, Default)]
pub struct NoteStabilizer {
    state: StabilizerState,
}

impl NoteStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.state = StabilizerState::default();
    }

    pub fn state(&self) -> &StabilizerState {
        &self.state
    }

    pub fn phase(&self) -> StabilizerPhase {
        match (self.state.last_stable_midi, self.state.candidate_midi) {
            (Some(midi), _) => StabilizerPhase::Stable { midi },
            (None, Some(midi)) => StabilizerPhase::Candidate {
                midi,
                count: self.state.candidate_frame_count,
            },
            (None, None) => StabilizerPhase::Silent,
        }
    }

    /// Whether `estimate` is loud and clear enough to carry a note.
    pub fn accepts(estimate: &PitchEstimate<f32>, config: &EngineConfig) -> Option<f64> {
        let frequency = f64::from(estimate.frequency?);
        let loud = f64::from(estimate.volume) >= config.sensitivity;
        let clear = f64::from(estimate.clarity) >= config.clarity_threshold;
        (loud && clear && frequency > 0.0).then_some(frequency)
    }

    /// Feed one frame's estimate observed at `now` seconds.
    pub fn process(
        &mut self,
        estimate: &PitchEstimate<f32>,
        now: f64,
        config: &EngineConfig,
    ) -> Option<NoteEvent> {
        let Some(frequency) = Self::accepts(estimate, config) else {
            return self.silence(now);
        };

        let midi = target_note(
            frequency,
            config.octave_shift_semitones,
            config.active_scale(),
            config.shift_order,
        );

        if self.state.last_stable_midi == Some(midi) {
            self.state.candidate_midi = None;
            self.state.candidate_frame_count = 0;
            return None;
        }

        if self.state.candidate_midi != Some(midi) {
            self.state.candidate_midi = Some(midi);
            self.state.candidate_frame_count = 1;
        } else {
            self.state.candidate_frame_count = self.state.candidate_frame_count.saturating_add(1);
        }

        let settled = self.state.candidate_frame_count >= config.stability_frames;
        let rested = now - self.state.last_note_start_time >= config.min_retrigger_seconds;
        if !(settled && rested) {
            return None;
        }

        self.state.last_stable_midi = Some(midi);
        self.state.candidate_midi = None;
        self.state.candidate_frame_count = 0;
        self.state.last_note_start_time = now;
        log::trace!("note on {} at {:.3}s", midi, now);
        Some(NoteEvent::On { midi, at: now })
    }

    /// End the held note, if any, as if a rejected frame arrived at `now`.
    pub fn silence(&mut self, now: f64) -> Option<NoteEvent> {
        self.state.candidate_midi = None;
        self.state.candidate_frame_count = 0;
        let midi = self.state.last_stable_midi.take()?;
        log::trace!("note off {} at {:.3}s", midi, now);
        Some(NoteEvent::Off { midi, at: now })
    }
}
