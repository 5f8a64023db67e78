use crate::config::SynthConfig;
use crate::music::midi_to_frequency;
use crate::sequence::{RecordedNote, Sequence};
use crate::synth::{SynthesisSink, VoiceHandle, Voicing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Finished,
}

/// Replays a [Sequence] against a sink. The player is advanced by the host's
/// scheduling loop; each call triggers the notes that have come due, scheduled at
/// their exact start (`started_at + startTimeSeconds`).
///
/// Progress is reported in percent as the fraction of the way to the last note's
/// start: 0 when playback begins, then once per triggered note up to 100 for the
/// last. On completion it is reset to 0 exactly once. A value equal to the previous
/// report is not repeated.
#[derive(Debug)]
pub struct SequencePlayer {
    notes: Vec<RecordedNote>,
    started_at: f64,
    next: usize,
    voices: Vec<VoiceHandle>,
    tone_release_at: Option<f64>,
    last_report: Option<f32>,
    finished: bool,
}

impl SequencePlayer {
    /// Prepare playback of `sequence` starting at `now`. An empty sequence has nothing
    /// to play and yields `None`.
    pub fn start(sequence: &Sequence, now: f64) -> Option<Self> {
        if sequence.is_empty() {
            return None;
        }
        Some(SequencePlayer {
            notes: sequence.notes().to_vec(),
            started_at: now,
            next: 0,
            voices: Vec::new(),
            tone_release_at: None,
            last_report: None,
            finished: false,
        })
    }

    pub fn end_time(&self) -> f64 {
        self.started_at
            + self
                .notes
                .iter()
                .map(RecordedNote::end_time_seconds)
                .fold(0.0, f64::max)
    }

    fn progress_of(&self, idx: usize) -> f32 {
        let last_start = self.notes.last().map_or(0.0, |n| n.start_time_seconds);
        if last_start <= 0.0 {
            return 100.0;
        }
        (self.notes[idx].start_time_seconds / last_start * 100.0) as f32
    }

    fn report(&mut self, value: f32, progress: &mut dyn FnMut(f32)) {
        if self.last_report != Some(value) {
            self.last_report = Some(value);
            progress(value);
        }
    }

    pub fn advance<K: SynthesisSink>(
        &mut self,
        now: f64,
        sink: &mut K,
        voicing: &Voicing,
        config: &SynthConfig,
        progress: &mut dyn FnMut(f32),
    ) -> PlaybackState {
        if self.finished {
            return PlaybackState::Finished;
        }
        if self.last_report.is_none() {
            self.report(0.0, progress);
        }

        while let Some(note) = self.notes.get(self.next).copied() {
            let at = self.started_at + note.start_time_seconds;
            if at > now {
                break;
            }
            match voicing {
                Voicing::Instrument(_) => {
                    let voice = sink.play_instrument_note(
                        note.midi,
                        at,
                        note.duration_seconds,
                        config.output_gain,
                    );
                    self.voices.push(voice);
                }
                Voicing::ToneGenerator => {
                    let hz = midi_to_frequency(f64::from(note.midi)) as f32;
                    sink.set_frequency(hz, config.glide_seconds);
                    sink.set_level(config.output_gain, config.glide_seconds);
                    self.tone_release_at = Some(at + note.duration_seconds);
                }
            }
            let reached = self.progress_of(self.next);
            self.report(reached, progress);
            self.next += 1;
        }

        if let Some(release_at) = self.tone_release_at {
            let next_start = self
                .notes
                .get(self.next)
                .map(|n| self.started_at + n.start_time_seconds);
            // Leave the tone up if the next note starts right where this one ends.
            let legato = next_start.is_some_and(|start| start <= release_at);
            if now >= release_at && !legato {
                sink.set_level(0.0, config.release_seconds);
                self.tone_release_at = None;
            }
        }

        if self.next >= self.notes.len() && now >= self.end_time() {
            if let Some(release_at) = self.tone_release_at.take() {
                sink.set_level(0.0, config.release_seconds);
                log::trace!("released tone at {:.3}s", release_at);
            }
            // Always reset, even right after a report of 0.
            self.last_report = None;
            self.report(0.0, progress);
            self.finished = true;
            return PlaybackState::Finished;
        }
        PlaybackState::Playing
    }

    /// Abort playback, silencing anything still sounding.
    pub fn cancel<K: SynthesisSink>(&mut self, now: f64, sink: &mut K, config: &SynthConfig) {
        for voice in self.voices.drain(..) {
            sink.stop(voice, now);
        }
        self.tone_release_at = None;
        self.next = self.notes.len();
        self.finished = true;
        sink.set_level(0.0, config.release_seconds);
    }
}
