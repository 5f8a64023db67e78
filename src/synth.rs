//! The synthesis sink interface and the live monitoring voice.

use crate::config::SynthConfig;
use crate::error::{AudioInitError, InstrumentLoadFailure};
use crate::music::midi_to_frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle(pub u64);

/// Output primitives the engine drives. A sink owns one continuously running tone
/// generator (retuned with [set_frequency](SynthesisSink::set_frequency) and gated
/// with [set_level](SynthesisSink::set_level)) and can optionally play notes on a
/// loaded sampled instrument.
#[allow(async_fn_in_trait)]
pub trait SynthesisSink {
    fn set_frequency(&mut self, hz: f32, smoothing_seconds: f32);

    fn set_level(&mut self, gain: f32, smoothing_seconds: f32);

    /// Schedule a note on the loaded instrument.
    fn play_instrument_note(
        &mut self,
        midi: u8,
        at: f64,
        duration: f64,
        gain: f32,
    ) -> VoiceHandle;

    fn stop(&mut self, voice: VoiceHandle, at: f64);

    fn load_instrument(&mut self, id: &str) -> Result<(), InstrumentLoadFailure>;

    /// Resume a suspended output device. Must be idempotent.
    async fn resume(&mut self) -> Result<(), AudioInitError>;
}

/// How notes are rendered: on the built-in tone generator, or on a sampled
/// instrument that loaded successfully.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Voicing {
    #[default]
    ToneGenerator,
    Instrument(String),
}

/// The single monitoring voice used in live mode.
#[derive(Debug, Default)]
pub struct LiveVoice {
    held: Option<VoiceHandle>,
    sounding: Option<u8>,
}

impl LiveVoice {
    pub fn sounding(&self) -> Option<u8> {
        self.sounding
    }

    /// Start a session muted.
    pub fn arm<K: SynthesisSink>(&mut self, sink: &mut K) {
        self.held = None;
        self.sounding = None;
        sink.set_level(0.0, 0.0);
    }

    pub fn note_on<K: SynthesisSink>(
        &mut self,
        sink: &mut K,
        voicing: &Voicing,
        midi: u8,
        now: f64,
        config: &SynthConfig,
    ) {
        match voicing {
            Voicing::ToneGenerator => {
                let hz = midi_to_frequency(f64::from(midi)) as f32;
                sink.set_frequency(hz, config.glide_seconds);
                sink.set_level(config.output_gain, config.glide_seconds);
            }
            Voicing::Instrument(_) => {
                if let Some(previous) = self.held.take() {
                    sink.stop(previous, now);
                }
                self.held = Some(sink.play_instrument_note(
                    midi,
                    now,
                    config.live_hold_seconds,
                    config.output_gain,
                ));
            }
        }
        self.sounding = Some(midi);
    }

    pub fn note_off<K: SynthesisSink>(&mut self, sink: &mut K, now: f64, config: &SynthConfig) {
        if let Some(voice) = self.held.take() {
            sink.stop(voice, now);
        }
        sink.set_level(0.0, config.release_seconds);
        self.sounding = None;
    }
}

/// A sink without an output device. Accepts every command and renders nothing;
/// used for offline analysis.
#[derive(Debug, Default)]
pub struct SilentSink {
    next_voice: u64,
}

impl SynthesisSink for SilentSink {
    fn set_frequency(&mut self, hz: f32, _smoothing_seconds: f32) {
        log::trace!("silent sink: frequency {:.2} Hz", hz);
    }

    fn set_level(&mut self, gain: f32, _smoothing_seconds: f32) {
        log::trace!("silent sink: level {:.2}", gain);
    }

    fn play_instrument_note(
        &mut self,
        midi: u8,
        at: f64,
        duration: f64,
        _gain: f32,
    ) -> VoiceHandle {
        self.next_voice += 1;
        log::trace!("silent sink: note {} at {:.3}s for {:.3}s", midi, at, duration);
        VoiceHandle(self.next_voice)
    }

    fn stop(&mut self, _voice: VoiceHandle, _at: f64) {}

    fn load_instrument(&mut self, id: &str) -> Result<(), InstrumentLoadFailure> {
        Err(InstrumentLoadFailure {
            id: id.to_string(),
            reason: "no output device".to_string(),
        })
    }

    async fn resume(&mut self) -> Result<(), AudioInitError> {
        Ok(())
    }
}
