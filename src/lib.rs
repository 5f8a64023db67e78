//! # Pitch Tracking
//! *pitch_tracking* turns a live monophonic signal (a voice, a whistle, a single
//! instrument) into discrete MIDI notes. Each frame is analysed with a time-domain
//! autocorrelation, the estimate is optionally shifted and snapped to a scale, and a
//! small state machine debounces the per-frame notes into stable note-on/note-off
//! events. Those events either drive a monitoring synthesizer in real time or are
//! recorded into a timestamped [Sequence][sequence::Sequence] that can be previewed
//! afterwards.
//!
//! # Pieces
//!   * [AutocorrelationDetector][detector::autocorrelation::AutocorrelationDetector]:
//!     one frame in, one [PitchEstimate] out.
//!   * [Scale][music::Scale] and [target_note][music::target_note]: frequency to MIDI note.
//!   * [NoteStabilizer][stabilizer::NoteStabilizer]: per-frame notes to note events.
//!   * [SequenceRecorder][sequence::SequenceRecorder] and
//!     [SequencePlayer][sequence::SequencePlayer].
//!   * [Engine][engine::Engine]: owns all of the above and runs the frame loop.
//!
//! The engine talks to the outside world through three traits: a
//! [MicrophoneGate][source::MicrophoneGate] handing out a
//! [FrameSource][source::FrameSource], a [SynthesisSink][synth::SynthesisSink] for
//! output, and a [Clock][clock::Clock].
//!
//! # Examples
//! ```
//! use pitch_tracking::detector::autocorrelation::AutocorrelationDetector;
//! use pitch_tracking::music::{target_note, Scale, ShiftOrder};
//!
//! const SAMPLE_RATE: usize = 44100;
//! const SIZE: usize = 2048;
//! const SENSITIVITY: f64 = 0.015;
//!
//! // Signal coming from some source (microphone, generated, etc...)
//! let dt = 1.0 / SAMPLE_RATE as f64;
//! let freq = 300.0;
//! let signal: Vec<f32> = (0..SIZE)
//!     .map(|x| (2.0 * std::f64::consts::PI * x as f64 * dt * freq).sin() as f32)
//!     .collect();
//!
//! let mut detector = AutocorrelationDetector::new(SIZE);
//! let estimate = detector
//!     .estimate_with(&signal, SAMPLE_RATE, SENSITIVITY)
//!     .unwrap();
//!
//! let frequency = estimate.frequency.unwrap();
//! let note = target_note(frequency as f64, 0, Some(&Scale::major()), ShiftOrder::default());
//! println!("Frequency: {}, Clarity: {}, Note: {}", frequency, estimate.clarity, note);
//! ```

pub use config::EngineConfig;
pub use detector::PitchEstimate;
pub use engine::{Engine, EngineMode, NoteChange, SessionMode};
pub use error::{AudioInitError, EngineError, InstrumentLoadFailure};
pub use sequence::{RecordedNote, Sequence};

pub mod clock;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod float;
pub mod music;
pub mod sequence;
pub mod source;
pub mod stabilizer;
pub mod synth;
pub mod utils;
pub mod wav;
