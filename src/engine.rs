//! The engine: session control and the per-frame pipeline.
//!
//! The host owns an [Engine] and calls [Engine::tick] at its own cadence (an audio
//! callback, a display refresh, a timer). Each tick reads one frame from the active
//! session's source, estimates its pitch, feeds the stabilizer and routes the
//! resulting note events to the live voice or the recorder. Ticks never await.
//!
//! Starting a session has two suspension points, resuming the output device and
//! requesting the microphone. [Engine::start] awaits both. Hosts that cannot hold
//! the engine across those awaits can split the start with [Engine::begin_start] and
//! [Engine::complete_start]; a completion that arrives after [Engine::stop] (or
//! after a newer start) is discarded without touching engine state.

use crossbeam_channel::{Receiver, Sender};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::detector::autocorrelation::AutocorrelationDetector;
use crate::detector::PitchEstimate;
use crate::error::{ConfigError, EngineError, MicrophoneError};
use crate::music::note_name;
use crate::sequence::{PlaybackState, Sequence, SequencePlayer, SequenceRecorder};
use crate::source::{AudioFrame, FrameSource, MicrophoneGate};
use crate::stabilizer::{NoteEvent, NoteStabilizer, StabilizerPhase};
use crate::synth::{LiveVoice, SynthesisSink, Voicing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Live,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Idle,
    Live,
    Recording,
}

impl From<SessionMode> for EngineMode {
    fn from(mode: SessionMode) -> Self {
        match mode {
            SessionMode::Live => EngineMode::Live,
            SessionMode::Recording => EngineMode::Recording,
        }
    }
}

/// Sent on every stabilizer transition: the new note and its name, or `None` when
/// the note ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChange {
    pub midi: Option<u8>,
    pub name: Option<String>,
}

impl NoteChange {
    fn new(midi: Option<u8>) -> Self {
        NoteChange {
            midi,
            name: midi.map(note_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionInfo {
    pub id: u64,
    pub mode: SessionMode,
    pub started_at: f64,
}

/// Proof that a start was requested. Hand it back to [Engine::complete_start] once
/// the microphone request has resolved.
#[derive(Debug, PartialEq, Eq)]
pub struct StartTicket {
    generation: u64,
    mode: SessionMode,
}

impl StartTicket {
    pub fn mode(&self) -> SessionMode {
        self.mode
    }
}

#[derive(Debug, PartialEq)]
pub enum StartStep {
    /// A session is already running; starting again is a no-op.
    Running(SessionInfo),
    /// Resolve the microphone request, then call [Engine::complete_start].
    Pending(StartTicket),
}

struct Session<F> {
    info: SessionInfo,
    source: F,
    frames: u64,
}

enum Phase<F> {
    Idle,
    Starting { generation: u64, mode: SessionMode },
    Running(Session<F>),
}

struct Preview {
    player: SequencePlayer,
    progress: Box<dyn FnMut(f32)>,
}

pub struct Engine<F, K, C>
where
    F: FrameSource,
    K: SynthesisSink,
    C: Clock,
{
    config: EngineConfig,
    pending_config: Option<EngineConfig>,
    detector: Option<AutocorrelationDetector<f32>>,
    stabilizer: NoteStabilizer,
    recorder: SequenceRecorder,
    live: LiveVoice,
    voicing: Voicing,
    sink: K,
    clock: C,
    phase: Phase<F>,
    generation: u64,
    preview: Option<Preview>,
    events: Option<Sender<NoteChange>>,
}

impl<F, K, C> Engine<F, K, C>
where
    F: FrameSource,
    K: SynthesisSink,
    C: Clock,
{
    pub fn new(sink: K, clock: C) -> Self {
        Engine {
            config: EngineConfig::default(),
            pending_config: None,
            detector: None,
            stabilizer: NoteStabilizer::new(),
            recorder: SequenceRecorder::new(),
            live: LiveVoice::default(),
            voicing: Voicing::ToneGenerator,
            sink,
            clock,
            phase: Phase::Idle,
            generation: 0,
            preview: None,
            events: None,
        }
    }

    pub fn with_config(sink: K, clock: C, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self::new(sink, clock);
        engine.config = config;
        Ok(engine)
    }

    /// Receive [NoteChange]s from now on. Replaces any previous subscription.
    pub fn subscribe(&mut self) -> Receiver<NoteChange> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.events = Some(sender);
        receiver
    }

    /// Replace the configuration. It takes effect at the start of the next tick (or
    /// session start), never in the middle of a frame.
    pub fn configure(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.pending_config = Some(config);
        Ok(())
    }

    /// The configuration the current frame is processed with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> EngineMode {
        match &self.phase {
            Phase::Running(session) => session.info.mode.into(),
            _ => EngineMode::Idle,
        }
    }

    pub fn session(&self) -> Option<SessionInfo> {
        match &self.phase {
            Phase::Running(session) => Some(session.info),
            _ => None,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    pub fn stabilizer_phase(&self) -> StabilizerPhase {
        self.stabilizer.phase()
    }

    pub fn voicing(&self) -> &Voicing {
        &self.voicing
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Snapshot of the current (or last) recording.
    pub fn sequence(&self) -> Sequence {
        self.recorder.sequence()
    }

    /// Load a sampled instrument for live monitoring and preview. A failure is not an
    /// error: the engine keeps using the built-in tone generator.
    pub fn select_instrument(&mut self, id: &str) -> &Voicing {
        self.voicing = match self.sink.load_instrument(id) {
            Ok(()) => {
                log::info!("Using instrument \"{}\"", id);
                Voicing::Instrument(id.to_string())
            }
            Err(err) => {
                log::warn!("{}; falling back to the built-in tone generator", err);
                Voicing::ToneGenerator
            }
        };
        &self.voicing
    }

    /// Resume the output device. Safe to call repeatedly.
    pub async fn resume_output(&mut self) -> Result<(), EngineError> {
        self.sink.resume().await?;
        Ok(())
    }

    /// Start a live or recording session: resume the output, then ask `gate` for the
    /// microphone. Starting while a session runs returns that session unchanged.
    pub async fn start<G>(
        &mut self,
        mode: SessionMode,
        gate: &mut G,
    ) -> Result<SessionInfo, EngineError>
    where
        G: MicrophoneGate<Stream = F>,
    {
        let ticket = match self.begin_start(mode) {
            StartStep::Running(info) => return Ok(info),
            StartStep::Pending(ticket) => ticket,
        };

        if let Err(err) = self.resume_output().await {
            log::error!("Cannot start {:?} session: {}", mode, err);
            self.abort_start(&ticket);
            return Err(err);
        }

        let stream = gate.request_microphone().await;
        self.complete_start(ticket, stream)
    }

    pub fn begin_start(&mut self, mode: SessionMode) -> StartStep {
        match self.phase {
            Phase::Running(ref session) => return StartStep::Running(session.info),
            Phase::Starting { generation, mode } => {
                return StartStep::Pending(StartTicket { generation, mode })
            }
            Phase::Idle => {}
        }

        self.generation += 1;
        self.phase = Phase::Starting {
            generation: self.generation,
            mode,
        };
        log::debug!("Requested {:?} session {}", mode, self.generation);
        StartStep::Pending(StartTicket {
            generation: self.generation,
            mode,
        })
    }

    /// Finish a start once the microphone request has resolved. Completions for a
    /// start that has since been stopped or superseded are discarded.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        stream: Result<F, MicrophoneError>,
    ) -> Result<SessionInfo, EngineError> {
        match self.phase {
            Phase::Running(ref session) if session.info.id == ticket.generation => {
                return Ok(session.info)
            }
            Phase::Starting { generation, .. } if generation == ticket.generation => {}
            _ => {
                log::info!("Discarding stale start of session {}", ticket.generation);
                return Err(EngineError::Cancelled);
            }
        }

        let source = match stream {
            Ok(source) => source,
            Err(err) => {
                log::warn!("Cannot start {:?} session: {}", ticket.mode, err);
                self.phase = Phase::Idle;
                return Err(err.into());
            }
        };

        self.apply_pending_config();
        let now = self.clock.now();
        if let Some(mut preview) = self.preview.take() {
            log::debug!("Stopping preview for new session");
            preview.player.cancel(now, &mut self.sink, &self.config.synth);
        }

        self.stabilizer.reset();
        self.live.arm(&mut self.sink);
        if ticket.mode == SessionMode::Recording {
            self.recorder.start(now);
        }

        let info = SessionInfo {
            id: ticket.generation,
            mode: ticket.mode,
            started_at: now,
        };
        self.phase = Phase::Running(Session {
            info,
            source,
            frames: 0,
        });
        log::info!("Started {:?} session {}", info.mode, info.id);
        Ok(info)
    }

    fn abort_start(&mut self, ticket: &StartTicket) {
        if let Phase::Starting { generation, .. } = self.phase {
            if generation == ticket.generation {
                self.phase = Phase::Idle;
            }
        }
    }

    /// End the current session, or cancel a pending start. Calling it again has no
    /// further effect.
    pub fn stop(&mut self) {
        let now = self.clock.now();
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Starting { generation, .. } => {
                log::info!("Cancelled start of session {}", generation);
            }
            Phase::Running(session) => {
                self.stabilizer.silence(now);
                match session.info.mode {
                    SessionMode::Live => {
                        self.live.note_off(&mut self.sink, now, &self.config.synth)
                    }
                    SessionMode::Recording => self.recorder.finish(now),
                }
                self.stabilizer.reset();
                self.notify(None);
                log::info!(
                    "Stopped {:?} session {} after {} frames",
                    session.info.mode,
                    session.info.id,
                    session.frames
                );
                if session.info.mode == SessionMode::Recording {
                    log::info!("Recorded {} notes", self.recorder.notes().len());
                }
            }
        }
    }

    /// Play back the recorded sequence. Progress is reported through `progress` as the
    /// host keeps ticking. Returns `false` if there is nothing to play.
    pub fn preview(&mut self, progress: impl FnMut(f32) + 'static) -> Result<bool, EngineError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(EngineError::SessionActive);
        }
        let now = self.clock.now();
        self.stop_preview();

        let sequence = self.recorder.sequence();
        let Some(player) = SequencePlayer::start(&sequence, now) else {
            log::debug!("Nothing to preview");
            return Ok(false);
        };
        log::info!("Previewing {} notes", sequence.len());
        self.preview = Some(Preview {
            player,
            progress: Box::new(progress),
        });
        self.advance_preview(now);
        Ok(true)
    }

    pub fn stop_preview(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            let now = self.clock.now();
            preview.player.cancel(now, &mut self.sink, &self.config.synth);
        }
    }

    /// Run one step of the frame loop. Returns whether the host should keep
    /// scheduling ticks.
    pub fn tick(&mut self) -> bool {
        if !self.is_processing() && self.preview.is_none() {
            return false;
        }
        self.apply_pending_config();
        let now = self.clock.now();

        if self.is_processing() {
            self.process_frame(now);
        } else {
            self.advance_preview(now);
        }
        self.is_processing() || self.preview.is_some()
    }

    fn apply_pending_config(&mut self) {
        if let Some(config) = self.pending_config.take() {
            log::debug!("Applying new configuration");
            self.config = config;
        }
    }

    fn advance_preview(&mut self, now: f64) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        let state = preview.player.advance(
            now,
            &mut self.sink,
            &self.voicing,
            &self.config.synth,
            &mut *preview.progress,
        );
        if state == PlaybackState::Finished {
            log::debug!("Preview finished");
            self.preview = None;
        }
    }

    fn process_frame(&mut self, now: f64) {
        let Phase::Running(session) = &mut self.phase else {
            return;
        };
        session.frames += 1;
        let mode = session.info.mode;
        let frame = session.source.pull();
        let estimate = estimate_frame(&mut self.detector, frame, self.config.sensitivity);

        if let Some(event) = self.stabilizer.process(&estimate, now, &self.config) {
            self.dispatch(event, mode);
        }
    }

    fn dispatch(&mut self, event: NoteEvent, mode: SessionMode) {
        match (event, mode) {
            (NoteEvent::On { midi, at }, SessionMode::Live) => {
                self.live
                    .note_on(&mut self.sink, &self.voicing, midi, at, &self.config.synth);
            }
            (NoteEvent::On { midi, at }, SessionMode::Recording) => self.recorder.note_on(midi, at),
            (NoteEvent::Off { at, .. }, SessionMode::Live) => {
                self.live.note_off(&mut self.sink, at, &self.config.synth)
            }
            (NoteEvent::Off { at, .. }, SessionMode::Recording) => self.recorder.note_off(at),
        }
        let midi = match event {
            NoteEvent::On { midi, .. } => Some(midi),
            NoteEvent::Off { .. } => None,
        };
        self.notify(midi);
    }

    fn notify(&mut self, midi: Option<u8>) {
        if let Some(sender) = &self.events {
            if sender.send(NoteChange::new(midi)).is_err() {
                log::debug!("Note event receiver dropped");
                self.events = None;
            }
        }
    }
}

/// Estimate the pitch of `frame`, (re)planning the detector when the frame length
/// changes. Frames that cannot be analysed count as silence.
fn estimate_frame(
    detector: &mut Option<AutocorrelationDetector<f32>>,
    frame: AudioFrame<'_>,
    sensitivity: f64,
) -> PitchEstimate<f32> {
    let len = frame.samples.len();
    if len == 0 {
        return PitchEstimate::no_pitch(0.0);
    }

    if detector.as_ref().is_some_and(|d| d.size() != len) {
        *detector = None;
    }
    let detector = detector.get_or_insert_with(|| {
        log::debug!("Planning pitch detector for {}-sample frames", len);
        AutocorrelationDetector::new(len)
    });

    match detector.estimate_with(frame.samples, frame.sample_rate, sensitivity) {
        Ok(estimate) => estimate,
        Err(err) => {
            log::debug!("Skipping frame: {}", err);
            PitchEstimate::no_pitch(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::source::ReadyGate;
    use crate::synth::testing::{Call, RecordingSink};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    const RATE: usize = 44100;
    const SIZE: usize = 2048;

    /// Plays back prepared frames, then silence.
    struct Script {
        frames: VecDeque<Vec<f32>>,
        current: Vec<f32>,
    }

    impl Script {
        fn new(frames: Vec<Vec<f32>>) -> Self {
            Script {
                frames: frames.into(),
                current: vec![0.0; SIZE],
            }
        }
    }

    impl FrameSource for Script {
        fn pull(&mut self) -> AudioFrame<'_> {
            self.current = self.frames.pop_front().unwrap_or_else(|| vec![0.0; SIZE]);
            AudioFrame {
                samples: &self.current,
                sample_rate: RATE,
            }
        }
    }

    struct DenyingGate;

    impl MicrophoneGate for DenyingGate {
        type Stream = Script;

        async fn request_microphone(&mut self) -> Result<Script, MicrophoneError> {
            Err(MicrophoneError::PermissionDenied)
        }
    }

    fn tone(freq: f64) -> Vec<f32> {
        (0..SIZE)
            .map(|i| {
                let t = i as f64 / RATE as f64;
                (0.5 * (2.0 * std::f64::consts::PI * freq * t).sin()) as f32
            })
            .collect()
    }

    fn engine() -> (Engine<Script, RecordingSink, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Engine::new(RecordingSink::default(), clock.clone()), clock)
    }

    #[test]
    fn permission_denied_leaves_engine_idle() {
        let (mut engine, _) = engine();
        let result = pollster::block_on(engine.start(SessionMode::Live, &mut DenyingGate));
        assert!(matches!(result, Err(EngineError::PermissionDenied)));
        assert_eq!(engine.mode(), EngineMode::Idle);
        assert!(!engine.tick());
    }

    #[test]
    fn audio_init_failure_is_surfaced() {
        let (mut engine, _) = engine();
        engine.sink_mut().fail_resume = true;
        let mut gate = ReadyGate::new(Script::new(vec![]));
        let result = pollster::block_on(engine.start(SessionMode::Recording, &mut gate));
        assert!(matches!(result, Err(EngineError::AudioInit(_))));
        assert_eq!(engine.mode(), EngineMode::Idle);

        engine.sink_mut().fail_resume = false;
        let info = pollster::block_on(engine.start(SessionMode::Recording, &mut gate)).unwrap();
        assert_eq!(info.mode, SessionMode::Recording);
        assert_eq!(engine.sink().resumes, 2);
    }

    #[test]
    fn resume_output_can_be_repeated() {
        let (mut engine, _) = engine();
        pollster::block_on(engine.resume_output()).unwrap();
        pollster::block_on(engine.resume_output()).unwrap();
        assert_eq!(engine.sink().resumes, 2);

        engine.sink_mut().fail_resume = true;
        assert!(matches!(
            pollster::block_on(engine.resume_output()),
            Err(EngineError::AudioInit(_))
        ));
        assert_eq!(engine.mode(), EngineMode::Idle);
    }

    #[test]
    fn starting_twice_returns_running_session() {
        let (mut engine, _) = engine();
        let mut gate = ReadyGate::new(Script::new(vec![]));
        let first = pollster::block_on(engine.start(SessionMode::Live, &mut gate)).unwrap();
        // The gate is spent; a second start must not reach it.
        let second = pollster::block_on(engine.start(SessionMode::Recording, &mut gate)).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.mode(), EngineMode::Live);
    }

    #[test]
    fn stale_completion_after_stop_is_discarded() {
        let (mut engine, _) = engine();
        let StartStep::Pending(ticket) = engine.begin_start(SessionMode::Recording) else {
            panic!("expected a pending start");
        };
        engine.stop();
        let result = engine.complete_start(ticket, Ok(Script::new(vec![])));
        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert_eq!(engine.mode(), EngineMode::Idle);
        assert!(engine.sink().calls.is_empty());
    }

    #[test]
    fn superseded_start_is_discarded() {
        let (mut engine, _) = engine();
        let StartStep::Pending(old) = engine.begin_start(SessionMode::Live) else {
            panic!("expected a pending start");
        };
        engine.stop();
        let StartStep::Pending(new) = engine.begin_start(SessionMode::Recording) else {
            panic!("expected a pending start");
        };
        assert!(matches!(
            engine.complete_start(old, Ok(Script::new(vec![]))),
            Err(EngineError::Cancelled)
        ));
        engine.complete_start(new, Ok(Script::new(vec![]))).unwrap();
        assert_eq!(engine.mode(), EngineMode::Recording);
    }

    #[test]
    fn pending_start_is_shared() {
        let (mut engine, _) = engine();
        let StartStep::Pending(first) = engine.begin_start(SessionMode::Live) else {
            panic!("expected a pending start");
        };
        let StartStep::Pending(second) = engine.begin_start(SessionMode::Recording) else {
            panic!("expected a pending start");
        };
        assert_eq!(second.mode(), SessionMode::Live);
        let info = engine.complete_start(first, Ok(Script::new(vec![]))).unwrap();
        assert_eq!(engine.complete_start(second, Ok(Script::new(vec![]))).unwrap(), info);
    }

    #[test]
    fn live_session_drives_tone_generator() {
        let (mut engine, clock) = engine();
        let events = engine.subscribe();
        let frames = vec![tone(440.0), tone(440.0), tone(440.0), vec![0.0; SIZE]];
        let mut gate = ReadyGate::new(Script::new(frames));
        pollster::block_on(engine.start(SessionMode::Live, &mut gate)).unwrap();

        for _ in 0..4 {
            clock.advance(0.02);
            assert!(engine.tick());
        }

        let changes: Vec<NoteChange> = events.try_iter().collect();
        assert_eq!(
            changes,
            vec![
                NoteChange {
                    midi: Some(69),
                    name: Some("A4".into())
                },
                NoteChange {
                    midi: None,
                    name: None
                },
            ]
        );
        assert_eq!(
            engine.sink().calls,
            vec![
                Call::Level(0.0),
                Call::Frequency(440.0),
                Call::Level(0.3),
                Call::Level(0.0),
            ]
        );
        assert!(engine.sequence().is_empty());
    }

    #[test]
    fn recording_is_silent_capture() {
        let (mut engine, clock) = engine();
        let frames = vec![tone(440.0), tone(440.0), tone(440.0)];
        let mut gate = ReadyGate::new(Script::new(frames));
        pollster::block_on(engine.start(SessionMode::Recording, &mut gate)).unwrap();
        for _ in 0..5 {
            clock.advance(0.1);
            engine.tick();
        }
        engine.stop();

        assert_eq!(engine.sink().calls, vec![Call::Level(0.0)]);
        let sequence = engine.sequence();
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.notes()[0].midi, 69);
        assert!((sequence.notes()[0].start_time_seconds - 0.2).abs() < 1e-9);
        assert!((sequence.notes()[0].duration_seconds - 0.2).abs() < 1e-9);
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut engine, clock) = engine();
        let events = engine.subscribe();
        let mut gate = ReadyGate::new(Script::new(vec![tone(440.0), tone(440.0)]));
        pollster::block_on(engine.start(SessionMode::Recording, &mut gate)).unwrap();
        clock.advance(0.1);
        engine.tick();
        clock.advance(0.1);
        engine.tick();

        clock.advance(0.1);
        engine.stop();
        let once = (engine.mode(), engine.sequence(), engine.sink().calls.clone());
        let sent = events.try_iter().count();

        clock.advance(0.1);
        engine.stop();
        assert_eq!((engine.mode(), engine.sequence(), engine.sink().calls.clone()), once);
        assert_eq!(events.try_iter().count(), 0);
        assert_eq!(sent, 2);
        assert!(!engine.tick());
    }

    #[test]
    fn configuration_applies_on_next_tick() {
        let (mut engine, _) = engine();
        let shifted = EngineConfig::default().with_octave_shift(1);
        engine.configure(shifted.clone()).unwrap();
        assert_eq!(engine.config(), &EngineConfig::default());

        let mut gate = ReadyGate::new(Script::new(vec![]));
        pollster::block_on(engine.start(SessionMode::Live, &mut gate)).unwrap();
        assert_eq!(engine.config(), &shifted);

        assert!(engine
            .configure(EngineConfig::default().with_sensitivity(0.0))
            .is_err());
        assert_eq!(engine.config(), &shifted);
    }

    #[test]
    fn bad_frames_do_not_end_the_session() {
        let (mut engine, clock) = engine();
        let mut broken = tone(440.0);
        broken[10] = f32::NAN;
        let frames = vec![broken, vec![0.0; 7], vec![], tone(440.0)];
        let mut gate = ReadyGate::new(Script::new(frames));
        pollster::block_on(engine.start(SessionMode::Live, &mut gate)).unwrap();
        for _ in 0..4 {
            clock.advance(0.02);
            assert!(engine.tick());
        }
        assert_eq!(engine.mode(), EngineMode::Live);
        assert_eq!(
            engine.stabilizer_phase(),
            StabilizerPhase::Candidate { midi: 69, count: 1 }
        );
    }

    #[test]
    fn preview_plays_recording_when_idle() {
        let (mut engine, clock) = engine();
        assert_eq!(engine.preview(|_| {}).unwrap(), false);

        let frames = vec![tone(440.0), tone(440.0), vec![0.0; SIZE]];
        let mut gate = ReadyGate::new(Script::new(frames));
        pollster::block_on(engine.start(SessionMode::Recording, &mut gate)).unwrap();
        assert!(matches!(engine.preview(|_| {}), Err(EngineError::SessionActive)));
        for _ in 0..3 {
            clock.advance(0.1);
            engine.tick();
        }
        engine.stop();

        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reports);
        assert!(engine.preview(move |p| sink.borrow_mut().push(p)).unwrap());
        assert!(engine.is_previewing());
        while engine.tick() {
            clock.advance(0.05);
        }
        assert!(!engine.is_previewing());
        assert_eq!(*reports.borrow(), vec![0.0, 100.0, 0.0]);
    }

    #[test]
    fn instrument_failure_falls_back_to_tone() {
        let (mut engine, _) = engine();
        assert_eq!(
            engine.select_instrument("piano"),
            &Voicing::Instrument("piano".into())
        );
        assert_eq!(
            engine.select_instrument("missing-harp"),
            &Voicing::ToneGenerator
        );
    }
}
