//! Error types for the engine and its collaborators.

use thiserror::Error;

/// Why a single frame could not be analysed. The engine treats every variant as
/// "no pitch for this frame"; none of them end a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has {actual} samples, detector expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("frame of {len} samples is too short to search for a pitch (need at least {min})")]
    TooShort { len: usize, min: usize },

    #[error("frame contains non-finite samples")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("a scale needs at least one pitch class")]
    Empty,

    #[error("scale offset {0} is outside 0..=11")]
    OffsetOutOfRange(u8),

    #[error("unknown scale \"{0}\"")]
    UnknownName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sensitivity threshold must be positive, got {0}")]
    NonPositiveSensitivity(f64),

    #[error("clarity threshold must be within 0..=1, got {0}")]
    ClarityOutOfRange(f64),

    #[error("stability threshold must be at least one frame")]
    ZeroStabilityFrames,

    #[error("invalid timing parameter {name}: {value}")]
    InvalidTiming { name: &'static str, value: f64 },

    #[error("invalid frequency range {min}..{max} Hz")]
    InvalidFrequencyRange { min: f64, max: f64 },

    #[error("invalid scale: {0}")]
    Scale(#[from] ScaleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures reported by the microphone permission/device gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicrophoneError {
    #[error("microphone access denied")]
    PermissionDenied,

    #[error("microphone unavailable: {0}")]
    Unavailable(String),
}

/// The audio output device could not be opened or resumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("audio output unavailable: {0}")]
pub struct AudioInitError(pub String);

/// A sampled instrument could not be loaded. Never fatal: the engine falls back to
/// the built-in tone generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load instrument \"{id}\": {reason}")]
pub struct InstrumentLoadFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("microphone access denied")]
    PermissionDenied,

    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error(transparent)]
    AudioInit(#[from] AudioInitError),

    #[error("session start was cancelled by stop()")]
    Cancelled,

    #[error("a live or recording session is active")]
    SessionActive,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl From<MicrophoneError> for EngineError {
    fn from(err: MicrophoneError) -> Self {
        match err {
            MicrophoneError::PermissionDenied => EngineError::PermissionDenied,
            MicrophoneError::Unavailable(reason) => EngineError::MicrophoneUnavailable(reason),
        }
    }
}
