//! Where frames come from: the microphone gate and frame sources.

use crate::error::MicrophoneError;

/// The most recent window of input samples and the rate they were captured at.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    pub samples: &'a [f32],
    pub sample_rate: usize,
}

pub trait FrameSource {
    /// Return the most recent window. Sources without an input device may return
    /// a buffer of zeros.
    fn pull(&mut self) -> AudioFrame<'_>;
}

/// Grants access to an input stream. Requesting access may prompt the user, so it
/// is asynchronous; a refusal is reported, never retried.
#[allow(async_fn_in_trait)]
pub trait MicrophoneGate {
    type Stream: FrameSource;

    async fn request_microphone(&mut self) -> Result<Self::Stream, MicrophoneError>;
}

/// Frames read from an in-memory recording: each pull returns the next window of
/// `window` samples and moves forward by `hop`. Past the end of the data the tail
/// is zero-filled, and once exhausted every frame is silent.
#[derive(Debug, Clone)]
pub struct SliceSource {
    samples: Vec<f32>,
    sample_rate: usize,
    window: usize,
    hop: usize,
    position: usize,
    frame: Vec<f32>,
}

impl SliceSource {
    pub fn new(samples: Vec<f32>, sample_rate: usize, window: usize, hop: usize) -> Self {
        Self {
            samples,
            sample_rate,
            window,
            hop: hop.max(1),
            position: 0,
            frame: vec![0.0; window],
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }

    pub fn hop_seconds(&self) -> f64 {
        self.hop as f64 / self.sample_rate as f64
    }
}

impl FrameSource for SliceSource {
    fn pull(&mut self) -> AudioFrame<'_> {
        let start = self.position.min(self.samples.len());
        let stop = (start + self.window).min(self.samples.len());
        let available = stop - start;

        self.frame[..available].copy_from_slice(&self.samples[start..stop]);
        self.frame[available..].fill(0.0);
        self.position = self.position.saturating_add(self.hop);

        AudioFrame {
            samples: &self.frame,
            sample_rate: self.sample_rate,
        }
    }
}

/// A gate that hands out a prepared stream once. Useful when the input is already
/// available, e.g. a decoded file.
#[derive(Debug)]
pub struct ReadyGate<S> {
    stream: Option<S>,
}

impl<S> ReadyGate<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

impl<S: FrameSource> MicrophoneGate for ReadyGate<S> {
    type Stream = S;

    async fn request_microphone(&mut self) -> Result<S, MicrophoneError> {
        self.stream
            .take()
            .ok_or_else(|| MicrophoneError::Unavailable("stream already handed out".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_windows_and_pads() {
        let mut source = SliceSource::new((1..=5).map(|x| x as f32).collect(), 10, 3, 2);
        assert_eq!(source.pull().samples, &[1.0, 2.0, 3.0]);
        assert_eq!(source.pull().samples, &[3.0, 4.0, 5.0]);
        assert_eq!(source.pull().samples, &[5.0, 0.0, 0.0]);
        assert!(source.is_exhausted());
        assert_eq!(source.pull().samples, &[0.0, 0.0, 0.0]);
        assert_eq!(source.pull().sample_rate, 10);
    }

    #[test]
    fn ready_gate_hands_out_once() {
        let mut gate = ReadyGate::new(SliceSource::new(vec![0.0; 4], 8000, 4, 4));
        assert!(pollster::block_on(gate.request_microphone()).is_ok());
        assert!(matches!(
            pollster::block_on(gate.request_microphone()),
            Err(MicrophoneError::Unavailable(_))
        ));
    }
}
