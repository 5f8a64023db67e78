use crate::error::FrameError;
use crate::float::Float;

pub use internals::PitchEstimate;

pub mod autocorrelation;
pub mod internals;

/// Clarity below which an estimate should be treated as unreliable.
pub const DEFAULT_CLARITY_THRESHOLD: f64 = 0.5;

pub trait PitchDetector<T>
where
    T: Float,
{
    /// Analyse one frame. Silence and frames without a usable periodicity are not
    /// errors; they yield an estimate without a frequency. Errors are reserved for
    /// frames the detector cannot analyse at all.
    fn estimate(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        power_threshold: T,
    ) -> Result<PitchEstimate<T>, FrameError>;
}
