//! Time-domain autocorrelation pitch detection.
//!
//! Let $S=(s_0,s_1,\ldots,s_{N-1})$ be one frame. The detector computes
//! $$ c(t) = \sum_{i=0}^{N-1-t} s_i s_{i+t} $$
//! and reports the lag $t^\*$ with the largest $c(t)$ in its search range as the pitch
//! period, so the frequency is `sample_rate / t*` and the clarity is $c(t^\*)/c(0)$.
//!
//! The search range starts after the descent from the zero-lag peak and never below the
//! period of the highest reportable pitch, rounded down to a whole lag. It ends at half
//! the frame, or at the lag of the lowest reportable pitch if that comes first, so that
//! at least half of the frame overlaps at every candidate lag.
//!
//! ## Implementation
//! $c(t)$ is computed with a zero-padded
//! [FFT](https://en.wikipedia.org/wiki/Fast_Fourier_transform) rather than the
//! quadratic direct sum. Frames quieter than the power threshold
//! (measured as root mean square) never reach the transform.

use crate::detector::internals::{all_finite, lag_range, pitch_from_autocorrelation};
use crate::detector::internals::{DetectorInternals, PitchEstimate};
use crate::detector::PitchDetector;
use crate::error::{ConfigError, FrameError};
use crate::float::{from_f64, Float};
use crate::utils::buffer::root_mean_square;
use crate::utils::peak::PeakCorrection;

pub const DEFAULT_MIN_FREQUENCY: f64 = 50.0;
pub const DEFAULT_MAX_FREQUENCY: f64 = 2000.0;

pub struct AutocorrelationDetector<T>
where
    T: Float,
{
    internals: DetectorInternals<T>,
    min_frequency: f64,
    max_frequency: f64,
    correction: PeakCorrection,
}

impl<T> AutocorrelationDetector<T>
where
    T: Float,
{
    pub fn new(size: usize) -> Self {
        let internals = DetectorInternals::new(size, size);
        AutocorrelationDetector {
            internals,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_frequency: DEFAULT_MAX_FREQUENCY,
            correction: PeakCorrection::None,
        }
    }

    /// Restrict reported pitches to `[min_frequency, max_frequency]` Hz.
    ///
    /// Both bounds must be finite with `0 < min_frequency < max_frequency`.
    pub fn with_frequency_range(
        mut self,
        min_frequency: f64,
        max_frequency: f64,
    ) -> Result<Self, ConfigError> {
        let valid = min_frequency.is_finite()
            && max_frequency.is_finite()
            && min_frequency > 0.0
            && min_frequency < max_frequency;
        if !valid {
            return Err(ConfigError::InvalidFrequencyRange {
                min: min_frequency,
                max: max_frequency,
            });
        }
        self.min_frequency = min_frequency;
        self.max_frequency = max_frequency;
        Ok(self)
    }

    pub fn with_peak_correction(mut self, correction: PeakCorrection) -> Self {
        self.correction = correction;
        self
    }

    /// Frame length this detector was planned for.
    pub fn size(&self) -> usize {
        self.internals.size
    }
}

impl<T> PitchDetector<T> for AutocorrelationDetector<T>
where
    T: Float + std::iter::Sum,
{
    fn estimate(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        power_threshold: T,
    ) -> Result<PitchEstimate<T>, FrameError> {
        if signal.len() != self.internals.size {
            return Err(FrameError::LengthMismatch {
                expected: self.internals.size,
                actual: signal.len(),
            });
        }
        if !all_finite(signal) {
            return Err(FrameError::NonFinite);
        }

        let (min_lag, max_lag) = lag_range(
            signal.len(),
            sample_rate,
            self.min_frequency,
            self.max_frequency,
        );
        if min_lag >= max_lag {
            return Err(FrameError::TooShort {
                len: signal.len(),
                min: 2 * (min_lag + 1),
            });
        }

        let volume = root_mean_square(signal);
        if volume < power_threshold {
            return Ok(PitchEstimate::no_pitch(volume));
        }

        self.internals.autocorrelation(signal);

        let estimate = match pitch_from_autocorrelation(
            &self.internals.autocorr,
            sample_rate,
            min_lag,
            max_lag,
            self.correction,
        ) {
            Some((frequency, clarity)) => PitchEstimate {
                frequency: Some(frequency),
                clarity,
                volume,
            },
            None => PitchEstimate::no_pitch(volume),
        };
        Ok(estimate)
    }
}

impl<T> AutocorrelationDetector<T>
where
    T: Float + std::iter::Sum,
{
    /// Convenience wrapper taking the power threshold as `f64`.
    pub fn estimate_with(
        &mut self,
        signal: &[T],
        sample_rate: usize,
        power_threshold: f64,
    ) -> Result<PitchEstimate<T>, FrameError> {
        self.estimate(signal, sample_rate, from_f64(power_threshold))
    }
}
