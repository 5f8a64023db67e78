use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::float::{from_usize, Float};
use crate::utils::buffer::{copy_complex_to_real, copy_real_to_complex, modulus_squared};
use crate::utils::buffer::{new_complex_buffer, new_real_buffer};
use crate::utils::peak::{correct_peak, max_positive_peak, PeakCorrection};

/// Result of analysing one audio frame. A `frequency` of `None` means "no pitch";
/// `clarity` is then zero. `volume` is the root mean square of the frame and is
/// reported even when no pitch was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate<T>
where
    T: Float,
{
    pub frequency: Option<T>,
    pub clarity: T,
    pub volume: T,
}

impl<T: Float> PitchEstimate<T> {
    pub fn no_pitch(volume: T) -> Self {
        PitchEstimate {
            frequency: None,
            clarity: T::zero(),
            volume,
        }
    }

    pub fn is_pitched(&self) -> bool {
        self.frequency.is_some()
    }
}

/// Planned transforms and scratch space for the autocorrelation of frames of
/// `size` samples. Buffers are allocated once and reused for every frame.
pub struct DetectorInternals<T>
where
    T: Float,
{
    pub size: usize,
    pub padding: usize,
    fft: Arc<dyn Fft<T>>,
    inv_fft: Arc<dyn Fft<T>>,
    signal_complex: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
    pub autocorr: Vec<T>,
}

impl<T> DetectorInternals<T>
where
    T: Float,
{
    pub fn new(size: usize, padding: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size + padding);
        let inv_fft = planner.plan_fft_inverse(size + padding);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(inv_fft.get_inplace_scratch_len());

        DetectorInternals {
            size,
            padding,
            fft,
            inv_fft,
            signal_complex: new_complex_buffer(size + padding),
            scratch: new_complex_buffer(scratch_len),
            autocorr: new_real_buffer(size),
        }
    }

    /// Compute the autocorrelation of `signal` into `self.autocorr`.
    ///
    /// With at least `signal.len()` samples of zero padding the circular correlation
    /// computed by the FFT equals the linear one,
    ///
    /// > c(t) = sum_{i=0}^{n-1-t} x_i*x_{i+t}
    pub fn autocorrelation(&mut self, signal: &[T]) {
        assert!(signal.len() <= self.size);
        assert!(
            self.padding >= signal.len(),
            "Padding must be at least the signal length to avoid wrap-around"
        );

        copy_real_to_complex(signal, &mut self.signal_complex);
        self.fft
            .process_with_scratch(&mut self.signal_complex, &mut self.scratch);
        modulus_squared(&mut self.signal_complex);
        self.inv_fft
            .process_with_scratch(&mut self.signal_complex, &mut self.scratch);
        copy_complex_to_real(&self.signal_complex, &mut self.autocorr);

        // rustfft doesn't normalize, and fft -> inverse fft scales by the transform length.
        let normalization_const = T::one() / from_usize(self.size + self.padding);
        self.autocorr
            .iter_mut()
            .for_each(|c| *c = *c * normalization_const);
    }
}

/// Index just past the descent from the zero-lag peak: the first lag where the
/// autocorrelation stops decreasing.
pub fn end_of_initial_descent<T: Float>(autocorr: &[T]) -> usize {
    let mut lag = 0;
    while lag + 1 < autocorr.len() && autocorr[lag] > autocorr[lag + 1] {
        lag += 1;
    }
    lag
}

/// Pick the strongest lag in `[min_lag, max_lag]` (skipping the initial descent from lag
/// zero) and turn it into a frequency and clarity. Returns `None` when `c(0)` is zero or
/// when no lag in range correlates positively.
pub fn pitch_from_autocorrelation<T: Float>(
    autocorr: &[T],
    sample_rate: usize,
    min_lag: usize,
    max_lag: usize,
    correction: PeakCorrection,
) -> Option<(T, T)> {
    let energy = *autocorr.first()?;
    if energy <= T::zero() {
        return None;
    }

    let start = min_lag.max(end_of_initial_descent(autocorr));
    let stop = (max_lag + 1).min(autocorr.len());
    let peak = max_positive_peak(autocorr, start..stop)?;
    let (lag, value) = correct_peak(peak, autocorr, correction);
    if lag <= T::zero() {
        return None;
    }

    let frequency = from_usize::<T>(sample_rate) / lag;
    let clarity = (value / energy).min(T::one()).max(T::zero());
    Some((frequency, clarity))
}

/// Lag bounds `(min_lag, max_lag)` for frames of `size` samples at `sample_rate`, given
/// the pitch range the detector is allowed to report.
///
/// `min_lag` rounds down so that the period of a pitch just under `max_frequency` is
/// still searched; otherwise its octave below would win.
pub fn lag_range(
    size: usize,
    sample_rate: usize,
    min_frequency: f64,
    max_frequency: f64,
) -> (usize, usize) {
    const MIN_LAG_FLOOR: usize = 2;
    let rate = sample_rate as f64;
    let min_lag = ((rate / max_frequency).floor() as usize).max(MIN_LAG_FLOOR);
    let max_lag = ((rate / min_frequency).floor() as usize).min(size / 2);
    (min_lag, max_lag)
}

/// Whether every sample is a finite number.
pub fn all_finite<T: Float>(signal: &[T]) -> bool {
    signal.iter().all(|s| s.is_finite())
}
