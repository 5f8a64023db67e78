//! Generic [Float] type which acts as a stand-in for `f32` or `f64`.
use rustfft::num_traits::float::FloatCore as NumFloatCore;
use rustfft::FftNum;
use std::fmt::{Debug, Display};

/// Audio frames are processed as arrays of [Float]s. A [Float] is normally `f32` or `f64`.
pub trait Float: Display + Debug + NumFloatCore + FftNum {}

impl Float for f64 {}
impl Float for f32 {}

/// Widen a sample value to `f64` for the few operations `FloatCore` lacks (`sqrt`, `log2`).
pub fn to_f64<T: Float>(value: T) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Narrow an `f64` back into the sample type.
pub fn from_f64<T: Float>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::zero)
}

/// Convert an index or length into the sample type.
pub fn from_usize<T: Float>(value: usize) -> T {
    T::from_usize(value).unwrap_or_else(T::zero)
}
