use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use crate::float::Float;

pub fn new_real_buffer<T: Float>(size: usize) -> Vec<T> {
    vec![T::zero(); size]
}

pub fn new_complex_buffer<T: Float>(size: usize) -> Vec<Complex<T>> {
    vec![Complex::zero(); size]
}

/// Copy `input` into the real part of `output`, zeroing the imaginary parts and
/// everything in `output` past the end of `input`.
pub fn copy_real_to_complex<T: Float>(input: &[T], output: &mut [Complex<T>]) {
    assert!(input.len() <= output.len());
    input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
        o.re = *i;
        o.im = T::zero();
    });
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

/// Copy the real part of `input` into `output`. Only `output.len()` values are
/// copied; if `input` is shorter the rest of `output` is zeroed.
pub fn copy_complex_to_real<T: Float>(input: &[Complex<T>], output: &mut [T]) {
    output
        .iter_mut()
        .zip(input.iter().map(|c| c.re).chain(std::iter::repeat(T::zero())))
        .for_each(|(o, i)| *o = i);
}

/// Computes |x|^2 for each complex value x in `arr`. This function
/// modifies `arr` in place and leaves the complex component zero.
pub fn modulus_squared<T: Float>(arr: &mut [Complex<T>]) {
    for s in arr {
        s.re = s.re * s.re + s.im * s.im;
        s.im = T::zero();
    }
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T>(arr: &[T]) -> T
where
    T: Float + std::iter::Sum,
{
    arr.iter().map(|&s| s * s).sum::<T>()
}

/// Root mean square of `arr`, or zero for an empty slice.
pub fn root_mean_square<T>(arr: &[T]) -> T
where
    T: Float + std::iter::Sum,
{
    if arr.is_empty() {
        return T::zero();
    }
    let mean = crate::float::to_f64(square_sum(arr)) / arr.len() as f64;
    crate::float::from_f64(mean.sqrt())
}
