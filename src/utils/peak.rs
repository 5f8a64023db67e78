use crate::float::{from_f64, from_usize, Float};

/// How the position of an autocorrelation peak is refined after the integer
/// lag with the largest value has been found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakCorrection {
    Quadratic,
    #[default]
    None,
}

struct Point<T: Float> {
    x: T,
    y: T,
}

/// Index of the largest value of `data` in `range`, provided it is strictly positive.
pub fn max_positive_peak<T: Float>(
    data: &[T],
    range: std::ops::Range<usize>,
) -> Option<(usize, T)> {
    let mut best: Option<(usize, T)> = None;
    for (idx, &value) in data.iter().enumerate().take(range.end).skip(range.start) {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.filter(|&(_, value)| value > T::zero())
}

/// Refine `peak` (an index into `data` and its value) into a fractional position.
/// Peaks on the edges of `data` cannot be interpolated and are returned unchanged.
pub fn correct_peak<T: Float>(peak: (usize, T), data: &[T], correction: PeakCorrection) -> (T, T) {
    let idx = peak.0;
    match correction {
        PeakCorrection::Quadratic if idx > 0 && idx + 1 < data.len() => {
            let point = quadratic_interpolation(
                Point {
                    x: from_usize(idx - 1),
                    y: data[idx - 1],
                },
                Point {
                    x: from_usize(idx),
                    y: data[idx],
                },
                Point {
                    x: from_usize(idx + 1),
                    y: data[idx + 1],
                },
            );
            (point.x, point.y)
        }
        _ => (from_usize(idx), peak.1),
    }
}

fn quadratic_interpolation<T: Float>(
    left: Point<T>,
    center: Point<T>,
    right: Point<T>,
) -> Point<T> {
    let denominator = from_f64::<T>(2.0) * center.y - left.y - right.y;
    if denominator == T::zero() {
        return center;
    }
    let shift = from_f64::<T>(0.5) * (right.y - left.y) / denominator;
    let x = center.x + shift;
    let y = center.y + from_f64::<T>(0.25) * (right.y - left.y) * shift;
    Point { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_correction() {
        let point = quadratic_interpolation(
            Point {
                x: -1.5,
                y: -(1.5 * 1.5) + 4.0,
            },
            Point {
                x: -0.5,
                y: -(0.5 * 0.5) + 4.0,
            },
            Point {
                x: 0.5,
                y: -(0.5 * 0.5) + 4.0,
            },
        );
        assert_eq!(point.x, 0.0);
        assert_eq!(point.y, 4.0);
    }

    #[test]
    fn flat_top_is_left_alone() {
        let data = [1.0f64, 1.0, 1.0];
        assert_eq!(correct_peak((1, 1.0), &data, PeakCorrection::Quadratic), (1.0, 1.0));
    }

    #[test]
    fn max_positive_peak_prefers_first_maximum() {
        let data = [9.0f64, 0.5, 2.0, 2.0, 1.0];
        assert_eq!(max_positive_peak(&data, 1..5), Some((2, 2.0)));
    }

    #[test]
    fn max_positive_peak_fails_closed() {
        let data = [1.0f64, -0.5, -0.25, 0.0];
        assert_eq!(max_positive_peak(&data, 1..4), None);
        assert_eq!(max_positive_peak(&data, 3..3), None);
    }
}
