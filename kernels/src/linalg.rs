//! Reduction kernels: dot product, Euclidean norm, normalization.

use crate::chunk;

/// `Σ a[i] * b[i]`
///
/// Returns `0.0` for empty input.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    chunk::sum_pairs(a, b, |x, y| x * y)
}

/// `sqrt(Σ x[i]^2)`
///
/// No rescaling is applied, so the sum of squares can overflow to infinity for
/// elements above roughly `1e154`, exactly as the plain formula does.
pub fn magnitude(x: &[f64]) -> f64 {
    chunk::sum_pairs(x, x, |v, _| v * v).sqrt()
}

/// `out[i] = x[i] / magnitude(x)`
///
/// A zero vector normalizes to a zero vector. A NaN or infinite magnitude is
/// divided through unchanged and propagates per IEEE-754.
pub fn normalize(out: &mut [f64], x: &[f64]) {
    let mag = magnitude(x);
    if mag == 0.0 {
        out.iter_mut().for_each(|o| *o = 0.0);
        return;
    }
    chunk::unary(out, x, |v| v / mag);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn test_magnitude() {
        assert_eq!(magnitude(&[3.0, 4.0]), 5.0);
        assert_eq!(magnitude(&[]), 0.0);
        assert!(magnitude(&[1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_normalize() {
        let mut out = [0.0; 2];
        normalize(&mut out, &[3.0, 4.0]);
        assert_eq!(out, [0.6, 0.8]);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut out = [7.0; 3];
        normalize(&mut out, &[0.0, -0.0, 0.0]);
        assert_eq!(out, [0.0; 3]);
    }
}
