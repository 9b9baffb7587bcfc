//! Elementwise arithmetic kernels.
//!
//! Each output element is a single IEEE-754 operation on the matching input
//! elements, so results are exactly those of scalar arithmetic.

use crate::chunk;

/// `out[i] = a[i] + b[i]`
///
/// # Test Cases
/// - add([1, 2], [3, 4]) = [4, 6]
pub fn add(out: &mut [f64], a: &[f64], b: &[f64]) {
    chunk::binary(out, a, b, |x, y| x + y);
}

/// `out[i] = a[i] - b[i]`
pub fn sub(out: &mut [f64], a: &[f64], b: &[f64]) {
    chunk::binary(out, a, b, |x, y| x - y);
}

/// `out[i] = a[i] * b[i]`
pub fn mul(out: &mut [f64], a: &[f64], b: &[f64]) {
    chunk::binary(out, a, b, |x, y| x * y);
}

/// `out[i] = a[i] / b[i]`
///
/// Division by zero follows IEEE-754: `±Inf` for a non-zero numerator, NaN for `0/0`.
pub fn div(out: &mut [f64], a: &[f64], b: &[f64]) {
    chunk::binary(out, a, b, |x, y| x / y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ops() {
        let a = [1.0, 2.0, 10.0];
        let b = [3.0, 4.0, 2.0];
        let mut out = [0.0; 3];

        add(&mut out, &a, &b);
        assert_eq!(out, [4.0, 6.0, 12.0]);
        sub(&mut out, &a, &b);
        assert_eq!(out, [-2.0, -2.0, 8.0]);
        mul(&mut out, &a, &b);
        assert_eq!(out, [3.0, 8.0, 20.0]);
        div(&mut out, &a, &b);
        assert_eq!(out, [1.0 / 3.0, 0.5, 5.0]);
    }

    #[test]
    fn test_div_by_zero() {
        let a = [1.0, -1.0, 0.0];
        let b = [0.0, 0.0, 0.0];
        let mut out = [0.0; 3];
        div(&mut out, &a, &b);
        assert_eq!(out[0], f64::INFINITY);
        assert_eq!(out[1], f64::NEG_INFINITY);
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_add_exact() {
        let a = [0.1, 1e308, -0.0];
        let b = [0.2, 1e308, 0.0];
        let mut out = [0.0; 3];
        add(&mut out, &a, &b);
        assert_eq!(out[0].to_bits(), (0.1f64 + 0.2f64).to_bits());
        assert_eq!(out[1], f64::INFINITY);
        assert_eq!(out[2].to_bits(), 0.0f64.to_bits());
    }
}
