//! Geometric transforms: uniform scale and 2D rotation.

use crate::chunk;

/// `out[i] = x[i] * factor`
pub fn scale(out: &mut [f64], x: &[f64], factor: f64) {
    chunk::unary(out, x, |v| v * factor);
}

/// Rotate the points `(xi[i], yi[i])` counter-clockwise by `angle` radians.
///
/// ```text
/// xo = x·cosθ − y·sinθ
/// yo = x·sinθ + y·cosθ
/// ```
///
/// `cosθ` and `sinθ` are computed once per call.
pub fn rotate2d(xo: &mut [f64], yo: &mut [f64], xi: &[f64], yi: &[f64], angle: f64) {
    let (s, c) = angle.sin_cos();
    chunk::pairwise(xo, yo, xi, yi, |x, y| (x * c - y * s, x * s + y * c));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_scale() {
        let mut out = [0.0; 3];
        scale(&mut out, &[1.0, -2.0, 0.5], 2.5);
        assert_eq!(out, [2.5, -5.0, 1.25]);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut xo = [0.0; 2];
        let mut yo = [0.0; 2];
        rotate2d(&mut xo, &mut yo, &[1.0, 0.0], &[0.0, 1.0], FRAC_PI_2);
        assert!(xo[0].abs() < 1e-15);
        assert!((yo[0] - 1.0).abs() < 1e-15);
        assert!((xo[1] + 1.0).abs() < 1e-15);
        assert!(yo[1].abs() < 1e-15);
    }

    #[test]
    fn test_rotate_preserves_norm() {
        let xi = [3.0, -1.5, 0.25];
        let yi = [4.0, 2.0, -7.0];
        let mut xo = [0.0; 3];
        let mut yo = [0.0; 3];
        for angle in [0.1, 1.0, PI, -2.5, 100.0] {
            rotate2d(&mut xo, &mut yo, &xi, &yi, angle);
            for i in 0..3 {
                let before = xi[i].hypot(yi[i]);
                let after = xo[i].hypot(yo[i]);
                assert!((before - after).abs() <= 1e-12 * before);
            }
        }
    }
}
