//! Trigonometric kernels.
//!
//! Thin elementwise maps over the platform `sin`/`cos`/`tan`. NaN and infinite
//! inputs produce NaN, per IEEE-754.

use crate::chunk;

/// `out[i] = sin(x[i])`
pub fn sin(out: &mut [f64], x: &[f64]) {
    chunk::unary(out, x, f64::sin);
}

/// `out[i] = cos(x[i])`
pub fn cos(out: &mut [f64], x: &[f64]) {
    chunk::unary(out, x, f64::cos);
}

/// `out[i] = tan(x[i])`
pub fn tan(out: &mut [f64], x: &[f64]) {
    chunk::unary(out, x, f64::tan);
}
