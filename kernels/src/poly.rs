//! Polynomial kernel.

use crate::chunk;

/// Evaluate `x^3 + x^2 + x` for one element.
///
/// Written as `x*x*x + x*x + x`, left to right, without fused multiply-add.
/// The same expression is used by reference implementations, so the kernel is
/// bit-identical to them on every input, NaN/Inf and subnormals included.
///
/// # Test Cases
/// - poly_scalar(0.0) = 0.0
/// - poly_scalar(1.0) = 3.0
/// - poly_scalar(-1.0) = -1.0
/// - poly_scalar(2.0) = 14.0
#[inline(always)]
pub fn poly_scalar(x: f64) -> f64 {
    x * x * x + x * x + x
}

/// `out[i] = x[i]^3 + x[i]^2 + x[i]`
///
/// # Parameters
/// - out "Output buffer, same length as `x`"
/// - x "Input buffer"
pub fn poly(out: &mut [f64], x: &[f64]) {
    chunk::unary(out, x, poly_scalar);
}
