//! Safe kernel calls.
//!
//! [`Kernels`] wraps a loaded [`KernelTable`] and is the only place that crosses
//! the foreign boundary. Every call validates buffer lengths and the element
//! count first, so a kernel never sees a buffer shorter than `n`.
//!
//! Each operation comes in two forms: an `_into` variant that writes into
//! caller-owned buffers, and an allocating variant that returns fresh buffers.

use std::sync::Arc;

use crate::error::{KernelError, KernelResult};
use crate::ffi::{KernelFn, KernelTable, Op};

/// Callable view over a loaded capability table. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Kernels {
    table: Arc<KernelTable>,
}

fn count(len: usize) -> KernelResult<i64> {
    i64::try_from(len).map_err(|_| KernelError::InvalidCount(len))
}

fn same_len(op: Op, expected: usize, got: usize) -> KernelResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(KernelError::LengthMismatch { op, expected, got })
    }
}

impl Kernels {
    pub(crate) fn new(table: Arc<KernelTable>) -> Self {
        Self { table }
    }

    /// Kernels linked into this process, without going through a handle
    pub fn builtin() -> Self {
        Self::new(Arc::new(KernelTable::builtin()))
    }

    /// Underlying capability table
    pub fn table(&self) -> &Arc<KernelTable> {
        &self.table
    }

    /// Whether `op` can be called
    pub fn supports(&self, op: Op) -> bool {
        self.table.contains(op)
    }

    // =========================================================================
    // Shape dispatch
    // =========================================================================

    fn unary_into(&self, op: Op, out: &mut [f64], x: &[f64]) -> KernelResult<()> {
        same_len(op, x.len(), out.len())?;
        let n = count(x.len())?;
        let KernelFn::Unary(f) = self.table.get(op)? else {
            return Err(KernelError::Unimplemented(op));
        };
        // Safety: both buffers hold exactly `n` elements and do not overlap.
        unsafe { f(n, out.as_mut_ptr(), x.as_ptr()) };
        Ok(())
    }

    fn binary_into(&self, op: Op, out: &mut [f64], a: &[f64], b: &[f64]) -> KernelResult<()> {
        same_len(op, a.len(), b.len())?;
        same_len(op, a.len(), out.len())?;
        let n = count(a.len())?;
        let KernelFn::Binary(f) = self.table.get(op)? else {
            return Err(KernelError::Unimplemented(op));
        };
        // Safety: all three buffers hold exactly `n` elements; `out` is exclusive.
        unsafe { f(n, out.as_mut_ptr(), a.as_ptr(), b.as_ptr()) };
        Ok(())
    }

    fn unary_vec(&self, op: Op, x: &[f64]) -> KernelResult<Vec<f64>> {
        let mut out = vec![0.0; x.len()];
        self.unary_into(op, &mut out, x)?;
        Ok(out)
    }

    fn binary_vec(&self, op: Op, a: &[f64], b: &[f64]) -> KernelResult<Vec<f64>> {
        // Check before allocating for a mismatched call
        same_len(op, a.len(), b.len())?;
        let mut out = vec![0.0; a.len()];
        self.binary_into(op, &mut out, a, b)?;
        Ok(out)
    }

    // =========================================================================
    // Polynomial
    // =========================================================================

    /// `x^3 + x^2 + x`, elementwise
    pub fn poly(&self, x: &[f64]) -> KernelResult<Vec<f64>> {
        self.unary_vec(Op::Poly, x)
    }

    pub fn poly_into(&self, out: &mut [f64], x: &[f64]) -> KernelResult<()> {
        self.unary_into(Op::Poly, out, x)
    }

    // =========================================================================
    // Trigonometry
    // =========================================================================

    pub fn sin(&self, x: &[f64]) -> KernelResult<Vec<f64>> {
        self.unary_vec(Op::Sin, x)
    }

    pub fn sin_into(&self, out: &mut [f64], x: &[f64]) -> KernelResult<()> {
        self.unary_into(Op::Sin, out, x)
    }

    pub fn cos(&self, x: &[f64]) -> KernelResult<Vec<f64>> {
        self.unary_vec(Op::Cos, x)
    }

    pub fn cos_into(&self, out: &mut [f64], x: &[f64]) -> KernelResult<()> {
        self.unary_into(Op::Cos, out, x)
    }

    pub fn tan(&self, x: &[f64]) -> KernelResult<Vec<f64>> {
        self.unary_vec(Op::Tan, x)
    }

    pub fn tan_into(&self, out: &mut [f64], x: &[f64]) -> KernelResult<()> {
        self.unary_into(Op::Tan, out, x)
    }

    // =========================================================================
    // Elementwise arithmetic
    // =========================================================================

    pub fn add(&self, a: &[f64], b: &[f64]) -> KernelResult<Vec<f64>> {
        self.binary_vec(Op::Add, a, b)
    }

    pub fn add_into(&self, out: &mut [f64], a: &[f64], b: &[f64]) -> KernelResult<()> {
        self.binary_into(Op::Add, out, a, b)
    }

    pub fn sub(&self, a: &[f64], b: &[f64]) -> KernelResult<Vec<f64>> {
        self.binary_vec(Op::Sub, a, b)
    }

    pub fn sub_into(&self, out: &mut [f64], a: &[f64], b: &[f64]) -> KernelResult<()> {
        self.binary_into(Op::Sub, out, a, b)
    }

    pub fn mul(&self, a: &[f64], b: &[f64]) -> KernelResult<Vec<f64>> {
        self.binary_vec(Op::Mul, a, b)
    }

    pub fn mul_into(&self, out: &mut [f64], a: &[f64], b: &[f64]) -> KernelResult<()> {
        self.binary_into(Op::Mul, out, a, b)
    }

    pub fn div(&self, a: &[f64], b: &[f64]) -> KernelResult<Vec<f64>> {
        self.binary_vec(Op::Div, a, b)
    }

    pub fn div_into(&self, out: &mut [f64], a: &[f64], b: &[f64]) -> KernelResult<()> {
        self.binary_into(Op::Div, out, a, b)
    }

    // =========================================================================
    // Linear algebra
    // =========================================================================

    /// `Σ a[i] * b[i]`
    pub fn dot(&self, a: &[f64], b: &[f64]) -> KernelResult<f64> {
        same_len(Op::Dot, a.len(), b.len())?;
        let n = count(a.len())?;
        let KernelFn::Reduce2(f) = self.table.get(Op::Dot)? else {
            return Err(KernelError::Unimplemented(Op::Dot));
        };
        let mut out = 0.0;
        // Safety: inputs hold `n` elements, `out` is a single exclusive f64.
        unsafe { f(n, &mut out, a.as_ptr(), b.as_ptr()) };
        Ok(out)
    }

    /// Euclidean norm
    pub fn magnitude(&self, x: &[f64]) -> KernelResult<f64> {
        let n = count(x.len())?;
        let KernelFn::Reduce1(f) = self.table.get(Op::Magnitude)? else {
            return Err(KernelError::Unimplemented(Op::Magnitude));
        };
        let mut out = 0.0;
        // Safety: `x` holds `n` elements, `out` is a single exclusive f64.
        unsafe { f(n, &mut out, x.as_ptr()) };
        Ok(out)
    }

    /// `x / magnitude(x)`; a zero vector stays zero
    pub fn normalize(&self, x: &[f64]) -> KernelResult<Vec<f64>> {
        self.unary_vec(Op::Normalize, x)
    }

    pub fn normalize_into(&self, out: &mut [f64], x: &[f64]) -> KernelResult<()> {
        self.unary_into(Op::Normalize, out, x)
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// `x * factor`, elementwise
    pub fn scale(&self, x: &[f64], factor: f64) -> KernelResult<Vec<f64>> {
        let mut out = vec![0.0; x.len()];
        self.scale_into(&mut out, x, factor)?;
        Ok(out)
    }

    pub fn scale_into(&self, out: &mut [f64], x: &[f64], factor: f64) -> KernelResult<()> {
        same_len(Op::Scale, x.len(), out.len())?;
        let n = count(x.len())?;
        let KernelFn::Scaled(f) = self.table.get(Op::Scale)? else {
            return Err(KernelError::Unimplemented(Op::Scale));
        };
        // Safety: both buffers hold exactly `n` elements and do not overlap.
        unsafe { f(n, out.as_mut_ptr(), x.as_ptr(), factor) };
        Ok(())
    }

    /// Rotate points `(x[i], y[i])` by `angle` radians
    pub fn rotate2d(&self, x: &[f64], y: &[f64], angle: f64) -> KernelResult<(Vec<f64>, Vec<f64>)> {
        same_len(Op::Rotate2d, x.len(), y.len())?;
        let mut xo = vec![0.0; x.len()];
        let mut yo = vec![0.0; y.len()];
        self.rotate2d_into(&mut xo, &mut yo, x, y, angle)?;
        Ok((xo, yo))
    }

    pub fn rotate2d_into(
        &self,
        out_x: &mut [f64],
        out_y: &mut [f64],
        x: &[f64],
        y: &[f64],
        angle: f64,
    ) -> KernelResult<()> {
        same_len(Op::Rotate2d, x.len(), y.len())?;
        same_len(Op::Rotate2d, x.len(), out_x.len())?;
        same_len(Op::Rotate2d, x.len(), out_y.len())?;
        let n = count(x.len())?;
        let KernelFn::Rotate(f) = self.table.get(Op::Rotate2d)? else {
            return Err(KernelError::Unimplemented(Op::Rotate2d));
        };
        // Safety: all four buffers hold exactly `n` elements; outputs are exclusive.
        unsafe {
            f(
                n,
                out_x.as_mut_ptr(),
                out_y.as_mut_ptr(),
                x.as_ptr(),
                y.as_ptr(),
                angle,
            )
        };
        Ok(())
    }
}
