//! C-compatible kernel ABI
//!
//! Every kernel is exported unmangled as `kernel_<op>` with a signed 64-bit count
//! followed by output pointers, input pointers and, for `scale`/`rotate2d`, a
//! trailing `double`:
//!
//! ```text
//! void kernel_poly(int64_t n, double *out, const double *in);
//! void kernel_add(int64_t n, double *out, const double *a, const double *b);
//! void kernel_dot(int64_t n, double *out /* [1] */, const double *a, const double *b);
//! void kernel_magnitude(int64_t n, double *out /* [1] */, const double *in);
//! void kernel_scale(int64_t n, double *out, const double *in, double factor);
//! void kernel_rotate2d(int64_t n, double *out_x, double *out_y,
//!                      const double *in_x, const double *in_y, double angle);
//! ```
//!
//! A count `n <= 0` is a no-op for elementwise kernels; reductions write `0.0`.
//! A null pointer is treated the same way, since there is no error channel.
//!
//! # Safety
//!
//! For `n > 0` every non-null pointer must reference `n` valid, initialized
//! `f64` values (one for scalar outputs) that stay alive for the duration of
//! the call. Output buffers must not overlap any input buffer.

use std::slice;

use crate::{array, linalg, poly, transform, trig};

/// `(n, out, in)`
pub type UnaryFn = unsafe extern "C" fn(i64, *mut f64, *const f64);
/// `(n, out, a, b)`
pub type BinaryFn = unsafe extern "C" fn(i64, *mut f64, *const f64, *const f64);
/// `(n, out[1], a, b)`
pub type Reduce2Fn = unsafe extern "C" fn(i64, *mut f64, *const f64, *const f64);
/// `(n, out[1], in)`
pub type Reduce1Fn = unsafe extern "C" fn(i64, *mut f64, *const f64);
/// `(n, out, in, factor)`
pub type ScaledFn = unsafe extern "C" fn(i64, *mut f64, *const f64, f64);
/// `(n, out_x, out_y, in_x, in_y, angle)`
pub type RotateFn =
    unsafe extern "C" fn(i64, *mut f64, *mut f64, *const f64, *const f64, f64);

#[inline]
fn count(n: i64) -> Option<usize> {
    if n <= 0 {
        None
    } else {
        usize::try_from(n).ok()
    }
}

#[inline]
unsafe fn input<'a>(ptr: *const f64, n: usize) -> Option<&'a [f64]> {
    if ptr.is_null() {
        None
    } else {
        Some(slice::from_raw_parts(ptr, n))
    }
}

#[inline]
unsafe fn output<'a>(ptr: *mut f64, n: usize) -> Option<&'a mut [f64]> {
    if ptr.is_null() {
        None
    } else {
        Some(slice::from_raw_parts_mut(ptr, n))
    }
}

#[inline]
unsafe fn unary(n: i64, out: *mut f64, x: *const f64, kernel: fn(&mut [f64], &[f64])) {
    let Some(n) = count(n) else { return };
    if let (Some(out), Some(x)) = (output(out, n), input(x, n)) {
        kernel(out, x);
    }
}

#[inline]
unsafe fn binary(
    n: i64,
    out: *mut f64,
    a: *const f64,
    b: *const f64,
    kernel: fn(&mut [f64], &[f64], &[f64]),
) {
    let Some(n) = count(n) else { return };
    if let (Some(out), Some(a), Some(b)) = (output(out, n), input(a, n), input(b, n)) {
        kernel(out, a, b);
    }
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_poly(n: i64, out: *mut f64, x: *const f64) {
    unary(n, out, x, poly::poly);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_sin(n: i64, out: *mut f64, x: *const f64) {
    unary(n, out, x, trig::sin);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_cos(n: i64, out: *mut f64, x: *const f64) {
    unary(n, out, x, trig::cos);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_tan(n: i64, out: *mut f64, x: *const f64) {
    unary(n, out, x, trig::tan);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_add(n: i64, out: *mut f64, a: *const f64, b: *const f64) {
    binary(n, out, a, b, array::add);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_sub(n: i64, out: *mut f64, a: *const f64, b: *const f64) {
    binary(n, out, a, b, array::sub);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_mul(n: i64, out: *mut f64, a: *const f64, b: *const f64) {
    binary(n, out, a, b, array::mul);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_div(n: i64, out: *mut f64, a: *const f64, b: *const f64) {
    binary(n, out, a, b, array::div);
}

/// # Safety
/// See the module-level contract. `out` references a single `f64`.
#[no_mangle]
pub unsafe extern "C" fn kernel_dot(n: i64, out: *mut f64, a: *const f64, b: *const f64) {
    let Some(out) = out.as_mut() else { return };
    *out = match count(n) {
        Some(n) => match (input(a, n), input(b, n)) {
            (Some(a), Some(b)) => linalg::dot(a, b),
            _ => 0.0,
        },
        None => 0.0,
    };
}

/// # Safety
/// See the module-level contract. `out` references a single `f64`.
#[no_mangle]
pub unsafe extern "C" fn kernel_magnitude(n: i64, out: *mut f64, x: *const f64) {
    let Some(out) = out.as_mut() else { return };
    *out = match count(n).and_then(|n| input(x, n)) {
        Some(x) => linalg::magnitude(x),
        None => 0.0,
    };
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_normalize(n: i64, out: *mut f64, x: *const f64) {
    unary(n, out, x, linalg::normalize);
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_scale(n: i64, out: *mut f64, x: *const f64, factor: f64) {
    let Some(n) = count(n) else { return };
    if let (Some(out), Some(x)) = (output(out, n), input(x, n)) {
        transform::scale(out, x, factor);
    }
}

/// # Safety
/// See the module-level contract.
#[no_mangle]
pub unsafe extern "C" fn kernel_rotate2d(
    n: i64,
    out_x: *mut f64,
    out_y: *mut f64,
    in_x: *const f64,
    in_y: *const f64,
    angle: f64,
) {
    let Some(n) = count(n) else { return };
    if let (Some(xo), Some(yo), Some(xi), Some(yi)) = (
        output(out_x, n),
        output(out_y, n),
        input(in_x, n),
        input(in_y, n),
    ) {
        transform::rotate2d(xo, yo, xi, yi, angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_signatures_match_aliases() {
        let _: UnaryFn = kernel_poly;
        let _: UnaryFn = kernel_normalize;
        let _: BinaryFn = kernel_div;
        let _: Reduce2Fn = kernel_dot;
        let _: Reduce1Fn = kernel_magnitude;
        let _: ScaledFn = kernel_scale;
        let _: RotateFn = kernel_rotate2d;
    }

    #[test]
    fn test_poly_through_abi() {
        let x = [1.0, 2.0, 3.0];
        let mut out = [0.0; 3];
        unsafe { kernel_poly(3, out.as_mut_ptr(), x.as_ptr()) };
        assert_eq!(out, [3.0, 14.0, 39.0]);
    }

    #[test]
    fn test_zero_and_negative_count_are_noops() {
        let mut out = [9.0; 2];
        unsafe {
            kernel_poly(0, out.as_mut_ptr(), ptr::null());
            kernel_add(-5, out.as_mut_ptr(), ptr::null(), ptr::null());
            kernel_rotate2d(0, ptr::null_mut(), ptr::null_mut(), ptr::null(), ptr::null(), 1.0);
        }
        assert_eq!(out, [9.0; 2]);
    }

    #[test]
    fn test_reductions_write_zero_when_empty() {
        let mut out = [9.0];
        unsafe { kernel_dot(0, out.as_mut_ptr(), ptr::null(), ptr::null()) };
        assert_eq!(out[0], 0.0);

        out[0] = 9.0;
        unsafe { kernel_magnitude(0, out.as_mut_ptr(), ptr::null()) };
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_null_pointers_are_ignored() {
        let x = [1.0, 2.0];
        unsafe {
            kernel_poly(2, ptr::null_mut(), x.as_ptr());
            kernel_dot(2, ptr::null_mut(), x.as_ptr(), x.as_ptr());
        }
    }

    #[test]
    fn test_dot_and_rotate_through_abi() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let mut d = 0.0;
        unsafe { kernel_dot(3, &mut d, a.as_ptr(), b.as_ptr()) };
        assert_eq!(d, 32.0);

        let mut xo = [0.0; 3];
        let mut yo = [0.0; 3];
        unsafe {
            kernel_rotate2d(3, xo.as_mut_ptr(), yo.as_mut_ptr(), a.as_ptr(), b.as_ptr(), 0.0)
        };
        assert_eq!(xo, a);
        assert_eq!(yo, b);
    }
}
