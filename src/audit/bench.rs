//! Stress benchmark: every kernel against the scalar reference on large buffers.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use super::data::Sampler;
use super::reference;
use crate::config::BenchConfig;
use crate::error::KernelResult;
use crate::ffi::Op;
use crate::ops::Kernels;

/// Scalar results smaller than this are compared absolutely
const SCALAR_REL_FLOOR: f64 = 1e-9;

/// Timing and accuracy of one kernel
#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub op: Op,
    /// Fastest kernel run, in seconds
    pub kernel_secs: f64,
    /// Fastest reference run, in seconds
    pub reference_secs: f64,
    /// `reference_secs / kernel_secs`
    pub speedup: f64,
    /// Largest absolute error; relative for scalar results
    pub max_error: f64,
    pub passed: bool,
}

/// Result of [`stress`]
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub origin: String,
    pub size: usize,
    pub iterations: usize,
    pub results: Vec<BenchResult>,
}

impl BenchReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

/// Kernel output, in the form needed to measure its error
enum Output {
    Vector(Vec<f64>),
    Scalar(f64),
    Pair(Vec<f64>, Vec<f64>),
}

impl Output {
    fn max_error(&self, reference: &Output) -> f64 {
        match (self, reference) {
            (Output::Vector(a), Output::Vector(r)) => max_abs_diff(a, r),
            (Output::Pair(ax, ay), Output::Pair(rx, ry)) => {
                max_abs_diff(ax, rx).max(max_abs_diff(ay, ry))
            }
            (Output::Scalar(a), Output::Scalar(r)) => {
                let diff = abs_diff(*a, *r);
                if r.abs() > SCALAR_REL_FLOOR {
                    diff / r.abs()
                } else {
                    diff
                }
            }
            _ => f64::INFINITY,
        }
    }
}

/// Equal values (including equal infinities) are zero apart; NaN against anything else is infinitely far
fn abs_diff(a: f64, b: f64) -> f64 {
    if a == b || (a.is_nan() && b.is_nan()) {
        0.0
    } else {
        let d = (a - b).abs();
        if d.is_nan() {
            f64::INFINITY
        } else {
            d
        }
    }
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(&x, &y)| abs_diff(x, y))
        .fold(0.0, f64::max)
}

/// Fastest of `iterations` runs of `f`, with the output of the last run
fn best_of<T>(
    iterations: usize,
    mut f: impl FnMut() -> KernelResult<T>,
) -> KernelResult<(T, f64)> {
    let start = Instant::now();
    let mut out = f()?;
    let mut best = start.elapsed().as_secs_f64();
    for _ in 1..iterations {
        let start = Instant::now();
        out = f()?;
        best = best.min(start.elapsed().as_secs_f64());
    }
    Ok((out, best))
}

/// Time every kernel against the reference on `config.size` elements of `[0, 1)` data
pub fn stress(kernels: &Kernels, config: &BenchConfig, seed: u64) -> KernelResult<BenchReport> {
    let n = config.size;
    info!(size = n, iterations = config.iterations, "stress benchmark started");

    let mut rng = Sampler::new(seed);
    let a = rng.unit(n);
    let b = rng.unit(n);
    let (angle, factor) = (config.angle, config.factor);

    let mut results = Vec::with_capacity(Op::ALL.len());
    for op in Op::ALL {
        let (actual, kernel_secs) = best_of(config.iterations, || {
            Ok(match op {
                Op::Poly => Output::Vector(kernels.poly(&a)?),
                Op::Sin => Output::Vector(kernels.sin(&a)?),
                Op::Cos => Output::Vector(kernels.cos(&a)?),
                Op::Tan => Output::Vector(kernels.tan(&a)?),
                Op::Add => Output::Vector(kernels.add(&a, &b)?),
                Op::Sub => Output::Vector(kernels.sub(&a, &b)?),
                Op::Mul => Output::Vector(kernels.mul(&a, &b)?),
                Op::Div => Output::Vector(kernels.div(&a, &b)?),
                Op::Dot => Output::Scalar(kernels.dot(&a, &b)?),
                Op::Magnitude => Output::Scalar(kernels.magnitude(&a)?),
                Op::Normalize => Output::Vector(kernels.normalize(&a)?),
                Op::Scale => Output::Vector(kernels.scale(&a, factor)?),
                Op::Rotate2d => {
                    let (x, y) = kernels.rotate2d(&a, &b, angle)?;
                    Output::Pair(x, y)
                }
            })
        })?;

        let (expected, reference_secs) = best_of(config.iterations, || {
            Ok(match op {
                Op::Poly => Output::Vector(reference::poly(&a)),
                Op::Sin => Output::Vector(reference::sin(&a)),
                Op::Cos => Output::Vector(reference::cos(&a)),
                Op::Tan => Output::Vector(reference::tan(&a)),
                Op::Add => Output::Vector(reference::add(&a, &b)),
                Op::Sub => Output::Vector(reference::sub(&a, &b)),
                Op::Mul => Output::Vector(reference::mul(&a, &b)),
                Op::Div => Output::Vector(reference::div(&a, &b)),
                Op::Dot => Output::Scalar(reference::dot(&a, &b)),
                Op::Magnitude => Output::Scalar(reference::magnitude(&a)),
                Op::Normalize => Output::Vector(reference::normalize(&a)),
                Op::Scale => Output::Vector(reference::scale(&a, factor)),
                Op::Rotate2d => {
                    let (x, y) = reference::rotate2d(&a, &b, angle);
                    Output::Pair(x, y)
                }
            })
        })?;

        let max_error = actual.max_error(&expected);
        let speedup = if kernel_secs > 0.0 {
            reference_secs / kernel_secs
        } else {
            f64::INFINITY
        };
        debug!(op = %op, kernel_secs, reference_secs, max_error, "benchmarked");

        results.push(BenchResult {
            op,
            kernel_secs,
            reference_secs,
            speedup,
            max_error,
            passed: max_error < config.max_error,
        });
    }

    Ok(BenchReport {
        origin: kernels.table().origin().to_string(),
        size: n,
        iterations: config.iterations,
        results,
    })
}
