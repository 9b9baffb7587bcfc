//! Falsification suite.
//!
//! A fixed battery of adversarial checks run against a loaded kernel table:
//! boundary sizes, NaN/Inf propagation, subnormals, repeated calls, and the
//! accuracy of each kernel family against the scalar reference. Every check
//! ends as Pass, Warn or Fail; a kernel error inside a check is a Fail, never
//! a panic.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::data::Sampler;
use super::reference;
use super::tolerance::{ErrorStats, Tolerance};
use crate::config::AuditConfig;
use crate::error::{KernelError, KernelResult};
use crate::ops::Kernels;

/// Sizes swept by the boundary check
pub const BOUNDARY_SIZES: [usize; 10] = [0, 1, 2, 3, 7, 13, 1023, 1024, 1025, 1_000_003];

/// Input of the NaN/Inf check
pub const CHAOS_INPUT: [f64; 6] = [1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -1.0];

/// Input of the subnormal check
pub const SUBNORMAL_INPUT: [f64; 3] = [1e-300, 1e-310, 0.0];

/// Relative bound for reductions, which may sum in a different order
pub const REDUCTION_REL_TOL: f64 = 1e-12;

/// Vector length used by the accuracy checks
const ACCURACY_LEN: usize = 1000;

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Warn => write!(f, "WARN"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Result of one check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
    pub elapsed_ms: f64,
}

/// Result of a full suite run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub origin: String,
    pub checks: Vec<CheckResult>,
}

impl SuiteReport {
    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn failures(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warn)
    }

    /// No check failed. Warnings do not count against the kernels.
    pub fn passed(&self) -> bool {
        self.failures() == 0
    }
}

type Outcome = (CheckStatus, String);

fn pass(detail: impl Into<String>) -> KernelResult<Outcome> {
    Ok((CheckStatus::Pass, detail.into()))
}

fn fail(detail: impl Into<String>) -> KernelResult<Outcome> {
    Ok((CheckStatus::Fail, detail.into()))
}

/// Runs the falsification checks against one set of kernels
pub struct Falsifier<'a> {
    kernels: &'a Kernels,
    tolerance: Tolerance,
    seed: u64,
    rapid_fire_iterations: usize,
    rapid_fire_len: usize,
}

impl<'a> Falsifier<'a> {
    pub fn new(kernels: &'a Kernels, config: &AuditConfig) -> Self {
        Self {
            kernels,
            tolerance: config.tolerance(),
            seed: config.seed,
            rapid_fire_iterations: config.rapid_fire_iterations,
            rapid_fire_len: config.rapid_fire_len,
        }
    }

    /// Run every check, in a fixed order
    pub fn run(&self) -> SuiteReport {
        info!(origin = %self.kernels.table().origin(), "falsification suite started");

        let checks = vec![
            self.check("boundary_sizes", Self::boundary_sizes),
            self.check("chaos_input", Self::chaos_input),
            self.check("subnormals", Self::subnormals),
            self.check("rapid_fire", Self::rapid_fire),
            self.check("add_integrity", Self::add_integrity),
            self.check("arithmetic", Self::arithmetic),
            self.check("reductions", Self::reductions),
            self.check("trigonometry", Self::trigonometry),
            self.check("rotation_invariance", Self::rotation_invariance),
            self.check("mismatch_rejection", Self::mismatch_rejection),
        ];

        let report = SuiteReport {
            origin: self.kernels.table().origin().to_string(),
            checks,
        };
        info!(
            failures = report.failures(),
            warnings = report.warnings(),
            "falsification suite finished"
        );
        report
    }

    fn check(
        &self,
        name: &'static str,
        body: fn(&Self) -> KernelResult<Outcome>,
    ) -> CheckResult {
        let start = Instant::now();
        let (status, detail) = match body(self) {
            Ok(outcome) => outcome,
            Err(e) => (CheckStatus::Fail, format!("kernel error: {}", e)),
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
        debug!(check = name, %status, elapsed_ms, "check finished");
        CheckResult {
            name,
            status,
            detail,
            elapsed_ms,
        }
    }

    fn sampler(&self, salt: u64) -> Sampler {
        Sampler::new(self.seed ^ salt)
    }

    fn boundary_sizes(&self) -> KernelResult<Outcome> {
        let mut rng = self.sampler(1);
        for n in BOUNDARY_SIZES {
            let data = rng.unit(n);
            let out = self.kernels.poly(&data)?;
            if out.len() != n {
                return fail(format!("size {}: returned {} elements", n, out.len()));
            }
            let expected = reference::poly(&data);
            if let Some(i) = self.tolerance.first_violation(&expected, &out) {
                return fail(format!(
                    "size {}: mismatch at index {} ({:e} vs {:e})",
                    n, i, out[i], expected[i]
                ));
            }
        }
        pass(format!("{} sizes, 0 through 1000003", BOUNDARY_SIZES.len()))
    }

    fn chaos_input(&self) -> KernelResult<Outcome> {
        let out = self.kernels.poly(&CHAOS_INPUT)?;
        let expected = reference::poly(&CHAOS_INPUT);
        let stats = ErrorStats::compare(&expected, &out);
        if stats.mask_mismatches > 0 {
            return fail(format!(
                "NaN/Inf mask differs at {} positions",
                stats.mask_mismatches
            ));
        }
        if let Some(i) = self.tolerance.first_violation(&expected, &out) {
            return fail(format!("element {} off by {:e}", i, stats.max_abs));
        }
        pass("NaN and infinities propagate like the reference")
    }

    fn subnormals(&self) -> KernelResult<Outcome> {
        let out = self.kernels.poly(&SUBNORMAL_INPUT)?;
        let stats = ErrorStats::compare(&reference::poly(&SUBNORMAL_INPUT), &out);
        if stats.is_exact() {
            return pass("subnormals preserved bit for bit");
        }
        warn!(
            origin = %self.kernels.table().origin(),
            "subnormal results differ from reference; flush-to-zero likely enabled"
        );
        Ok((
            CheckStatus::Warn,
            format!(
                "{} of {} values differ; flush-to-zero likely enabled",
                stats.len - stats.exact,
                stats.len
            ),
        ))
    }

    fn rapid_fire(&self) -> KernelResult<Outcome> {
        let data = self.sampler(4).unit(self.rapid_fire_len);
        let first = self.kernels.poly(&data)?;
        let mut out = vec![0.0; data.len()];

        let start = Instant::now();
        for i in 0..self.rapid_fire_iterations {
            self.kernels.poly_into(&mut out, &data)?;
            let same = out
                .iter()
                .zip(&first)
                .all(|(a, b)| a.to_bits() == b.to_bits());
            if !same {
                return fail(format!("iteration {} produced different bits", i));
            }
        }
        pass(format!(
            "{} calls x {} elements in {:.2}s, bit-identical",
            self.rapid_fire_iterations,
            self.rapid_fire_len,
            start.elapsed().as_secs_f64()
        ))
    }

    fn add_integrity(&self) -> KernelResult<Outcome> {
        let mut rng = self.sampler(5);
        let a = rng.unit(ACCURACY_LEN);
        let b = rng.unit(ACCURACY_LEN);
        let out = self.kernels.add(&a, &b)?;
        let stats = ErrorStats::compare(&reference::add(&a, &b), &out);
        if stats.is_exact() {
            pass("bitwise equal to reference")
        } else {
            fail(format!("max error {:e}", stats.max_abs))
        }
    }

    fn arithmetic(&self) -> KernelResult<Outcome> {
        let mut rng = self.sampler(6);
        let a = rng.uniform(ACCURACY_LEN, -1000.0, 1000.0);
        let b = rng.uniform(ACCURACY_LEN, 0.5, 1000.0);
        let k = self.kernels;

        let cases: [(&str, Vec<f64>, Vec<f64>); 5] = [
            ("sub", reference::sub(&a, &b), k.sub(&a, &b)?),
            ("mul", reference::mul(&a, &b), k.mul(&a, &b)?),
            ("div", reference::div(&a, &b), k.div(&a, &b)?),
            ("scale", reference::scale(&a, 2.5), k.scale(&a, 2.5)?),
            ("normalize", reference::normalize(&a), k.normalize(&a)?),
        ];
        for (name, expected, actual) in &cases {
            if let Some(i) = self.tolerance.first_violation(expected, actual) {
                return fail(format!("{} differs at index {}", name, i));
            }
        }
        pass("sub, mul, div, scale, normalize within tolerance")
    }

    fn reductions(&self) -> KernelResult<Outcome> {
        let mut rng = self.sampler(7);
        let a = rng.unit(ACCURACY_LEN);
        let b = rng.unit(ACCURACY_LEN);

        let dot_err = relative(reference::dot(&a, &b), self.kernels.dot(&a, &b)?);
        let mag_err = relative(reference::magnitude(&a), self.kernels.magnitude(&a)?);
        let worst = dot_err.max(mag_err);
        if worst <= REDUCTION_REL_TOL {
            pass(format!("dot rel {:.1e}, magnitude rel {:.1e}", dot_err, mag_err))
        } else {
            fail(format!(
                "dot rel {:.1e}, magnitude rel {:.1e} (limit {:.0e})",
                dot_err, mag_err, REDUCTION_REL_TOL
            ))
        }
    }

    fn trigonometry(&self) -> KernelResult<Outcome> {
        let x = self.sampler(8).uniform(ACCURACY_LEN, -10.0, 10.0);
        let k = self.kernels;
        let cases: [(&str, Vec<f64>, Vec<f64>); 3] = [
            ("sin", reference::sin(&x), k.sin(&x)?),
            ("cos", reference::cos(&x), k.cos(&x)?),
            ("tan", reference::tan(&x), k.tan(&x)?),
        ];
        for (name, expected, actual) in &cases {
            if let Some(i) = self.tolerance.first_violation(expected, actual) {
                return fail(format!(
                    "{}({}) = {:e}, reference {:e}",
                    name, x[i], actual[i], expected[i]
                ));
            }
        }
        pass("sin, cos, tan within tolerance")
    }

    fn rotation_invariance(&self) -> KernelResult<Outcome> {
        let mut rng = self.sampler(9);
        let x = rng.uniform(ACCURACY_LEN, -100.0, 100.0);
        let y = rng.uniform(ACCURACY_LEN, -100.0, 100.0);
        let angle = rng.scalar(-std::f64::consts::PI, std::f64::consts::PI);
        let (rx, ry) = self.kernels.rotate2d(&x, &y, angle)?;

        for i in 0..x.len() {
            let before = x[i].hypot(y[i]);
            let after = rx[i].hypot(ry[i]);
            if relative(before, after) > REDUCTION_REL_TOL {
                return fail(format!(
                    "point {} norm {:e} became {:e} at angle {}",
                    i, before, after, angle
                ));
            }
        }
        pass(format!("norms preserved at angle {:.6}", angle))
    }

    fn mismatch_rejection(&self) -> KernelResult<Outcome> {
        let a = vec![0.0; 10];
        let b = vec![0.0; 11];
        match self.kernels.add(&a, &b) {
            Err(e @ KernelError::LengthMismatch { .. }) => pass(e.to_string()),
            Err(e) => Err(e),
            Ok(_) => fail("mismatched lengths accepted"),
        }
    }
}

fn relative(expected: f64, actual: f64) -> f64 {
    if expected == 0.0 {
        (expected - actual).abs()
    } else {
        ((expected - actual) / expected).abs()
    }
}
