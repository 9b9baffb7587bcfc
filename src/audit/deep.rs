//! Deep numerical audit of the polynomial and add kernels.

use std::fmt;

use serde::Serialize;
use tracing::info;

use super::data::Sampler;
use super::reference;
use super::tolerance::{ErrorStats, Tolerance};
use crate::config::AuditConfig;
use crate::error::KernelResult;
use crate::ops::Kernels;

/// Relative error still granted certification
pub const GRANT_REL: f64 = 5e-15;

/// Audit conclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Granted,
    WithCaveats,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Granted => write!(f, "GRANTED"),
            Verdict::WithCaveats => write!(f, "WITH CAVEATS"),
        }
    }
}

/// A measured value and the limit it is held to
#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub value: f64,
    pub limit: f64,
}

impl Metric {
    pub fn passed(&self) -> bool {
        self.value <= self.limit
    }
}

/// Result of [`deep_audit`]
#[derive(Debug, Clone, Serialize)]
pub struct DeepAuditReport {
    pub origin: String,
    pub samples: usize,
    pub seed: u64,
    pub tolerance: Tolerance,
    /// Polynomial against the reference
    pub poly: ErrorStats,
    /// Largest absolute error of add; anything but zero is a defect
    pub add_max_error: f64,
    pub verdict: Verdict,
}

impl DeepAuditReport {
    /// Metrics in report order
    pub fn metrics(&self) -> Vec<Metric> {
        vec![
            Metric {
                name: "Max Absolute Error",
                value: self.poly.max_abs,
                limit: self.tolerance.abs,
            },
            Metric {
                name: "Max Relative Error",
                value: self.poly.max_rel,
                limit: self.tolerance.rel,
            },
            Metric {
                name: "Max ULP Deviation",
                value: self.poly.max_ulp as f64,
                limit: self.tolerance.ulp as f64,
            },
            Metric {
                name: "Add Kernel Max Error",
                value: self.add_max_error,
                limit: 0.0,
            },
        ]
    }
}

/// Audit `samples` values drawn from `[-range, range)`.
///
/// Certification is granted when the polynomial is within [`GRANT_REL`]
/// relative error or the ULP tolerance, and add is exact. Absolute error is
/// reported but not judged: it grows with the magnitude of the result.
pub fn deep_audit(kernels: &Kernels, config: &AuditConfig) -> KernelResult<DeepAuditReport> {
    let tolerance = config.tolerance();
    let mut rng = Sampler::new(config.seed);
    info!(samples = config.samples, seed = config.seed, "deep audit started");

    let data = rng.uniform(config.samples, -config.range, config.range);
    let poly = ErrorStats::compare(&reference::poly(&data), &kernels.poly(&data)?);

    let other = rng.uniform(config.samples, -config.range, config.range);
    let add = ErrorStats::compare(&reference::add(&data, &other), &kernels.add(&data, &other)?);
    let add_max_error = if add.mask_mismatches > 0 {
        f64::INFINITY
    } else {
        add.max_abs
    };

    let poly_ok = poly.mask_mismatches == 0
        && (poly.max_rel <= GRANT_REL || poly.max_ulp <= tolerance.ulp);
    let verdict = if poly_ok && add_max_error == 0.0 {
        Verdict::Granted
    } else {
        Verdict::WithCaveats
    };
    info!(%verdict, max_rel = poly.max_rel, max_ulp = poly.max_ulp, "deep audit finished");

    Ok(DeepAuditReport {
        origin: kernels.table().origin().to_string(),
        samples: config.samples,
        seed: config.seed,
        tolerance,
        poly,
        add_max_error,
        verdict,
    })
}
