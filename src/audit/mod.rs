//! Numerical audit of loaded kernels.
//!
//! Everything here measures a [`Kernels`](crate::ops::Kernels) instance against
//! the scalar [`reference`] implementations:
//!
//! - [`Falsifier`]: adversarial Pass/Warn/Fail checks
//! - [`deep_audit`]: error statistics over many samples, with a verdict
//! - [`stress`]: timing and accuracy on large buffers
//!
//! All generated data comes from a seeded [`Sampler`], so every report is
//! reproducible from its seed.

mod bench;
mod data;
mod deep;
pub mod reference;
mod suite;
mod tolerance;

pub use bench::{stress, BenchReport, BenchResult};
pub use data::Sampler;
pub use deep::{deep_audit, DeepAuditReport, Metric, Verdict, GRANT_REL};
pub use suite::{
    CheckResult, CheckStatus, Falsifier, SuiteReport, BOUNDARY_SIZES, CHAOS_INPUT,
    REDUCTION_REL_TOL, SUBNORMAL_INPUT,
};
pub use tolerance::{relative_error, ulp_distance, ErrorStats, Tolerance};
