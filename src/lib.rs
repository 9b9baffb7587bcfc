//! Aranya Prime - Numeric Kernels Behind a C ABI
//!
//! A fixed set of stateless f64 kernels (polynomial, trigonometry, elementwise
//! arithmetic, dot product, norm, scale, 2D rotation) exported as
//! `extern "C"` symbols by the `aranya-kernels` crate, and the host layer that
//! loads, validates and audits them.
//!
//! # Features
//!
//! - **One ABI**: every kernel writes through caller-supplied buffers, `n` first
//! - **Capability table**: each kernel resolved once; absent kernels fail with a typed error
//! - **Explicit loading**: [`KernelHandle`] loads once and keeps the outcome, success or failure
//! - **Checked calls**: [`Kernels`] validates lengths before crossing the boundary
//! - **Audit**: falsification suite, deep numerical audit and stress benchmark
//!   against a scalar reference
//!
//! # Example
//!
//! ```rust
//! use aranya_prime::KernelHandle;
//!
//! let handle = KernelHandle::builtin();
//! let kernels = handle.load().unwrap();
//!
//! assert_eq!(kernels.poly(&[1.0, 2.0]).unwrap(), vec![3.0, 14.0]);
//! assert_eq!(kernels.dot(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), 11.0);
//!
//! // Mismatched lengths never reach the kernel
//! assert!(kernels.add(&[1.0; 10], &[1.0; 11]).is_err());
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────────┐
//! │  aranya-kernels │     │ libaranya_kernels.so │  same crate, cdylib
//! │  (linked in)    │     │ (or legacy prime_*)  │
//! └────────┬────────┘     └──────────┬───────────┘
//!          │ builtin                 │ libloading
//!          ▼                         ▼
//! ┌───────────────────────────────────────────────┐
//! │ KernelTable    one Option<fn> per Op          │
//! └───────────────────────┬───────────────────────┘
//!                         │ KernelHandle::load()
//!                         ▼
//! ┌───────────────────────────────────────────────┐
//! │ Kernels        length checks, then the call   │
//! └───────────────────────┬───────────────────────┘
//!                         ▼
//!                  audit / CLI / callers
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod config;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod ops;

pub use audit::{Falsifier, Tolerance};
pub use config::{AranyaConfig, ConfigError};
pub use error::{KernelError, KernelResult};
pub use ffi::{Capability, KernelTable, LoadError, Op};
pub use handle::{KernelHandle, KernelSource, LoadState};
pub use ops::Kernels;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project title
pub const TITLE: &str = "Aranya Prime";

/// Copyright line
pub const COPYRIGHT: &str = "Copyright 2025 Aranya Research";

/// Development status: Prototype, Beta or Production
pub const STATUS: &str = "Prototype";

/// Banner printed by `aranya info`
pub fn banner() -> String {
    format!(
        "=========================================\n  {}  |  v{}\n=========================================\n{}\nStatus: {}",
        TITLE.to_uppercase(),
        VERSION,
        COPYRIGHT,
        STATUS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner() {
        let banner = banner();
        assert!(banner.contains("ARANYA PRIME"));
        assert!(banner.contains(VERSION));
        assert!(banner.contains("Status: Prototype"));
    }
}
