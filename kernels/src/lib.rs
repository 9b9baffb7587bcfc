//! Aranya Prime Kernels
//!
//! Pure, stateless numeric kernels over caller-owned `f64` buffers.
//!
//! # Design Philosophy
//!
//! 1. **One contract, one language** - every kernel is authored here and exported
//!    through the same C-compatible calling convention (see [`abi`])
//! 2. **Caller owns memory** - kernels never allocate caller-visible memory; every
//!    result is written through an output buffer, scalar results included
//! 3. **Reference order of operations** - no fused multiply-add, no reassociation
//!    inside an element, so results match a plain scalar evaluation
//!
//! # Layers
//!
//! ```text
//! foreign caller ──► abi::kernel_*   (n, *mut f64, *const f64, ...)
//!                        │
//!                        ▼
//!                 slice kernels       poly, trig, array, linalg, transform
//!                        │
//!                        ▼
//!                 chunk::unary/...    serial, or rayon above PAR_THRESHOLD
//! ```
//!
//! The slice kernels expect equal-length buffers. Length validation belongs to the
//! calling layer; the slice kernels only guarantee that nothing outside the shortest
//! buffer is ever touched.

pub mod abi;
pub mod array;
pub mod chunk;
pub mod linalg;
pub mod poly;
pub mod transform;
pub mod trig;

// Re-export the slice kernels
pub use array::{add, div, mul, sub};
pub use linalg::{dot, magnitude, normalize};
pub use poly::poly;
pub use transform::{rotate2d, scale};
pub use trig::{cos, sin, tan};
