//! Errors surfaced by the safe kernel layer.

use thiserror::Error;

use crate::ffi::{LoadError, Op};

/// Error type for kernel calls
#[derive(Debug, Clone, Error)]
pub enum KernelError {
    /// The handle has not been loaded yet
    #[error("kernel library not loaded; call KernelHandle::load first")]
    NotLoaded,

    /// Loading was attempted and failed
    #[error("kernel unavailable: {0}")]
    Unavailable(#[from] LoadError),

    /// The loaded library does not export this kernel
    #[error("unimplemented kernel '{0}': symbol '{}' not found in native library", .0.symbol())]
    Unimplemented(Op),

    /// Input or output buffers of a call disagree in length
    #[error("Array size mismatch in {op}: {expected} != {got}")]
    LengthMismatch {
        op: Op,
        expected: usize,
        got: usize,
    },

    /// Buffer length does not fit the signed 64-bit count of the ABI
    #[error("invalid element count {0}: exceeds the kernel count range")]
    InvalidCount(usize),
}

impl KernelError {
    /// Whether this is a caller-side precondition violation
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            KernelError::LengthMismatch { .. } | KernelError::InvalidCount(_)
        )
    }

    /// Whether the kernel itself could not be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            KernelError::NotLoaded | KernelError::Unavailable(_) | KernelError::Unimplemented(_)
        )
    }
}

/// Result type for kernel calls
pub type KernelResult<T> = Result<T, KernelError>;
