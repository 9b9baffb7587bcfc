//! Kernel Capability Table
//!
//! Resolves every [`Op`] to a typed function pointer once, at load time. Absent
//! kernels stay absent and fail with [`KernelError::Unimplemented`] when used,
//! instead of failing somewhere inside a symbol lookup.

use std::path::PathBuf;
use std::sync::Arc;

use aranya_kernels::abi::{
    self, BinaryFn, Reduce1Fn, Reduce2Fn, RotateFn, ScaledFn, UnaryFn,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::loader::DynamicLibrary;
use super::types::{KernelShape, Op, OP_COUNT};
use crate::error::KernelError;

/// Error type for locating and opening kernel artifacts
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// No candidate path exists
    #[error("kernel library '{name}' not found; searched:\n{}", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// The file exists but could not be opened as a shared library
    #[error("failed to load '{}': {}", .path.display(), .reason)]
    Open { path: PathBuf, reason: String },

    /// Symbol name contains an interior NUL
    #[error("invalid symbol name: {0}")]
    InvalidSymbol(String),

    /// Symbol not exported by the library
    #[error("symbol '{}' not found in '{}'", .symbol, .path.display())]
    SymbolNotFound { symbol: String, path: PathBuf },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A resolved kernel entry point
#[derive(Clone, Copy)]
pub enum KernelFn {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Reduce2(Reduce2Fn),
    Reduce1(Reduce1Fn),
    Scaled(ScaledFn),
    Rotate(RotateFn),
}

impl KernelFn {
    /// Shape of this entry point
    pub fn shape(&self) -> KernelShape {
        match self {
            KernelFn::Unary(_) => KernelShape::Unary,
            KernelFn::Binary(_) => KernelShape::Binary,
            KernelFn::Reduce2(_) => KernelShape::Reduce2,
            KernelFn::Reduce1(_) => KernelShape::Reduce1,
            KernelFn::Scaled(_) => KernelShape::Scaled,
            KernelFn::Rotate(_) => KernelShape::Rotate,
        }
    }

    /// Reinterpret a raw symbol address as the entry point for `shape`.
    ///
    /// # Safety
    ///
    /// `addr` must be the address of an `extern "C"` function with exactly the
    /// signature described by `shape`.
    unsafe fn from_addr(addr: usize, shape: KernelShape) -> Self {
        match shape {
            KernelShape::Unary => KernelFn::Unary(std::mem::transmute::<usize, UnaryFn>(addr)),
            KernelShape::Binary => {
                KernelFn::Binary(std::mem::transmute::<usize, BinaryFn>(addr))
            }
            KernelShape::Reduce2 => {
                KernelFn::Reduce2(std::mem::transmute::<usize, Reduce2Fn>(addr))
            }
            KernelShape::Reduce1 => {
                KernelFn::Reduce1(std::mem::transmute::<usize, Reduce1Fn>(addr))
            }
            KernelShape::Scaled => {
                KernelFn::Scaled(std::mem::transmute::<usize, ScaledFn>(addr))
            }
            KernelShape::Rotate => {
                KernelFn::Rotate(std::mem::transmute::<usize, RotateFn>(addr))
            }
        }
    }
}

impl std::fmt::Debug for KernelFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KernelFn::{:?}", self.shape())
    }
}

/// One row of the capability table
#[derive(Debug, Clone)]
struct Entry {
    func: KernelFn,
    symbol: String,
}

/// Where a table's kernels come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableOrigin {
    /// Kernels linked into this process
    Builtin,
    /// Kernels resolved from a shared library
    Library { path: PathBuf },
}

impl std::fmt::Display for TableOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableOrigin::Builtin => write!(f, "builtin"),
            TableOrigin::Library { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Per-kernel availability, as reported by [`KernelTable::capabilities`]
#[derive(Debug, Clone, Serialize)]
pub struct Capability {
    pub op: Op,
    pub shape: KernelShape,
    /// Resolved symbol, `None` when the kernel is absent
    pub symbol: Option<String>,
}

impl Capability {
    /// Whether the kernel can be called
    pub fn is_present(&self) -> bool {
        self.symbol.is_some()
    }
}

/// Capability table: one present-or-absent entry per [`Op`]
pub struct KernelTable {
    entries: [Option<Entry>; OP_COUNT],
    origin: TableOrigin,
    /// Keeps the library mapped for as long as its function pointers are reachable
    _library: Option<Arc<DynamicLibrary>>,
}

impl KernelTable {
    /// Table of the kernels linked into this process. Always complete.
    pub fn builtin() -> Self {
        let mut entries: [Option<Entry>; OP_COUNT] = Default::default();
        for op in Op::ALL {
            let func = match op {
                Op::Poly => KernelFn::Unary(abi::kernel_poly),
                Op::Sin => KernelFn::Unary(abi::kernel_sin),
                Op::Cos => KernelFn::Unary(abi::kernel_cos),
                Op::Tan => KernelFn::Unary(abi::kernel_tan),
                Op::Add => KernelFn::Binary(abi::kernel_add),
                Op::Sub => KernelFn::Binary(abi::kernel_sub),
                Op::Mul => KernelFn::Binary(abi::kernel_mul),
                Op::Div => KernelFn::Binary(abi::kernel_div),
                Op::Dot => KernelFn::Reduce2(abi::kernel_dot),
                Op::Magnitude => KernelFn::Reduce1(abi::kernel_magnitude),
                Op::Normalize => KernelFn::Unary(abi::kernel_normalize),
                Op::Scale => KernelFn::Scaled(abi::kernel_scale),
                Op::Rotate2d => KernelFn::Rotate(abi::kernel_rotate2d),
            };
            entries[op.index()] = Some(Entry {
                func,
                symbol: op.symbol().to_string(),
            });
        }

        Self {
            entries,
            origin: TableOrigin::Builtin,
            _library: None,
        }
    }

    /// Resolve every kernel from a loaded library.
    ///
    /// Each op is looked up under its `kernel_*` symbol first and its legacy
    /// symbol second. Kernels found under neither name are left absent.
    pub fn from_library(mut library: DynamicLibrary) -> Self {
        let mut entries: [Option<Entry>; OP_COUNT] = Default::default();

        for op in Op::ALL {
            let resolved = [op.symbol(), op.legacy_symbol()]
                .into_iter()
                .find_map(|name| library.address(name).ok().map(|addr| (name, addr)));

            match resolved {
                Some((name, addr)) => {
                    // Safety: symbols of this name are declared with `op.shape()`
                    // by the kernel ABI.
                    let func = unsafe { KernelFn::from_addr(addr, op.shape()) };
                    debug!(op = %op, symbol = name, "kernel available");
                    entries[op.index()] = Some(Entry {
                        func,
                        symbol: name.to_string(),
                    });
                }
                None => {
                    warn!(
                        op = %op,
                        symbol = op.symbol(),
                        path = %library.path().display(),
                        "kernel absent from library"
                    );
                }
            }
        }

        let origin = TableOrigin::Library {
            path: library.path().to_path_buf(),
        };
        Self {
            entries,
            origin,
            _library: Some(Arc::new(library)),
        }
    }

    /// Where these kernels come from
    pub fn origin(&self) -> &TableOrigin {
        &self.origin
    }

    /// Look up a kernel, failing fast when it is absent
    pub fn get(&self, op: Op) -> Result<KernelFn, KernelError> {
        self.entries[op.index()]
            .as_ref()
            .map(|e| e.func)
            .ok_or(KernelError::Unimplemented(op))
    }

    /// Whether a kernel is present
    pub fn contains(&self, op: Op) -> bool {
        self.entries[op.index()].is_some()
    }

    /// Number of present kernels
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no kernel is present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Availability of every op, in table order
    pub fn capabilities(&self) -> Vec<Capability> {
        Op::ALL
            .iter()
            .map(|&op| Capability {
                op,
                shape: op.shape(),
                symbol: self.entries[op.index()].as_ref().map(|e| e.symbol.clone()),
            })
            .collect()
    }

    /// Ops with no entry
    pub fn missing(&self) -> Vec<Op> {
        Op::ALL
            .iter()
            .copied()
            .filter(|&op| !self.contains(op))
            .collect()
    }
}

impl std::fmt::Debug for KernelTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelTable")
            .field("origin", &self.origin)
            .field("present", &self.len())
            .field("missing", &self.missing())
            .finish()
    }
}
