//! FFI Module for Aranya Prime
//!
//! Locates a kernel artifact, opens it and resolves its exported kernels into a
//! capability table.
//!
//! # Architecture
//!
//! ```text
//! KernelHandle::load()
//!       │
//!       ▼
//! LibraryLoader (search paths, platform file names)
//!       │
//!       ▼
//! DynamicLibrary (libloading, symbol cache)
//!       │
//!       ▼
//! KernelTable (one typed entry per Op, present or absent)
//! ```
//!
//! The in-process kernels from `aranya-kernels` produce the same table through
//! [`KernelTable::builtin`], so callers never care where a kernel came from.
//!
//! # Example
//!
//! ```ignore
//! let loader = LibraryLoader::new();
//! let library = loader.load("aranya_kernels")?;
//! let table = KernelTable::from_library(library);
//! assert!(table.contains(Op::Poly));
//! ```

mod loader;
mod registry;
mod types;

pub use loader::{
    library_filename, library_filenames, DynamicLibrary, LibraryLoader, DEFAULT_LIBRARY_NAME,
};
pub use registry::{Capability, KernelFn, KernelTable, LoadError, TableOrigin};
pub use types::{KernelShape, KernelSignature, Op, ParamType, OP_COUNT};

#[cfg(test)]
mod tests;
