//! Kernel handle: explicit, load-once ownership of a capability table.
//!
//! A [`KernelHandle`] is created without touching the filesystem. The first call
//! to [`KernelHandle::load`] resolves the configured source into a
//! [`KernelTable`]; the outcome, success or failure, is stored and returned by
//! every later call. Nothing is retried.
//!
//! ```text
//!             load() ok
//! NotLoaded ────────────► Loaded
//!     │
//!     │ load() err
//!     ▼
//!   Failed   (sticky)
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{LibraryConfig, SourceKind};
use crate::error::{KernelError, KernelResult};
use crate::ffi::{Capability, KernelTable, LibraryLoader, LoadError};
use crate::ops::Kernels;

/// Where a handle gets its kernels from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelSource {
    /// Kernels linked into this process
    Builtin,
    /// Shared library, by name (searched) or by path
    Library(String),
}

impl fmt::Display for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelSource::Builtin => write!(f, "builtin"),
            KernelSource::Library(name) => write!(f, "library '{}'", name),
        }
    }
}

/// Load state of a handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LoadState {
    NotLoaded,
    Loaded,
    Failed(String),
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::NotLoaded => write!(f, "not loaded"),
            LoadState::Loaded => write!(f, "loaded"),
            LoadState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Explicitly initialized owner of the kernel capability table
pub struct KernelHandle {
    source: KernelSource,
    loader: LibraryLoader,
    cell: OnceCell<Result<Arc<KernelTable>, LoadError>>,
}

impl KernelHandle {
    /// Create an unloaded handle
    pub fn new(source: KernelSource) -> Self {
        Self {
            source,
            loader: LibraryLoader::new(),
            cell: OnceCell::new(),
        }
    }

    /// Handle over the in-process kernels
    pub fn builtin() -> Self {
        Self::new(KernelSource::Builtin)
    }

    /// Handle over a shared library, by name or path
    pub fn library(name: impl Into<String>) -> Self {
        Self::new(KernelSource::Library(name.into()))
    }

    /// Handle described by the `[library]` config section
    pub fn from_config(config: &LibraryConfig) -> Self {
        let source = match (config.source, &config.path) {
            (SourceKind::Builtin, _) => KernelSource::Builtin,
            (SourceKind::Library, Some(path)) => {
                KernelSource::Library(path.to_string_lossy().into_owned())
            }
            (SourceKind::Library, None) => KernelSource::Library(config.name.clone()),
        };
        let mut handle = Self::new(source);
        // Configured paths go ahead of the defaults, first entry first
        for path in config.search_paths.iter().rev() {
            handle.loader.add_search_path(path);
        }
        handle
    }

    /// Add a directory searched before the defaults
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.loader.add_search_path(path.into());
        self
    }

    /// Configured source
    pub fn source(&self) -> &KernelSource {
        &self.source
    }

    /// Current load state
    pub fn state(&self) -> LoadState {
        match self.cell.get() {
            None => LoadState::NotLoaded,
            Some(Ok(_)) => LoadState::Loaded,
            Some(Err(e)) => LoadState::Failed(e.to_string()),
        }
    }

    /// Load the kernels, once. Later calls return the stored outcome.
    pub fn load(&self) -> KernelResult<Kernels> {
        let outcome = self.cell.get_or_init(|| self.open());
        Self::view(outcome)
    }

    /// Kernels of an already loaded handle.
    ///
    /// Fails with [`KernelError::NotLoaded`] before [`KernelHandle::load`] has run.
    pub fn kernels(&self) -> KernelResult<Kernels> {
        match self.cell.get() {
            None => Err(KernelError::NotLoaded),
            Some(outcome) => Self::view(outcome),
        }
    }

    /// Availability of every kernel, once loaded
    pub fn capabilities(&self) -> KernelResult<Vec<Capability>> {
        Ok(self.kernels()?.table().capabilities())
    }

    /// Candidate paths searched for a library source
    pub fn search_candidates(&self) -> Vec<PathBuf> {
        match &self.source {
            KernelSource::Builtin => Vec::new(),
            KernelSource::Library(name) => self.loader.candidates(name),
        }
    }

    fn view(outcome: &Result<Arc<KernelTable>, LoadError>) -> KernelResult<Kernels> {
        match outcome {
            Ok(table) => Ok(Kernels::new(Arc::clone(table))),
            Err(e) => Err(KernelError::Unavailable(e.clone())),
        }
    }

    fn open(&self) -> Result<Arc<KernelTable>, LoadError> {
        let table = match &self.source {
            KernelSource::Builtin => KernelTable::builtin(),
            KernelSource::Library(name) => match self.loader.load(name) {
                Ok(library) => KernelTable::from_library(library),
                Err(e) => {
                    warn!(source = %self.source, error = %e, "kernel library load failed");
                    return Err(e);
                }
            },
        };

        info!(
            origin = %table.origin(),
            present = table.len(),
            missing = table.missing().len(),
            "kernels loaded"
        );
        Ok(Arc::new(table))
    }
}

impl fmt::Debug for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelHandle")
            .field("source", &self.source)
            .field("state", &self.state())
            .finish()
    }
}
