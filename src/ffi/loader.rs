//! Kernel library discovery and loading
//!
//! A kernel artifact is located on disk by [`LibraryLoader`], opened by
//! [`DynamicLibrary`], and its exported addresses handed to the kernel table.
//! Nothing here knows kernel signatures; the table casts addresses to the
//! right pointer type.

use std::collections::HashMap;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::CString;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tracing::debug;

use super::LoadError;

/// Artifact name produced by the `aranya-kernels` cdylib
pub const DEFAULT_LIBRARY_NAME: &str = "aranya_kernels";

/// An opened kernel artifact.
///
/// Keeps the library mapped for as long as any address taken from it may be
/// called, so the kernel table holds it behind an `Arc`.
pub struct DynamicLibrary {
    path: PathBuf,
    library: Library,
    /// Addresses already looked up, by symbol name
    addresses: HashMap<String, usize>,
}

impl DynamicLibrary {
    /// Open the artifact at `path`.
    ///
    /// A path without a separator is resolved by the platform loader's own
    /// search rules; use [`LibraryLoader`] to open a file found on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();

        // Safety: opening runs the artifact's initializers; the path comes from
        // the user's library setting.
        let library = unsafe { Library::new(&path) }.map_err(|e| LoadError::Open {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            path,
            library,
            addresses: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Address of an exported symbol, or `SymbolNotFound` when the artifact
    /// does not export it
    pub fn address(&mut self, name: &str) -> Result<usize, LoadError> {
        if let Some(&addr) = self.addresses.get(name) {
            return Ok(addr);
        }

        let not_found = || LoadError::SymbolNotFound {
            symbol: name.to_string(),
            path: self.path.clone(),
        };
        let c_name =
            CString::new(name).map_err(|_| LoadError::InvalidSymbol(name.to_string()))?;

        // Safety: only the address is read here; the kernel table casts it to
        // the pointer type of the op it was resolved for.
        let symbol: Symbol<*const ()> =
            unsafe { self.library.get(c_name.as_bytes_with_nul()) }.map_err(|_| not_found())?;

        let addr = *symbol as usize;
        if addr == 0 {
            return Err(not_found());
        }
        debug!(symbol = name, addr, path = %self.path.display(), "resolved symbol");
        self.addresses.insert(name.to_string(), addr);
        Ok(addr)
    }

    /// Number of distinct symbols looked up successfully
    pub fn cached(&self) -> usize {
        self.addresses.len()
    }
}

impl std::fmt::Debug for DynamicLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("path", &self.path)
            .field("cached", &self.addresses.len())
            .finish()
    }
}

/// Finds kernel artifacts by name across an ordered list of directories
#[derive(Debug, Clone)]
pub struct LibraryLoader {
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Loader over cwd, `bin/`, cargo output directories and the platform
    /// library path
    pub fn new() -> Self {
        Self {
            search_paths: default_search_paths(),
        }
    }

    /// Loader that only searches `paths`
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
        }
    }

    /// Search `path` before every existing directory
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.insert(0, path.as_ref().to_path_buf());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Locations tried for `name`, in order: `name` itself, then every
    /// [`library_filenames`] form in each search directory
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let file_names = library_filenames(name);
        let mut candidates = vec![PathBuf::from(name)];
        for dir in &self.search_paths {
            candidates.extend(file_names.iter().map(|file| dir.join(file)));
        }
        candidates
    }

    /// First candidate that exists, as an absolute path
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        let found = self.candidates(name).into_iter().find(|p| p.is_file())?;
        // dlopen searches system paths, not the cwd, for a bare file name
        if found.is_relative() {
            if let Ok(cwd) = std::env::current_dir() {
                return Some(cwd.join(found));
            }
        }
        Some(found)
    }

    /// Find and open `name`
    pub fn load(&self, name: &str) -> Result<DynamicLibrary, LoadError> {
        let path = self.find_library(name).ok_or_else(|| LoadError::NotFound {
            name: name.to_string(),
            searched: self.candidates(name),
        })?;
        DynamicLibrary::load(&path)
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the default library search paths for this platform
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // Project-relative locations: cwd, bin/ and cargo output directories
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("bin"));
        paths.push(cwd.join("target").join("release"));
        paths.push(cwd.join("target").join("debug"));
        paths.push(cwd);
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(ld_path) = std::env::var("LD_LIBRARY_PATH") {
            paths.extend(ld_path.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
        paths.push(PathBuf::from("/usr/local/lib"));
        paths.push(PathBuf::from("/usr/lib"));
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(dyld_path) = std::env::var("DYLD_LIBRARY_PATH") {
            paths.extend(dyld_path.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
        paths.push(PathBuf::from("/usr/local/lib"));
        paths.push(PathBuf::from("/opt/homebrew/lib"));
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(path) = std::env::var("PATH") {
            paths.extend(path.split(';').filter(|p| !p.is_empty()).map(PathBuf::from));
        }
    }

    paths
}

/// File name of the cdylib cargo builds for `name`, e.g. `libaranya_kernels.so`.
///
/// A name already carrying the platform suffix is returned unchanged.
pub fn library_filename(name: &str) -> String {
    if name.ends_with(DLL_SUFFIX) {
        name.to_string()
    } else {
        format!("{DLL_PREFIX}{name}{DLL_SUFFIX}")
    }
}

/// Every file name searched for `name`: the cdylib form, then the unprefixed
/// `<name><suffix>` that older kernel builds (`aranya_prime.so`) use
pub fn library_filenames(name: &str) -> Vec<String> {
    let mut names = vec![library_filename(name)];
    let bare = format!("{name}{DLL_SUFFIX}");
    if !name.ends_with(DLL_SUFFIX) && !names.contains(&bare) {
        names.push(bare);
    }
    names
}
