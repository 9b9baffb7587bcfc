//! Aranya Prime Project Configuration
//!
//! Handles parsing and management of aranya.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audit::Tolerance;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "aranya.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching aranya.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AranyaConfig {
    /// Where kernels are loaded from
    #[serde(default)]
    pub library: LibraryConfig,

    /// Numerical audit settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Stress benchmark settings
    #[serde(default)]
    pub bench: BenchConfig,
}

impl AranyaConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: AranyaConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                // Reached root without finding config
                return Ok(Self::default());
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no audit could run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.audit.range.is_finite() && self.audit.range > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "audit.range must be a positive finite number, got {}",
                self.audit.range
            )));
        }
        if self.audit.abs_tol < 0.0 || self.audit.rel_tol < 0.0 {
            return Err(ConfigError::Invalid(
                "audit tolerances must not be negative".to_string(),
            ));
        }
        if self.bench.iterations == 0 {
            return Err(ConfigError::Invalid(
                "bench.iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Kernel source selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Kernels linked into this binary
    #[default]
    Builtin,
    /// Kernels loaded from a shared library at runtime
    Library,
}

/// Library location settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Kernel source
    #[serde(default)]
    pub source: SourceKind,

    /// Library name, resolved to a platform file name (libNAME.so, ...)
    #[serde(default = "default_library_name")]
    pub name: String,

    /// Explicit library path; takes precedence over `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Extra directories searched before the defaults
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

fn default_library_name() -> String {
    crate::ffi::DEFAULT_LIBRARY_NAME.to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Builtin,
            name: default_library_name(),
            path: None,
            search_paths: Vec::new(),
        }
    }
}

/// Numerical audit settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
    /// Samples for the deep audit
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// RNG seed for generated data
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Deep audit samples are drawn from [-range, range)
    #[serde(default = "default_range")]
    pub range: f64,

    /// Absolute error tolerance
    #[serde(default = "default_abs_tol")]
    pub abs_tol: f64,

    /// Relative error tolerance
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,

    /// ULP distance tolerance
    #[serde(default = "default_ulp_tol")]
    pub ulp_tol: u64,

    /// Iterations of the rapid fire check
    #[serde(default = "default_rapid_fire_iterations")]
    pub rapid_fire_iterations: usize,

    /// Buffer length of the rapid fire check
    #[serde(default = "default_rapid_fire_len")]
    pub rapid_fire_len: usize,
}

fn default_samples() -> usize {
    1_000_000
}

fn default_seed() -> u64 {
    0x4152_414e_5941
}

fn default_range() -> f64 {
    1000.0
}

fn default_abs_tol() -> f64 {
    1e-6
}

fn default_rel_tol() -> f64 {
    1e-15
}

fn default_ulp_tol() -> u64 {
    5
}

fn default_rapid_fire_iterations() -> usize {
    1000
}

fn default_rapid_fire_len() -> usize {
    100_000
}

impl AuditConfig {
    /// Tolerance policy described by this config
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            abs: self.abs_tol,
            rel: self.rel_tol,
            ulp: self.ulp_tol,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            seed: default_seed(),
            range: default_range(),
            abs_tol: default_abs_tol(),
            rel_tol: default_rel_tol(),
            ulp_tol: default_ulp_tol(),
            rapid_fire_iterations: default_rapid_fire_iterations(),
            rapid_fire_len: default_rapid_fire_len(),
        }
    }
}

/// Stress benchmark settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchConfig {
    /// Buffer length
    #[serde(default = "default_bench_size")]
    pub size: usize,

    /// Timed repetitions per kernel; the fastest is reported
    #[serde(default = "default_bench_iterations")]
    pub iterations: usize,

    /// Rotation angle in radians
    #[serde(default = "default_bench_angle")]
    pub angle: f64,

    /// Scale factor
    #[serde(default = "default_bench_factor")]
    pub factor: f64,

    /// Largest error still reported as a pass
    #[serde(default = "default_bench_max_error")]
    pub max_error: f64,
}

fn default_bench_size() -> usize {
    10_000_000
}

fn default_bench_iterations() -> usize {
    1
}

fn default_bench_angle() -> f64 {
    0.785398
}

fn default_bench_factor() -> f64 {
    2.5
}

fn default_bench_max_error() -> f64 {
    1e-9
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            size: default_bench_size(),
            iterations: default_bench_iterations(),
            angle: default_bench_angle(),
            factor: default_bench_factor(),
            max_error: default_bench_max_error(),
        }
    }
}
