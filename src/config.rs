//! Layered settings and the validated per-run configuration.
//!
//! [`Settings`] are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the file given
//!    with `--config`
//! 3. Environment variables prefixed `TREEDUPE_` (e.g. `TREEDUPE_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! [`ScanConfig`] is built once from the merged settings, validated, and
//! then only read. Every component receives it (or pieces of it) by
//! reference.
//!
//! ```toml
//! # ~/.config/treedupe/config.toml
//! file_extensions = ["jpg", "png"]
//! path_blacklist = [".git", "node_modules"]
//! blacklist_mode = "segment"
//! keep = "oldest"
//! hash_algorithm = "sha256"
//! io_threads = 2
//! min_size = 1024
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::ActionMode;
use crate::cli::Cli;
use crate::duplicates::{FinderConfig, RetentionPolicy};
use crate::scanner::{BlacklistMode, HashAlgorithm, PathFilter, WalkerConfig};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TREEDUPE_";

/// Errors that stop a run before any scanning starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The scan root does not exist.
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    /// The scan root exists but is not a directory.
    #[error("Root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The scan root could not be resolved to an absolute path.
    #[error("Cannot resolve root directory {path}: {source}")]
    RootUnresolvable {
        /// Root as given
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The working directory could not be determined.
    #[error("Cannot determine current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    /// A settings layer failed to parse or holds an invalid value.
    #[error("Invalid settings: {0}")]
    Load(#[source] Box<figment::Error>),

    /// Zero hashing threads were requested.
    #[error("io_threads must be at least 1")]
    InvalidIoThreads,

    /// Minimum size is above maximum size.
    #[error("min_size ({min}) is greater than max_size ({max})")]
    InvalidSizeRange {
        /// Configured minimum
        min: u64,
        /// Configured maximum
        max: u64,
    },
}

/// User-tunable settings, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Extension allow-list; empty means every file is eligible
    pub file_extensions: Vec<String>,
    /// Blacklist tokens
    pub path_blacklist: Vec<String>,
    /// How blacklist tokens match
    pub blacklist_mode: BlacklistMode,
    /// Which copy of a duplicate group survives
    pub keep: RetentionPolicy,
    /// Content hash algorithm
    pub hash_algorithm: HashAlgorithm,
    /// Hashing threads
    pub io_threads: usize,
    /// Smallest file size considered, in bytes
    pub min_size: Option<u64>,
    /// Largest file size considered, in bytes
    pub max_size: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file_extensions: Vec::new(),
            path_blacklist: Vec::new(),
            blacklist_mode: BlacklistMode::default(),
            keep: RetentionPolicy::default(),
            hash_algorithm: HashAlgorithm::default(),
            io_threads: 4,
            min_size: None,
            max_size: None,
        }
    }
}

impl Settings {
    /// Platform config file location, e.g. `~/.config/treedupe/config.toml`.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "treedupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// `config_file` replaces the platform default file when given.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match config_file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::default_config_path() {
                    log::debug!("Default config path: {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load defaults, file and environment layers.
    ///
    /// # Errors
    ///
    /// - `ConfigFileNotFound` if `config_file` is given but missing
    /// - `Load` if any layer is malformed (including an unknown `keep` value)
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
            }
        }

        let settings: Self = Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        log::debug!("Loaded settings: {settings:?}");
        Ok(settings)
    }

    /// Apply command-line overrides on top of the loaded layers.
    #[must_use]
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if !cli.file_extensions.is_empty() {
            self.file_extensions = cli.file_extensions.clone();
        }
        if !cli.path_blacklist.is_empty() {
            self.path_blacklist = cli.path_blacklist.clone();
        }
        if let Some(mode) = cli.blacklist_mode {
            self.blacklist_mode = mode;
        }
        if let Some(policy) = cli.retention() {
            self.keep = policy;
        }
        if let Some(algorithm) = cli.algorithm {
            self.hash_algorithm = algorithm;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        self
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    root: PathBuf,
    filter: PathFilter,
    retention: RetentionPolicy,
    mode: ActionMode,
    detect_empty_dirs: bool,
    algorithm: HashAlgorithm,
    io_threads: usize,
    min_size: Option<u64>,
    max_size: Option<u64>,
}

impl ScanConfig {
    /// Validate settings against `root` and freeze them.
    ///
    /// The root is canonicalized, so every reported path is absolute.
    ///
    /// # Errors
    ///
    /// - `RootNotFound` / `NotADirectory` / `RootUnresolvable` for a bad root
    /// - `InvalidIoThreads` if `io_threads` is zero
    /// - `InvalidSizeRange` if `min_size > max_size`
    pub fn from_settings(
        root: &Path,
        settings: &Settings,
        mode: ActionMode,
        detect_empty_dirs: bool,
    ) -> Result<Self, ConfigError> {
        let canonical = fs::canonicalize(root).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::RootNotFound(root.to_path_buf()),
            _ => ConfigError::RootUnresolvable {
                path: root.to_path_buf(),
                source: e,
            },
        })?;
        if !canonical.is_dir() {
            return Err(ConfigError::NotADirectory(root.to_path_buf()));
        }

        if settings.io_threads == 0 {
            return Err(ConfigError::InvalidIoThreads);
        }
        if let (Some(min), Some(max)) = (settings.min_size, settings.max_size) {
            if min > max {
                return Err(ConfigError::InvalidSizeRange { min, max });
            }
        }

        Ok(Self {
            root: canonical,
            filter: PathFilter::new(
                &settings.file_extensions,
                &settings.path_blacklist,
                settings.blacklist_mode,
            ),
            retention: settings.keep,
            mode,
            detect_empty_dirs,
            algorithm: settings.hash_algorithm,
            io_threads: settings.io_threads,
            min_size: settings.min_size,
            max_size: settings.max_size,
        })
    }

    /// Canonical scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Retention policy.
    #[must_use]
    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Dry-run or destructive.
    #[must_use]
    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    /// Whether empty directories are reported (and removed when destructive).
    #[must_use]
    pub fn detect_empty_dirs(&self) -> bool {
        self.detect_empty_dirs
    }

    /// Hash algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Walker options derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            min_size: self.min_size,
            max_size: self.max_size,
            detect_empty_dirs: self.detect_empty_dirs,
        }
    }

    /// Finder options derived from this configuration.
    ///
    /// Shutdown flag and progress callback are attached by the caller.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_algorithm(self.algorithm)
            .with_filter(self.filter.clone())
            .with_walker_config(self.walker_config())
    }
}
