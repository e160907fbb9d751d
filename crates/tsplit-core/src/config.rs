//! tsplit.toml configuration parser.
//!
//! Every section and field is optional; missing values fall back to the
//! same defaults the CLI documents. CLI flags override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tsplit_partition::AnnealConfig;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "tsplit.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub nodes: NodesConfig,
    pub partition: AnnealConfig,
    pub collect: CollectConfig,
    pub build: BuildConfig,
    pub emit: EmitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    /// Number of nodes (and generated scripts).
    pub count: usize,
    /// Concurrent test binaries per node, passed to the script template.
    pub concurrency: usize,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            count: 4,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Discover packages with `go list` instead of reading stdin.
    pub scan_packages: bool,
    /// Regex of import paths to skip when scanning.
    pub exclude: Option<String>,
    /// Directory holding JUnit XML and `go test -json` reports.
    pub report_dir: PathBuf,
    /// Duration assumed for tests with no history.
    pub default_duration_secs: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            scan_packages: false,
            exclude: None,
            report_dir: PathBuf::from("./test-reports"),
            default_duration_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub disabled: bool,
    pub binaries_dir: PathBuf,
    /// Maximum concurrent `go test -c` invocations.
    pub concurrency: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            binaries_dir: PathBuf::from("./test-bin"),
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    pub scripts_dir: PathBuf,
    /// Custom script template. The built-in one is used when unset.
    pub template: Option<PathBuf>,
    /// Maximum test functions per `-test.run` pattern (0 = unlimited).
    pub max_functions: usize,
    /// Extra flags passed to every test binary.
    pub test_flags: Vec<String>,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("./test-scripts"),
            template: None,
            max_functions: 0,
            test_flags: Vec::new(),
        }
    }
}

impl SplitConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else `tsplit.toml` in `dir` if present,
    /// else defaults.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.count == 0 {
            return Err(ConfigError::Invalid("nodes.count must be at least 1".into()));
        }
        if self.nodes.concurrency == 0 {
            return Err(ConfigError::Invalid("nodes.concurrency must be at least 1".into()));
        }
        if self.build.concurrency == 0 {
            return Err(ConfigError::Invalid("build.concurrency must be at least 1".into()));
        }
        self.partition
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
