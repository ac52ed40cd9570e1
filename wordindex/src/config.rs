use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{IndexError, IndexResult};

/// Worker count used when the operator asks for threads without a usable value
pub const DEFAULT_THREADS: usize = 5;
/// Largest worker count accepted from the operator
pub const MAX_THREADS: usize = 5;
/// Index dump destination used when none is given
pub const DEFAULT_INDEX_OUTPUT: &str = "index.txt";
/// Results dump destination used when none is given
pub const DEFAULT_RESULTS_OUTPUT: &str = "results.txt";

/// Number of worker threads for one pipeline, always within `1..=MAX_THREADS`.
///
/// Values outside that range, and values that do not parse, fall back to
/// [`DEFAULT_THREADS`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadCount(NonZeroUsize);

impl ThreadCount {
    /// Clamps `n` into the accepted range, falling back to the default.
    pub fn new(n: usize) -> Self {
        match NonZeroUsize::new(n) {
            Some(count) if n <= MAX_THREADS => Self(count),
            _ => {
                warn!(
                    "Thread count {} out of range 1..={}, running with default threads: {}",
                    n, MAX_THREADS, DEFAULT_THREADS
                );
                Self::default()
            }
        }
    }

    /// Parses an operator-supplied value such as the argument of `--threads`.
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(n) if n > 0 => Self::new(usize::try_from(n).unwrap_or(usize::MAX)),
            Ok(n) => {
                warn!(
                    "Thread count {} out of range 1..={}, running with default threads: {}",
                    n, MAX_THREADS, DEFAULT_THREADS
                );
                Self::default()
            }
            Err(_) => {
                warn!(
                    "Improper thread count '{}', running with default threads: {}",
                    value, DEFAULT_THREADS
                );
                Self::default()
            }
        }
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(DEFAULT_THREADS - 1))
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ThreadCount {
    fn from(n: usize) -> Self {
        Self::new(n)
    }
}

impl Serialize for ThreadCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.get() as u64)
    }
}

impl<'de> Deserialize<'de> for ThreadCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Setting {
            Number(i64),
            Text(String),
        }

        Ok(match Setting::deserialize(deserializer)? {
            Setting::Number(n) => Self::parse(&n.to_string()),
            Setting::Text(text) => Self::parse(&text),
        })
    }
}

/// Operator configuration for a build/search run.
///
/// # Configuration Locations
///
/// Loaded from, in increasing order of precedence:
/// 1. Global `$HOME/.config/wordindex/config.yaml`
/// 2. Local `.wordindex.yaml` in the current directory
/// 3. Custom config file given with `--config`
///
/// Command-line values are applied last with [`IndexConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Directory (or single .txt file) to index
/// root_path: "corpus"
///
/// # Worker threads per pipeline, 1..=5. Leave out to run single threaded.
/// threads: 4
///
/// # Query file, one query per line
/// query_path: "queries.txt"
///
/// # Where to write the dumps
/// index_output: "index.txt"
/// results_output: "results.txt"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Directory to index
    #[serde(default)]
    pub root_path: Option<PathBuf>,

    /// Worker threads per pipeline; `None` runs both pipelines sequentially
    #[serde(default)]
    pub threads: Option<ThreadCount>,

    /// Query file to evaluate against the index
    #[serde(default)]
    pub query_path: Option<PathBuf>,

    /// Destination of the index dump; `None` skips the dump
    #[serde(default)]
    pub index_output: Option<PathBuf>,

    /// Destination of the results dump; `None` skips the dump
    #[serde(default)]
    pub results_output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            threads: None,
            query_path: None,
            index_output: None,
            results_output: None,
            log_level: default_log_level(),
        }
    }
}

impl IndexConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("wordindex/config.yaml")),
            Some(PathBuf::from(".wordindex.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: IndexConfig) -> Self {
        if cli_config.root_path.is_some() {
            self.root_path = cli_config.root_path;
        }
        if cli_config.threads.is_some() {
            self.threads = cli_config.threads;
        }
        if cli_config.query_path.is_some() {
            self.query_path = cli_config.query_path;
        }
        if cli_config.index_output.is_some() {
            self.index_output = cli_config.index_output;
        }
        if cli_config.results_output.is_some() {
            self.results_output = cli_config.results_output;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }

    /// Writes the configuration as YAML, loadable again with [`load_from`](Self::load_from)
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| IndexError::config_error(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, yaml).map_err(|e| IndexError::from_io(path, e))
    }

    /// Whether the pipelines should run on worker pools
    pub fn is_parallel(&self) -> bool {
        self.threads.is_some()
    }
}
