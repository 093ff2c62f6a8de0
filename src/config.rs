//! Job configuration as read from the TOML configuration file.
//!
//! Every phase is configured by an ordered list of [TargetConfig]s. Targets
//! are loose string maps: which keys are required depends on the phase that
//! consumes them (see [`crate::phases`]).

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error};

use crate::phases::Phase;

const DEFAULT_DUPLICACY: &str = "duplicacy";

/// Configuration of a complete job run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JobConfig {
    /// Repository directory, used as working directory of every duplicacy invocation.
    pub repository: PathBuf,

    /// Path to the duplicacy executable.
    #[serde(default = "default_duplicacy")]
    pub duplicacy: PathBuf,

    /// Directory of the run logs.
    ///
    /// Defaults to `.duplicacy/logs` inside the [repository](Self::repository).
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Storages to back up to, in order.
    #[serde(default)]
    pub backup: Vec<TargetConfig>,

    /// Storage copies performed after all backups succeeded.
    #[serde(default)]
    pub copy: Vec<TargetConfig>,

    /// Storages to prune.
    #[serde(default)]
    pub prune: Vec<TargetConfig>,

    /// Storages to check.
    #[serde(default)]
    pub check: Vec<TargetConfig>,
}

fn default_duplicacy() -> PathBuf {
    PathBuf::from(DEFAULT_DUPLICACY)
}

/// Errors on loading the [JobConfig].
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// The configuration file can't be read.
    #[display("Reading config file {} failed: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    /// The configuration file isn't valid.
    #[display("Parsing config file {} failed: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl JobConfig {
    /// Create a configuration without any targets.
    pub fn new(repository: impl Into<PathBuf>, duplicacy: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            duplicacy: duplicacy.into(),
            log_dir: None,
            backup: Vec::new(),
            copy: Vec::new(),
            prune: Vec::new(),
            check: Vec::new(),
        }
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!(
            target: "config",
            "Loaded {}: {} backup, {} copy, {} prune, {} check target(s)",
            path.display(),
            config.backup.len(),
            config.copy.len(),
            config.prune.len(),
            config.check.len(),
        );
        Ok(config)
    }

    /// Effective directory of the run logs.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.repository.join(".duplicacy").join("logs"))
    }
}

/// Configuration of a single target of a phase.
///
/// Values are kept as strings. Flags such as `vss` or `all` are only enabled
/// by the exact value `"true"`, see [is_enabled](Self::is_enabled).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(
    from = "BTreeMap<String, ScalarValue>",
    into = "BTreeMap<String, String>"
)]
pub struct TargetConfig(BTreeMap<String, String>);

/// A required key of a [TargetConfig] is missing.
#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display("{phase} target #{} is missing required key '{key}'", index + 1)]
pub struct TargetError {
    pub phase: Phase,
    pub index: usize,
    pub key: &'static str,
}

impl TargetConfig {
    /// Value of `key`, if configured.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the flag `key` is set to exactly `"true"`.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// Value of the required `key`. Blank values count as missing.
    pub(crate) fn require(
        &self,
        phase: Phase,
        index: usize,
        key: &'static str,
    ) -> Result<&str, TargetError> {
        self.get(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or(TargetError { phase, index, key })
    }

    /// Set `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TargetConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for TargetConfig {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<String, ScalarValue>> for TargetConfig {
    fn from(map: BTreeMap<String, ScalarValue>) -> Self {
        map.into_iter().map(|(k, v)| (k, v.to_string())).collect()
    }
}

impl From<TargetConfig> for BTreeMap<String, String> {
    fn from(target: TargetConfig) -> Self {
        target.0
    }
}

/// Any TOML scalar. Normalized to its string form.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}
