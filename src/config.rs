//! Application configuration.
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! ```yaml
//! routes_dir: routes
//! extensions: [rs]
//! addr: 0.0.0.0:8888
//! stack_size: 0x8000
//! env:
//!   universe: Simulation Reality
//! ```
//!
//! Entries under `env` are exported to the process as `SERVER_ENV_<KEY>`
//! before the server starts, so handlers can read them with `std::env::var`.
//!
//! | Variable         | Field        |
//! |------------------|--------------|
//! | `FSR_ROUTES_DIR` | `routes_dir` |
//! | `FSR_ADDR`       | `addr`       |
//! | `FSR_STACK_SIZE` | `stack_size` |

use crate::runtime_config::{parse_stack_size, RuntimeConfig, DEFAULT_STACK_SIZE};
use crate::scanner::DEFAULT_EXTENSIONS;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:8888";

/// Default routes directory, relative to the working directory
pub const DEFAULT_ROUTES_DIR: &str = "routes";

/// Prefix of the variables exported from the `env` section
pub const SERVER_ENV_PREFIX: &str = "SERVER_ENV_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Root of the routes tree
    pub routes_dir: PathBuf,
    /// File extensions treated as handlers
    pub extensions: Vec<String>,
    /// Listen address
    pub addr: String,
    /// Coroutine stack size in bytes; YAML accepts a number or a `0x` string
    #[serde(deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
    /// Variables exported as `SERVER_ENV_<KEY>`
    pub env: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            routes_dir: PathBuf::from(DEFAULT_ROUTES_DIR),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            env: BTreeMap::new(),
        }
    }
}

fn deserialize_stack_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bytes(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bytes(0) => Err(serde::de::Error::custom("stack_size must be positive")),
        Raw::Bytes(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack_size: {s}"))),
    }
}

impl AppConfig {
    /// Read a YAML config file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid YAML for this
    /// structure.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), ?config, "Config file loaded");
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply `FSR_ROUTES_DIR`, `FSR_ADDR` and `FSR_STACK_SIZE`.
    ///
    /// An unparsable stack size is logged and ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var("FSR_ROUTES_DIR") {
            self.routes_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = env::var("FSR_ADDR") {
            self.addr = addr;
        }
        if let Ok(raw) = env::var("FSR_STACK_SIZE") {
            match parse_stack_size(&raw) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %raw, "Invalid FSR_STACK_SIZE, keeping configured value"),
            }
        }
        self
    }

    /// The `env` section as `SERVER_ENV_<KEY>` names and values, in key
    /// order.
    #[must_use]
    pub fn server_env(&self) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(key, value)| {
                (
                    format!("{SERVER_ENV_PREFIX}{}", key.to_uppercase()),
                    value.clone(),
                )
            })
            .collect()
    }

    /// Export [`AppConfig::server_env`] to the process environment.
    ///
    /// Returns what was exported.
    pub fn export_env(&self) -> Vec<(String, String)> {
        let vars = self.server_env();
        for (name, value) in &vars {
            env::set_var(name, value);
        }
        vars
    }

    #[must_use]
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            stack_size: self.stack_size,
        }
    }
}
