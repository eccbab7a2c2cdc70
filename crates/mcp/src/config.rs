//! Bridge configuration.
//!
//! Parsed from TOML with environment variable overrides applied on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filter::BridgeFilterConfig;

/// Environment variable injected into the sidecar so it knows who launched it.
pub const HOST_MARKER_ENV: &str = "TOOL_BRIDGE_HOST";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full bridge configuration: how to launch the sidecar and what to expose.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub sidecar: SidecarConfig,

    #[serde(default)]
    pub filter: BridgeFilterConfig,
}

/// How to launch the sidecar process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// Path or name of the sidecar executable.
    #[serde(default)]
    pub binary: String,

    /// Sidecar config file, passed as the leading `--config <path>` pair.
    #[serde(default)]
    pub config_path: Option<PathBuf>,

    /// Extra arguments after the config pair.
    #[serde(default)]
    pub args: Vec<String>,

    /// Variables merged over the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Name sent in `clientInfo` and as the host marker value.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Grace period between SIGTERM and force kill.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_client_name() -> String {
    "tool-bridge".into()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            binary: String::new(),
            config_path: None,
            args: Vec::new(),
            env: HashMap::new(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl SidecarConfig {
    /// Config for launching `binary` with defaults everywhere else.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Default::default()
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Full argument list: `--config <path>` first (if set), then `args`.
    pub fn command_args(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len() + 2);
        if let Some(path) = &self.config_path {
            out.push("--config".to_string());
            out.push(path.display().to_string());
        }
        out.extend(self.args.iter().cloned());
        out
    }

    /// Environment for the child: configured vars plus the host marker.
    pub fn command_env(&self) -> HashMap<String, String> {
        let mut env = self.env.clone();
        env.entry(HOST_MARKER_ENV.to_string())
            .or_insert_with(|| self.client_name.clone());
        env
    }
}

impl BridgeConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sidecar.binary.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sidecar.binary must name an executable".into(),
            ));
        }
        if self.sidecar.shutdown_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sidecar.shutdown_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// - `TOOL_BRIDGE_SIDECAR_BIN` -> `sidecar.binary`
    /// - `TOOL_BRIDGE_SIDECAR_CONFIG` -> `sidecar.config_path`
    /// - `TOOL_BRIDGE_ENABLE_MUTATIONS` -> `filter.enable_mutations`
    /// - `TOOL_BRIDGE_MAX_RISK` -> `filter.max_risk_level`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TOOL_BRIDGE_SIDECAR_BIN") {
            if !v.is_empty() {
                self.sidecar.binary = v;
            }
        }
        if let Ok(v) = std::env::var("TOOL_BRIDGE_SIDECAR_CONFIG") {
            if !v.is_empty() {
                self.sidecar.config_path = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = std::env::var("TOOL_BRIDGE_ENABLE_MUTATIONS") {
            self.filter.enable_mutations = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("TOOL_BRIDGE_MAX_RISK") {
            match v.parse() {
                Ok(level) => self.filter.max_risk_level = Some(level),
                Err(e) => tracing::warn!(error = %e, "ignoring TOOL_BRIDGE_MAX_RISK"),
            }
        }
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
