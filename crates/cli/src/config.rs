use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use toolbridge_mcp::{BridgeConfig, RiskLevel};

use crate::cli::CliArgs;

/// Return the default config directory path: ~/.config/tool-bridge/
pub fn default_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("could not determine user config directory")?
        .join("tool-bridge");
    Ok(config_dir)
}

/// Return the default config file path.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(default_config_dir()?.join("config.toml"))
}

/// Load the bridge config for this invocation.
///
/// Precedence, lowest first: config file (defaults if it does not exist),
/// environment variables, command-line flags.
pub fn load(args: &CliArgs) -> Result<BridgeConfig> {
    let config_path = match args.config.as_deref() {
        Some(p) => PathBuf::from(p),
        None => default_config_path()?,
    };

    let mut config = read_file(&config_path)?;
    config.apply_env_overrides();
    apply_cli_overrides(&mut config, args)?;
    config
        .validate()
        .with_context(|| format!("invalid configuration ({})", config_path.display()))?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<BridgeConfig> {
    if !path.exists() {
        debug!(?path, "Config file not found, using defaults");
        return Ok(BridgeConfig::default());
    }

    debug!(?path, "Loading config");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_cli_overrides(config: &mut BridgeConfig, args: &CliArgs) -> Result<()> {
    if let Some(ref bin) = args.sidecar {
        config.sidecar.binary = bin.clone();
    }
    if let Some(ref path) = args.sidecar_config {
        config.sidecar.config_path = Some(PathBuf::from(path));
    }
    if args.enable_mutations {
        config.filter.enable_mutations = true;
    }
    if let Some(ref risk) = args.max_risk {
        let level = risk
            .parse::<RiskLevel>()
            .map_err(|e| anyhow::anyhow!("--max-risk: {e}"))?;
        config.filter.max_risk_level = Some(level);
    }
    if !args.allow.is_empty() {
        config.filter.allowed_tools = Some(args.allow.clone());
    }
    Ok(())
}
