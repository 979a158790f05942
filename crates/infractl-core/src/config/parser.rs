//! TOML parser for the CLI config

use super::schema::CliConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse config.toml
pub fn parse_cli_config(path: &Path) -> Result<CliConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_cli_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config.toml content from string
pub fn parse_cli_config_str(content: &str) -> Result<CliConfig> {
    let mut config: CliConfig = toml::from_str(content)
        .map_err(|e| anyhow::anyhow!("TOML parsing error: {}", e.message()))?;

    config.normalize_backends()?;
    Ok(config)
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &CliConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config to TOML")
}
