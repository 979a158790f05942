//! Config store for loading and saving config.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{CliConfig, parser, paths};

#[derive(Debug, Clone)]
pub struct CliConfigStore {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl CliConfigStore {
    pub fn from_default_dir() -> anyhow::Result<Self> {
        Ok(Self::from_dir(paths::default_config_dir()?))
    }

    pub fn from_dir(config_dir: PathBuf) -> Self {
        let config_path = paths::config_file_in(&config_dir);
        Self {
            config_dir,
            config_path,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the saved config, or `None` when nothing has been saved yet.
    pub fn load_saved(&self) -> anyhow::Result<Option<CliConfig>> {
        if !self.config_path.exists() {
            return Ok(None);
        }
        parser::parse_cli_config(&self.config_path).map(Some)
    }

    pub fn load_or_default(&self) -> anyhow::Result<CliConfig> {
        Ok(self.load_saved()?.unwrap_or_default())
    }

    pub fn save(&self, config: &CliConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config)?;
        self.ensure_dir()?;
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        tracing::debug!("Saved CLI config to {}", self.config_path.display());
        Ok(())
    }

    /// Make sure the config directory exists and is a directory.
    ///
    /// A plain file in its place is removed first. Returns true when the
    /// directory had to be created.
    pub fn ensure_dir(&self) -> anyhow::Result<bool> {
        if self.config_dir.exists() {
            if self.config_dir.is_dir() {
                return Ok(false);
            }
            tracing::debug!(
                "{} exists but is not a directory, replacing it",
                self.config_dir.display()
            );
            std::fs::remove_file(&self.config_dir).with_context(|| {
                format!(
                    "Something went wrong, please delete {} and run again",
                    self.config_dir.display()
                )
            })?;
        }

        std::fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.config_dir.display()
            )
        })?;
        tracing::debug!("Created {}", self.config_dir.display());
        Ok(true)
    }

    /// Remove the config directory and everything in it.
    pub fn delete_all(&self) -> anyhow::Result<()> {
        if !self.config_dir.exists() {
            return Ok(());
        }
        tracing::debug!("Removing existing configuration");
        if self.config_dir.is_dir() {
            std::fs::remove_dir_all(&self.config_dir)
        } else {
            std::fs::remove_file(&self.config_dir)
        }
        .with_context(|| format!("Failed to remove {}", self.config_dir.display()))
    }
}
