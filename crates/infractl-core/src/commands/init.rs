//! Local initialization of the infractl config directory.

use std::path::PathBuf;

use crate::config::{CliConfig, CliConfigStore};

/// Outcome of `initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub config_dir: PathBuf,
    /// The config directory did not exist (or was not a directory) before
    pub created_dir: bool,
    /// An empty config.toml was written
    pub created_config: bool,
}

/// Create the config directory and an empty config file.
///
/// With `reset`, everything under the config directory is deleted first.
/// An existing config file is left untouched.
pub fn initialize(store: &CliConfigStore, reset: bool) -> anyhow::Result<InitReport> {
    if reset {
        store.delete_all()?;
    }

    let created_dir = store.ensure_dir()?;
    let created_config = match store.load_saved()? {
        Some(_) => false,
        None => {
            store.save(&CliConfig::new())?;
            true
        }
    };

    tracing::debug!(
        "Initialized {} (created_dir={}, created_config={})",
        store.config_dir().display(),
        created_dir,
        created_config
    );

    Ok(InitReport {
        config_dir: store.config_dir().to_path_buf(),
        created_dir,
        created_config,
    })
}
