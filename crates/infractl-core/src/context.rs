//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{ApiClient, EventResponse, EventWorkspace, WorkspaceEvent};
use crate::backend::{AdapterRegistry, Confirm};
use crate::commands::{AuthCommand, LifecycleReport, ResourcesCommand};
use crate::config::{CliConfigStore, default_config_dir};
use crate::settings::CliSettings;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "INFRACTL_CONFIG_DIR";

/// Unified application context for dependency injection.
///
/// The CLI creates this once and builds every command from it.
#[derive(Debug, Clone)]
pub struct AppContext {
    settings: CliSettings,
    config_dir: PathBuf,
}

impl AppContext {
    /// Create a new context with explicit settings and config directory.
    pub fn new(settings: CliSettings, config_dir: PathBuf) -> Self {
        Self {
            settings,
            config_dir,
        }
    }

    /// Create context from `INFRACTL_*` environment variables and the
    /// platform config directory.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = CliSettings::from_env()?;
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_config_dir()?,
        };
        Ok(Self::new(settings, config_dir))
    }

    pub fn settings(&self) -> &CliSettings {
        &self.settings
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_store(&self) -> CliConfigStore {
        CliConfigStore::from_dir(self.config_dir.clone())
    }

    /// API client carrying the saved auth token, if any.
    pub fn api_client(&self) -> anyhow::Result<ApiClient> {
        let client = ApiClient::new(self.settings.clone())?;
        let token = self
            .config_store()
            .load_saved()?
            .and_then(|config| config.auth_token);
        Ok(match token {
            Some(token) => client.with_auth_token(token),
            None => client,
        })
    }

    pub fn auth_command(&self) -> anyhow::Result<AuthCommand> {
        Ok(AuthCommand::new(
            self.config_store(),
            ApiClient::new(self.settings.clone())?,
        ))
    }

    /// Adapter registry built from the backend hooks in the saved config.
    pub fn adapter_registry(&self, confirm: Arc<dyn Confirm>) -> anyhow::Result<AdapterRegistry> {
        let config = self.config_store().load_or_default()?;
        let registry = AdapterRegistry::from_hooks(config.hooks(), confirm);
        if registry.is_empty() {
            tracing::debug!(
                "No backend hooks configured in {}",
                self.config_store().config_path().display()
            );
        }
        Ok(registry)
    }

    pub fn resources_command(&self, confirm: Arc<dyn Confirm>) -> anyhow::Result<ResourcesCommand> {
        Ok(ResourcesCommand::new(self.adapter_registry(confirm)?))
    }

    /// Best-effort report of a lifecycle run to the API.
    ///
    /// Skipped when the API is disabled or nobody is signed in. Never fails.
    pub fn log_lifecycle_event(&self, report: &LifecycleReport) -> Option<EventResponse> {
        if !self.settings.api_enabled {
            return None;
        }
        let config = self.config_store().load_saved().ok().flatten()?;
        let token = config.auth_token.clone()?;

        let id = report.workspace.as_deref().and_then(|name| {
            config
                .workspaces
                .iter()
                .find(|ws| ws.name == name)
                .and_then(|ws| ws.id)
        });
        let workspace = EventWorkspace {
            name: report.workspace.clone(),
            id,
        };
        let event = WorkspaceEvent::lifecycle(&report.result);

        let client = ApiClient::new(self.settings.clone()).ok()?.with_auth_token(token);
        let runtime = tokio::runtime::Runtime::new().ok()?;
        runtime.block_on(client.log_workspace_event(&event, &workspace))
    }
}
