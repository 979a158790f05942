//! Configuration schema for config.toml
//!
//! ```toml
//! [user]
//! id = 7
//! email = "dev@example.com"
//!
//! [backends.container]
//! command = "container-hook"
//! args = ["--verbose"]
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workspace::BackendKind;

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// API token for the signed-in user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Signed-in user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,

    /// Workspaces known to the signed-in user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceEntry>,

    /// Hook command per backend, keyed by backend id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub backends: BTreeMap<String, HookConfig>,
}

impl CliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user: UserProfile) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    /// Validate backend keys and hook commands
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen: BTreeMap<BackendKind, &str> = BTreeMap::new();
        for (key, hook) in &self.backends {
            let kind = key.parse::<BackendKind>()?;
            if let Some(previous) = seen.insert(kind, key) {
                anyhow::bail!(
                    "Backend '{}' is configured twice ('{}' and '{}')",
                    kind,
                    previous,
                    key
                );
            }
            hook.validate()?;
        }
        Ok(())
    }

    /// Rewrite alias keys such as `docker` to their canonical backend id.
    pub fn normalize_backends(&mut self) -> anyhow::Result<()> {
        self.validate()?;
        let backends = std::mem::take(&mut self.backends);
        for (key, hook) in backends {
            let kind = key.parse::<BackendKind>()?;
            self.backends.insert(kind.id().to_string(), hook);
        }
        Ok(())
    }

    pub fn hook(&self, backend: BackendKind) -> Option<&HookConfig> {
        self.backends
            .iter()
            .find(|(key, _)| key.parse::<BackendKind>().ok() == Some(backend))
            .map(|(_, hook)| hook)
    }

    /// Configured hooks with their parsed backend tags.
    pub fn hooks(&self) -> Vec<(BackendKind, &HookConfig)> {
        self.backends
            .iter()
            .filter_map(|(key, hook)| key.parse::<BackendKind>().ok().map(|kind| (kind, hook)))
            .collect()
    }

    pub fn set_hook(&mut self, backend: BackendKind, hook: HookConfig) -> Option<HookConfig> {
        let previous = self.remove_hook(backend);
        self.backends.insert(backend.id().to_string(), hook);
        previous
    }

    /// Remove the hook for `backend` under any of its key spellings.
    pub fn remove_hook(&mut self, backend: BackendKind) -> Option<HookConfig> {
        let keys: Vec<String> = self
            .backends
            .keys()
            .filter(|key| key.parse::<BackendKind>().ok() == Some(backend))
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|key| self.backends.remove(&key))
            .last()
    }

    /// Replace the workspace list, stamping each entry with `synced_at`.
    pub fn replace_workspaces(
        &mut self,
        workspaces: Vec<WorkspaceEntry>,
        synced_at: DateTime<Utc>,
    ) {
        self.workspaces = workspaces
            .into_iter()
            .map(|mut ws| {
                ws.synced_at = Some(synced_at);
                ws
            })
            .collect();
    }

    /// Forget the user and everything tied to their account.
    pub fn sign_out(&mut self) {
        self.user = None;
        self.auth_token = None;
        self.workspaces.clear();
    }
}

/// Account details returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Workspace registered with the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

/// External executable implementing one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Whether the hook understands `--dry-run`; when false, dry runs are
    /// reported without invoking it
    #[serde(default = "default_supports_dry_run")]
    pub supports_dry_run: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

fn default_supports_dry_run() -> bool {
    true
}

impl HookConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            supports_dry_run: true,
            env: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn without_dry_run(mut self) -> Self {
        self.supports_dry_run = false;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.command.trim().is_empty() {
            anyhow::bail!("Hook command must not be empty");
        }
        Ok(())
    }
}
