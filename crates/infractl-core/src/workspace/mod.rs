//! Workspace definition: the typed infrastructure configs declared in a
//! workspace file, and the filter that selects and orders them.
//!
//! A workspace file is TOML:
//!
//! ```toml
//! name = "my-app"
//!
//! [[configs]]
//! name = "dev-docker"
//! backend = "container"
//! env = "dev"
//!
//! [[configs.resources]]
//! name = "pg"
//! type = "container"
//! group = "db"
//! ```

pub mod error;
pub mod filter;
pub mod parser;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::ResourceFilter;

pub use error::WorkspaceError;
pub use filter::{ConfigSelection, prepare_configs};
pub use parser::{parse_workspace_file, parse_workspace_str};

/// Infrastructure backend a config targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Local container runtime
    Container,
    /// Container orchestrator (Kubernetes and similar)
    Orchestrator,
    /// Cloud provider
    Cloud,
}

impl BackendKind {
    pub fn all() -> [BackendKind; 3] {
        [
            BackendKind::Container,
            BackendKind::Orchestrator,
            BackendKind::Cloud,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            BackendKind::Container => "container",
            BackendKind::Orchestrator => "orchestrator",
            BackendKind::Cloud => "cloud",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "container" | "docker" => Ok(BackendKind::Container),
            "orchestrator" | "k8s" | "kubernetes" => Ok(BackendKind::Orchestrator),
            "cloud" | "aws" => Ok(BackendKind::Cloud),
            _ => anyhow::bail!(
                "Unknown backend: '{}'. Use 'container', 'orchestrator' or 'cloud'",
                s
            ),
        }
    }
}

/// A single resource managed by a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// One backend-specific infrastructure config in a workspace.
///
/// Only `name`, `backend`, `env` and `depends_on` are interpreted here;
/// `settings` is passed through to the backend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraConfig {
    pub name: String,

    pub backend: BackendKind,

    /// Environment this config belongs to (dev, stg, prd, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    /// Configs that must be created before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceSpec>,

    /// Backend-specific settings
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub settings: toml::Table,
}

impl InfraConfig {
    pub fn new(name: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            name: name.into(),
            backend,
            env: None,
            depends_on: Vec::new(),
            resources: Vec::new(),
            settings: toml::Table::new(),
        }
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn with_resource(
        mut self,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        group: Option<&str>,
    ) -> Self {
        self.resources.push(ResourceSpec {
            name: name.into(),
            resource_type: resource_type.into(),
            group: group.map(str::to_string),
        });
        self
    }

    pub fn in_env(&self, env: &str) -> bool {
        self.env.as_deref() == Some(env)
    }

    /// Resources selected by the given filter, in declaration order.
    pub fn select_resources(&self, filter: &ResourceFilter) -> Vec<&ResourceSpec> {
        self.resources.iter().filter(|r| filter.matches(r)).collect()
    }
}

/// Root object of a workspace file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Variables exported to every backend hook run for this workspace
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub configs: Vec<InfraConfig>,
}

impl WorkspaceDefinition {
    pub fn new(configs: Vec<InfraConfig>) -> Self {
        Self {
            name: None,
            env: BTreeMap::new(),
            configs,
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Load and validate a workspace file.
    pub fn from_file(path: &Path) -> Result<Self, WorkspaceError> {
        parse_workspace_file(path)
    }

    pub fn get(&self, name: &str) -> Option<&InfraConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// Environments referenced by any config, sorted.
    pub fn environments(&self) -> BTreeSet<&str> {
        self.configs.iter().filter_map(|c| c.env.as_deref()).collect()
    }

    /// Check names and dependency references.
    pub fn validate(&self) -> Result<(), WorkspaceError> {
        let mut seen = HashSet::new();
        for config in &self.configs {
            if config.name.trim().is_empty() {
                return Err(WorkspaceError::EmptyName);
            }
            if !seen.insert(config.name.as_str()) {
                return Err(WorkspaceError::DuplicateConfig(config.name.clone()));
            }
        }

        for config in &self.configs {
            for dependency in &config.depends_on {
                if dependency == &config.name {
                    return Err(WorkspaceError::SelfDependency(config.name.clone()));
                }
                if !seen.contains(dependency.as_str()) {
                    return Err(WorkspaceError::UnknownDependency {
                        config: config.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
