//! Shared value types used by the filter, dispatcher and adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workspace::ResourceSpec;

/// A lifecycle operation applied to a resource configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleOperation {
    /// Create resources
    Deploy,
    /// Tear resources down
    Shutdown,
    /// Update resources in place
    Patch,
}

impl LifecycleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOperation::Deploy => "deploy",
            LifecycleOperation::Shutdown => "shutdown",
            LifecycleOperation::Patch => "patch",
        }
    }

    /// Past tense used in summary lines ("# Configs deployed: 2/2").
    pub fn past_tense(&self) -> &'static str {
        match self {
            LifecycleOperation::Deploy => "deployed",
            LifecycleOperation::Shutdown => "shutdown",
            LifecycleOperation::Patch => "patched",
        }
    }

    /// Whether the operation may remove external state and needs confirmation.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            LifecycleOperation::Shutdown | LifecycleOperation::Patch
        )
    }

    /// Ordering the config filter must apply before dispatching this operation.
    pub fn config_order(&self) -> ConfigOrder {
        match self {
            LifecycleOperation::Shutdown => ConfigOrder::ForTeardown,
            LifecycleOperation::Deploy | LifecycleOperation::Patch => ConfigOrder::ForCreation,
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency ordering requested from the config filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrder {
    /// Dependencies before dependents
    ForCreation,
    /// Exact reverse of `ForCreation`
    ForTeardown,
}

/// Execution mode forwarded unchanged to every adapter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExecutionMode {
    /// Compute and report actions without mutating external state
    pub dry_run: bool,
    /// Skip interactive confirmation before destructive actions
    pub auto_confirm: bool,
}

impl ExecutionMode {
    pub fn new(dry_run: bool, auto_confirm: bool) -> Self {
        Self {
            dry_run,
            auto_confirm,
        }
    }

    pub fn dry_run() -> Self {
        Self::new(true, false)
    }
}

/// Narrows which resources inside a config an adapter acts on.
///
/// Every field that is set must equal the resource's field for the resource
/// to be selected. An empty filter selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceFilter {
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub group: Option<String>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.resource_type.is_none() && self.group.is_none()
    }

    pub fn matches(&self, resource: &ResourceSpec) -> bool {
        if let Some(ref name) = self.name
            && name != &resource.name
        {
            return false;
        }
        if let Some(ref resource_type) = self.resource_type
            && resource_type != &resource.resource_type
        {
            return false;
        }
        if let Some(ref group) = self.group
            && resource.group.as_deref() != Some(group.as_str())
        {
            return false;
        }
        true
    }
}
