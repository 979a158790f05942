//! Start, stop and patch workspace resources.
//!
//! Loads the workspace file, selects and orders its configs, and hands them to
//! the dispatcher. A missing or invalid workspace file fails before anything
//! is dispatched.

use std::path::PathBuf;

use anyhow::Context;

use crate::backend::AdapterRegistry;
use crate::dispatch::{LifecycleDispatcher, LifecycleResult, ProgressReporter};
use crate::types::{ExecutionMode, LifecycleOperation, ResourceFilter};
use crate::workspace::{ConfigSelection, WorkspaceDefinition, prepare_configs};

/// Default workspace file name looked up in the current directory
pub const DEFAULT_WORKSPACE_FILE: &str = "workspace.toml";

/// Options shared by start, stop and patch
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Workspace file to load
    pub workspace_file: PathBuf,
    /// Environment / named-config selection
    pub selection: ConfigSelection,
    /// Resource name / type / group filter forwarded to adapters
    pub filter: ResourceFilter,
    /// Dry-run and auto-confirm flags
    pub mode: ExecutionMode,
}

impl LifecycleOptions {
    pub fn new(workspace_file: impl Into<PathBuf>) -> Self {
        Self {
            workspace_file: workspace_file.into(),
            selection: ConfigSelection::default(),
            filter: ResourceFilter::default(),
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.selection.env = Some(env.into());
        self
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.selection.config = Some(config.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.filter.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.filter.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.filter.group = Some(group.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.mode.dry_run = dry_run;
        self
    }

    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.mode.auto_confirm = auto_confirm;
        self
    }
}

/// Report from a lifecycle command
#[derive(Debug, Clone)]
pub struct LifecycleReport {
    /// Name declared in the workspace file, if any
    pub workspace: Option<String>,
    pub result: LifecycleResult,
}

/// Lifecycle command orchestrator
#[derive(Debug)]
pub struct ResourcesCommand {
    registry: AdapterRegistry,
}

impl ResourcesCommand {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Deploy configs in creation order.
    pub fn start(
        &self,
        options: &LifecycleOptions,
        reporter: &dyn ProgressReporter,
    ) -> anyhow::Result<LifecycleReport> {
        self.execute(LifecycleOperation::Deploy, options, reporter)
    }

    /// Shut configs down in teardown order.
    pub fn stop(
        &self,
        options: &LifecycleOptions,
        reporter: &dyn ProgressReporter,
    ) -> anyhow::Result<LifecycleReport> {
        self.execute(LifecycleOperation::Shutdown, options, reporter)
    }

    /// Patch configs in creation order.
    pub fn patch(
        &self,
        options: &LifecycleOptions,
        reporter: &dyn ProgressReporter,
    ) -> anyhow::Result<LifecycleReport> {
        self.execute(LifecycleOperation::Patch, options, reporter)
    }

    pub fn execute(
        &self,
        operation: LifecycleOperation,
        options: &LifecycleOptions,
        reporter: &dyn ProgressReporter,
    ) -> anyhow::Result<LifecycleReport> {
        tracing::debug!("\ttarget_env   : {:?}", options.selection.env);
        tracing::debug!("\ttarget_config: {:?}", options.selection.config);
        tracing::debug!("\ttarget_name  : {:?}", options.filter.name);
        tracing::debug!("\ttarget_type  : {:?}", options.filter.resource_type);
        tracing::debug!("\ttarget_group : {:?}", options.filter.group);
        tracing::debug!("\tdry_run      : {}", options.mode.dry_run);
        tracing::debug!("\tauto_confirm : {}", options.mode.auto_confirm);

        let workspace = WorkspaceDefinition::from_file(&options.workspace_file)?;
        let configs = prepare_configs(&workspace, &options.selection, operation.config_order())
            .with_context(|| {
                format!(
                    "Failed to prepare configs from {}",
                    options.workspace_file.display()
                )
            })?;

        let result = LifecycleDispatcher::new(&self.registry)
            .with_reporter(reporter)
            .with_env(&workspace.env)
            .run(operation, &configs, &options.filter, options.mode);

        if !result.is_success() {
            tracing::error!("Workspace {} failed", operation);
        }

        Ok(LifecycleReport {
            workspace: workspace.name,
            result,
        })
    }
}
