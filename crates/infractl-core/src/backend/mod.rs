//! Backend adapter layer.
//!
//! Every infrastructure backend plugs in through [`BackendAdapter`], keyed by
//! the [`BackendKind`] tag of the configs it understands. The dispatcher only
//! ever talks to this trait; how a backend provisions resources is its own
//! business.

pub mod confirm;
pub mod hook;
pub mod registry;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{ExecutionMode, LifecycleOperation, ResourceFilter};
use crate::workspace::{BackendKind, InfraConfig, ResourceSpec};

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use hook::HookAdapter;
pub use registry::AdapterRegistry;

/// Failure of a single adapter call.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{operation} of '{config}' was not confirmed")]
    Declined {
        operation: LifecycleOperation,
        config: String,
    },

    #[error("Failed to run hook command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Hook command '{command}' failed ({}): {stderr}", exit_label(.code))]
    HookFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Everything an adapter receives for one config.
#[derive(Debug, Clone, Copy)]
pub struct AdapterRequest<'a> {
    pub config: &'a InfraConfig,
    pub filter: &'a ResourceFilter,
    pub mode: ExecutionMode,
    /// Workspace-level variables for the backend process
    pub env: &'a BTreeMap<String, String>,
}

pub(crate) static NO_ENV: BTreeMap<String, String> = BTreeMap::new();

impl<'a> AdapterRequest<'a> {
    pub fn new(config: &'a InfraConfig, filter: &'a ResourceFilter, mode: ExecutionMode) -> Self {
        Self {
            config,
            filter,
            mode,
            env: &NO_ENV,
        }
    }

    pub fn with_env(mut self, env: &'a BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn selected_resources(&self) -> Vec<&'a ResourceSpec> {
        self.config.select_resources(self.filter)
    }
}

/// A backend able to deploy, shut down and patch configs of one kind.
///
/// Implementations must not mutate external state when `mode.dry_run` is set,
/// and must ask for confirmation before destructive actions unless
/// `mode.auto_confirm` is set. Retries, if any, happen inside the adapter.
pub trait BackendAdapter: Send + Sync + std::fmt::Debug {
    /// Tag of the configs this adapter handles.
    fn backend(&self) -> BackendKind;

    fn deploy(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError>;

    fn shutdown(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError>;

    fn patch(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError>;

    /// Route to the method matching `operation`.
    fn run(
        &self,
        operation: LifecycleOperation,
        request: &AdapterRequest<'_>,
    ) -> Result<(), AdapterError> {
        match operation {
            LifecycleOperation::Deploy => self.deploy(request),
            LifecycleOperation::Shutdown => self.shutdown(request),
            LifecycleOperation::Patch => self.patch(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_failed_message() {
        let err = AdapterError::HookFailed {
            command: "deployer".to_string(),
            code: Some(3),
            stderr: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Hook command 'deployer' failed (exit code 3): boom"
        );
    }

    #[test]
    fn test_declined_message() {
        let err = AdapterError::Declined {
            operation: LifecycleOperation::Shutdown,
            config: "prd-aws".to_string(),
        };
        assert_eq!(err.to_string(), "shutdown of 'prd-aws' was not confirmed");
    }
}
