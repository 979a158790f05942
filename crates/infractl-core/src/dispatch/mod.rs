//! Lifecycle dispatcher: drives a prepared config sequence through one
//! lifecycle operation against the registered backend adapters.
//!
//! Configs are processed strictly one at a time in the given order. A failing
//! config never stops the run; it only shows up as `completed < attempted`.
//! Nothing already dispatched is rolled back.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::backend::{AdapterRegistry, AdapterRequest, NO_ENV};
use crate::types::{ExecutionMode, LifecycleOperation, ResourceFilter};
use crate::workspace::{BackendKind, InfraConfig};

/// What happened to one config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum VariantOutcome {
    Completed,
    Failed { reason: String },
    /// No adapter is registered for the config's backend
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantReport {
    pub config: String,
    pub backend: BackendKind,
    pub outcome: VariantOutcome,
}

/// Aggregate result of one dispatcher run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleResult {
    pub operation: LifecycleOperation,
    pub attempted: usize,
    pub completed: usize,
    pub dry_run: bool,
    pub variants: Vec<VariantReport>,
}

impl LifecycleResult {
    fn new(operation: LifecycleOperation, dry_run: bool) -> Self {
        Self {
            operation,
            attempted: 0,
            completed: 0,
            dry_run,
            variants: Vec::new(),
        }
    }

    /// Every attempted config completed.
    pub fn is_success(&self) -> bool {
        self.completed == self.attempted
    }

    /// Whether the run may be reported as having changed external state.
    ///
    /// A dry run never claims a mutation, even with matching counts.
    pub fn claims_mutation(&self) -> bool {
        self.is_success() && !self.dry_run
    }

    pub fn failures(&self) -> impl Iterator<Item = &VariantReport> {
        self.variants
            .iter()
            .filter(|v| v.outcome != VariantOutcome::Completed)
    }

    /// `# Configs deployed: 2/3`
    pub fn summary_line(&self) -> String {
        format!(
            "# Configs {}: {}/{}",
            self.operation.past_tense(),
            self.completed,
            self.attempted
        )
    }
}

/// Presentation hooks called by the dispatcher.
pub trait ProgressReporter {
    fn variant_started(&self, _operation: LifecycleOperation, _config: &InfraConfig) {}

    fn variant_finished(&self, _report: &VariantReport) {}

    /// Called after every config, successful or not.
    fn separator(&self) {}
}

/// Reporter that prints nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

static SILENT: SilentReporter = SilentReporter;

pub struct LifecycleDispatcher<'a> {
    registry: &'a AdapterRegistry,
    reporter: &'a dyn ProgressReporter,
    env: &'a BTreeMap<String, String>,
}

impl<'a> LifecycleDispatcher<'a> {
    pub fn new(registry: &'a AdapterRegistry) -> Self {
        Self {
            registry,
            reporter: &SILENT,
            env: &NO_ENV,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Workspace variables handed to every adapter.
    pub fn with_env(mut self, env: &'a BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Run `operation` over `configs` in order.
    pub fn run(
        &self,
        operation: LifecycleOperation,
        configs: &[InfraConfig],
        filter: &ResourceFilter,
        mode: ExecutionMode,
    ) -> LifecycleResult {
        let mut result = LifecycleResult::new(operation, mode.dry_run);

        for config in configs {
            result.attempted += 1;
            tracing::debug!(
                "Dispatching {} of {} config '{}'",
                operation,
                config.backend,
                config.name
            );
            self.reporter.variant_started(operation, config);

            let outcome = match self.registry.get(config.backend) {
                None => {
                    tracing::warn!(
                        "No adapter registered for {} backend, skipping '{}'",
                        config.backend,
                        config.name
                    );
                    VariantOutcome::Unsupported
                }
                Some(adapter) => {
                    let request = AdapterRequest::new(config, filter, mode).with_env(self.env);
                    match adapter.run(operation, &request) {
                        Ok(()) => {
                            result.completed += 1;
                            VariantOutcome::Completed
                        }
                        Err(e) => {
                            tracing::error!("Failed to {} '{}': {}", operation, config.name, e);
                            VariantOutcome::Failed {
                                reason: e.to_string(),
                            }
                        }
                    }
                }
            };

            let report = VariantReport {
                config: config.name.clone(),
                backend: config.backend,
                outcome,
            };
            self.reporter.variant_finished(&report);
            self.reporter.separator();
            result.variants.push(report);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(attempted: usize, completed: usize, dry_run: bool) -> LifecycleResult {
        LifecycleResult {
            operation: LifecycleOperation::Deploy,
            attempted,
            completed,
            dry_run,
            variants: Vec::new(),
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(result(3, 2, false).summary_line(), "# Configs deployed: 2/3");

        let mut shutdown = result(1, 1, false);
        shutdown.operation = LifecycleOperation::Shutdown;
        assert_eq!(shutdown.summary_line(), "# Configs shutdown: 1/1");
    }

    #[test]
    fn test_dry_run_never_claims_mutation() {
        assert!(result(2, 2, false).claims_mutation());
        assert!(result(2, 2, true).is_success());
        assert!(!result(2, 2, true).claims_mutation());
        assert!(!result(2, 1, false).claims_mutation());
    }

    #[test]
    fn test_empty_run_is_success() {
        let registry = AdapterRegistry::new();
        let result = LifecycleDispatcher::new(&registry).run(
            LifecycleOperation::Patch,
            &[],
            &ResourceFilter::new(),
            ExecutionMode::default(),
        );
        assert_eq!(result.attempted, 0);
        assert_eq!(result.completed, 0);
        assert!(result.is_success());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(VariantOutcome::Failed {
            reason: "boom".to_string(),
        })
        .expect("VariantOutcome serialization should succeed");
        assert_eq!(json, serde_json::json!({"status": "failed", "reason": "boom"}));
    }
}
