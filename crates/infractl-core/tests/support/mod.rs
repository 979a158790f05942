#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use infractl_core::backend::{AdapterError, AdapterRegistry, AdapterRequest, BackendAdapter};
use infractl_core::types::LifecycleOperation;
use infractl_core::workspace::BackendKind;

/// One adapter call as seen by a [`RecordingAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub backend: BackendKind,
    pub operation: LifecycleOperation,
    pub config: String,
    pub dry_run: bool,
    pub resources: Vec<String>,
    pub env: BTreeMap<String, String>,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Adapter that records every call into a shared log and fails for
/// selected config names.
#[derive(Debug)]
pub struct RecordingAdapter {
    backend: BackendKind,
    log: CallLog,
    failing: BTreeSet<String>,
}

impl RecordingAdapter {
    pub fn new(backend: BackendKind, log: CallLog) -> Self {
        Self {
            backend,
            log,
            failing: BTreeSet::new(),
        }
    }

    pub fn failing_on(mut self, config: &str) -> Self {
        self.failing.insert(config.to_string());
        self
    }

    fn record(
        &self,
        operation: LifecycleOperation,
        request: &AdapterRequest<'_>,
    ) -> Result<(), AdapterError> {
        self.log.lock().unwrap().push(Call {
            backend: self.backend,
            operation,
            config: request.config.name.clone(),
            dry_run: request.mode.dry_run,
            resources: request
                .selected_resources()
                .into_iter()
                .map(|r| r.name.clone())
                .collect(),
            env: request.env.clone(),
        });
        if self.failing.contains(&request.config.name) {
            return Err(AdapterError::Other(anyhow::anyhow!(
                "{} rejected by test adapter",
                request.config.name
            )));
        }
        Ok(())
    }
}

impl BackendAdapter for RecordingAdapter {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    fn deploy(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError> {
        self.record(LifecycleOperation::Deploy, request)
    }

    fn shutdown(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError> {
        self.record(LifecycleOperation::Shutdown, request)
    }

    fn patch(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError> {
        self.record(LifecycleOperation::Patch, request)
    }
}

/// Registry with a recording adapter for each of `kinds`, sharing one log.
pub fn recording_registry(kinds: &[BackendKind]) -> (AdapterRegistry, CallLog) {
    let log = CallLog::default();
    let mut registry = AdapterRegistry::new();
    for kind in kinds {
        registry.register(Box::new(RecordingAdapter::new(*kind, Arc::clone(&log))));
    }
    (registry, log)
}

pub fn call_names(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|c| c.config.clone()).collect()
}

/// Two environments across all three backends, with `dev-app` depending on
/// `dev-db` and `prd-app` on `prd-cluster`.
pub const SAMPLE_WORKSPACE: &str = r#"
name = "my-app"

[env]
DEPLOY_REGION = "eu-west-1"

[[configs]]
name = "dev-app"
backend = "container"
env = "dev"
depends_on = ["dev-db"]

[[configs.resources]]
name = "web"
type = "container"
group = "app"

[[configs.resources]]
name = "worker"
type = "container"
group = "app"

[[configs]]
name = "dev-db"
backend = "container"
env = "dev"

[[configs.resources]]
name = "pg"
type = "container"
group = "db"

[[configs]]
name = "prd-cluster"
backend = "orchestrator"
env = "prd"

[[configs.resources]]
name = "web"
type = "deployment"
group = "app"

[[configs]]
name = "prd-app"
backend = "cloud"
env = "prd"
depends_on = ["prd-cluster"]

[[configs.resources]]
name = "bucket"
type = "s3"

[configs.settings]
region = "us-east-1"
"#;
