//! Adapter that forwards lifecycle calls to an external executable.
//!
//! The hook is invoked as
//! `<command> <args..> <operation> --config <name> [--dry-run]`
//! with a JSON payload on stdin describing the config and the resources
//! selected by the filter. A zero exit status is success.

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use serde::Serialize;

use crate::config::HookConfig;
use crate::types::LifecycleOperation;
use crate::workspace::{BackendKind, InfraConfig, ResourceSpec};

use super::{AdapterError, AdapterRequest, BackendAdapter, Confirm};

/// JSON document written to the hook's stdin.
#[derive(Debug, Serialize)]
pub struct HookPayload<'a> {
    pub operation: LifecycleOperation,
    pub dry_run: bool,
    pub config: &'a InfraConfig,
    pub resources: Vec<&'a ResourceSpec>,
}

pub struct HookAdapter {
    backend: BackendKind,
    hook: HookConfig,
    confirm: Arc<dyn Confirm>,
}

impl fmt::Debug for HookAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookAdapter")
            .field("backend", &self.backend)
            .field("hook", &self.hook)
            .finish_non_exhaustive()
    }
}

impl HookAdapter {
    pub fn new(backend: BackendKind, hook: HookConfig, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            backend,
            hook,
            confirm,
        }
    }

    fn invoke(
        &self,
        operation: LifecycleOperation,
        request: &AdapterRequest<'_>,
    ) -> Result<(), AdapterError> {
        let config = request.config;
        let resources = request.selected_resources();

        if resources.is_empty() && !config.resources.is_empty() {
            tracing::info!(
                "No resources in '{}' match the filter, nothing to {}",
                config.name,
                operation
            );
            return Ok(());
        }

        if request.mode.dry_run && !self.hook.supports_dry_run {
            report_plan(operation, config, &resources);
            return Ok(());
        }

        if operation.is_destructive() && !request.mode.dry_run && !request.mode.auto_confirm {
            let prompt = format!(
                "{} {} resource(s) in '{}' ({} backend)?",
                capitalize(operation.as_str()),
                resources.len(),
                config.name,
                self.backend
            );
            if !self.confirm.confirm(&prompt)? {
                return Err(AdapterError::Declined {
                    operation,
                    config: config.name.clone(),
                });
            }
        }

        let payload = HookPayload {
            operation,
            dry_run: request.mode.dry_run,
            config,
            resources,
        };
        let body = serde_json::to_vec(&payload).map_err(anyhow::Error::from)?;
        self.spawn(operation, request, &body)
    }

    fn spawn(
        &self,
        operation: LifecycleOperation,
        request: &AdapterRequest<'_>,
        payload: &[u8],
    ) -> Result<(), AdapterError> {
        let mut command = Command::new(&self.hook.command);
        command
            .args(&self.hook.args)
            .arg(operation.as_str())
            .arg("--config")
            .arg(&request.config.name)
            .envs(request.env)
            .envs(&self.hook.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        if request.mode.dry_run {
            command.arg("--dry-run");
        }

        tracing::debug!(
            "Running {} hook: {} {:?} {}",
            self.backend,
            self.hook.command,
            self.hook.args,
            operation
        );

        let mut child = command.spawn().map_err(|source| AdapterError::Spawn {
            command: self.hook.command.clone(),
            source,
        })?;

        // Written from its own thread; the hook may fill stderr before it
        // reads stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            let payload = payload.to_vec();
            std::thread::spawn(move || stdin.write_all(&payload))
        });

        let output = child
            .wait_with_output()
            .map_err(|source| AdapterError::Spawn {
                command: self.hook.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AdapterError::HookFailed {
                command: self.hook.command.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if let Some(writer) = writer
            && let Ok(Err(e)) = writer.join()
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(AdapterError::Spawn {
                command: self.hook.command.clone(),
                source: e,
            });
        }
        Ok(())
    }
}

impl BackendAdapter for HookAdapter {
    fn backend(&self) -> BackendKind {
        self.backend
    }

    fn deploy(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError> {
        self.invoke(LifecycleOperation::Deploy, request)
    }

    fn shutdown(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError> {
        self.invoke(LifecycleOperation::Shutdown, request)
    }

    fn patch(&self, request: &AdapterRequest<'_>) -> Result<(), AdapterError> {
        self.invoke(LifecycleOperation::Patch, request)
    }
}

fn report_plan(operation: LifecycleOperation, config: &InfraConfig, resources: &[&ResourceSpec]) {
    tracing::info!(
        "[dry-run] Would {} '{}' ({} resource(s))",
        operation,
        config.name,
        resources.len()
    );
    for resource in resources {
        match resource.group {
            Some(ref group) => tracing::info!(
                "[dry-run]   {} {} (group {})",
                resource.resource_type,
                resource.name,
                group
            ),
            None => tracing::info!("[dry-run]   {} {}", resource.resource_type, resource.name),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
