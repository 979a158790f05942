mod support;

use std::path::PathBuf;

use tempfile::TempDir;

use infractl_core::commands::{LifecycleOptions, ResourcesCommand};
use infractl_core::dispatch::SilentReporter;
use infractl_core::types::LifecycleOperation;
use infractl_core::workspace::{BackendKind, WorkspaceError};

use support::{SAMPLE_WORKSPACE, call_names, recording_registry};

fn write_workspace(temp: &TempDir) -> PathBuf {
    let path = temp.path().join("workspace.toml");
    std::fs::write(&path, SAMPLE_WORKSPACE).unwrap();
    path
}

#[test]
fn start_deploys_in_creation_order() {
    let temp = TempDir::new().unwrap();
    let path = write_workspace(&temp);
    let (registry, log) = recording_registry(&BackendKind::all());
    let command = ResourcesCommand::new(registry);

    let report = command
        .start(&LifecycleOptions::new(&path), &SilentReporter)
        .unwrap();

    assert_eq!(report.workspace.as_deref(), Some("my-app"));
    assert_eq!(report.result.operation, LifecycleOperation::Deploy);
    assert_eq!(report.result.summary_line(), "# Configs deployed: 4/4");
    assert_eq!(
        call_names(&log),
        vec!["dev-db", "dev-app", "prd-cluster", "prd-app"]
    );
}

#[test]
fn stop_shuts_down_in_teardown_order() {
    let temp = TempDir::new().unwrap();
    let path = write_workspace(&temp);
    let (registry, log) = recording_registry(&BackendKind::all());
    let command = ResourcesCommand::new(registry);

    let report = command
        .stop(
            &LifecycleOptions::new(&path).with_auto_confirm(true),
            &SilentReporter,
        )
        .unwrap();

    assert_eq!(report.result.summary_line(), "# Configs shutdown: 4/4");
    assert_eq!(
        call_names(&log),
        vec!["prd-app", "prd-cluster", "dev-app", "dev-db"]
    );
    assert!(
        log.lock()
            .unwrap()
            .iter()
            .all(|c| c.operation == LifecycleOperation::Shutdown)
    );
}

#[test]
fn patch_respects_env_and_resource_filters() {
    let temp = TempDir::new().unwrap();
    let path = write_workspace(&temp);
    let (registry, log) = recording_registry(&BackendKind::all());
    let command = ResourcesCommand::new(registry);

    let options = LifecycleOptions::new(&path)
        .with_env("dev")
        .with_group("app")
        .with_dry_run(true);
    let report = command.patch(&options, &SilentReporter).unwrap();

    assert_eq!(report.result.summary_line(), "# Configs patched: 2/2");
    assert!(report.result.is_success());
    assert!(!report.result.claims_mutation());

    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].config, "dev-db");
    assert!(calls[0].resources.is_empty());
    assert_eq!(calls[1].config, "dev-app");
    assert_eq!(calls[1].resources, vec!["web", "worker"]);
    assert!(calls.iter().all(|c| c.dry_run));
}

#[test]
fn single_named_config() {
    let temp = TempDir::new().unwrap();
    let path = write_workspace(&temp);
    let (registry, log) = recording_registry(&BackendKind::all());
    let command = ResourcesCommand::new(registry);

    let report = command
        .start(
            &LifecycleOptions::new(&path).with_config("prd-app"),
            &SilentReporter,
        )
        .unwrap();

    assert_eq!(report.result.attempted, 1);
    assert_eq!(call_names(&log), vec!["prd-app"]);
}

#[test]
fn missing_backend_reports_partial_success() {
    let temp = TempDir::new().unwrap();
    let path = write_workspace(&temp);
    let (registry, log) = recording_registry(&[BackendKind::Container]);
    let command = ResourcesCommand::new(registry);

    let report = command
        .start(&LifecycleOptions::new(&path), &SilentReporter)
        .unwrap();

    assert_eq!(report.result.summary_line(), "# Configs deployed: 2/4");
    assert!(!report.result.is_success());
    assert_eq!(call_names(&log), vec!["dev-db", "dev-app"]);
}

#[test]
fn missing_workspace_file_fails_before_dispatch() {
    let temp = TempDir::new().unwrap();
    let (registry, log) = recording_registry(&BackendKind::all());
    let command = ResourcesCommand::new(registry);

    let err = command
        .execute(
            LifecycleOperation::Deploy,
            &LifecycleOptions::new(temp.path().join("missing.toml")),
            &SilentReporter,
        )
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<WorkspaceError>(),
        Some(WorkspaceError::NotFound(_))
    ));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn workspace_env_is_passed_to_every_adapter_call() {
    let temp = TempDir::new().unwrap();
    let path = write_workspace(&temp);
    let (registry, log) = recording_registry(&BackendKind::all());
    let command = ResourcesCommand::new(registry);

    command
        .patch(&LifecycleOptions::new(&path).with_env("prd"), &SilentReporter)
        .unwrap();

    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| {
        call.env.get("DEPLOY_REGION").map(String::as_str) == Some("eu-west-1")
    }));
}
