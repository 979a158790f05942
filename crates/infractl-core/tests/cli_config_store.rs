use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use infractl_core::config::{
    CliConfig, CliConfigStore, HookConfig, UserProfile, WorkspaceEntry, parse_cli_config_str,
};
use infractl_core::workspace::BackendKind;

fn sample_user() -> UserProfile {
    UserProfile {
        id: 7,
        email: "dev@example.com".to_string(),
        username: Some("dev".to_string()),
        name: None,
    }
}

#[test]
fn load_missing_returns_none() {
    let temp = TempDir::new().unwrap();
    let store = CliConfigStore::from_dir(temp.path().join("infractl"));

    assert_eq!(store.load_saved().unwrap(), None);
    assert_eq!(store.load_or_default().unwrap(), CliConfig::default());
}

#[test]
fn save_then_load_keeps_user_workspaces_and_hooks() {
    let temp = TempDir::new().unwrap();
    let store = CliConfigStore::from_dir(temp.path().join("infractl"));

    let mut config = CliConfig::for_user(sample_user());
    config.auth_token = Some("secret".to_string());
    config.replace_workspaces(
        vec![WorkspaceEntry {
            name: "my-app".to_string(),
            id: Some(3),
            git_url: Some("https://example.com/my-app.git".to_string()),
            synced_at: None,
        }],
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
    );
    config.set_hook(
        BackendKind::Container,
        HookConfig::new("docker-hook")
            .with_args(["--context", "dev"])
            .with_env("DOCKER_HOST", "unix:///var/run/docker.sock"),
    );
    config.set_hook(BackendKind::Cloud, HookConfig::new("aws-hook").without_dry_run());

    store.save(&config).unwrap();
    let loaded = store.load_saved().unwrap().unwrap();

    assert_eq!(loaded, config);
    assert!(loaded.workspaces[0].synced_at.is_some());
    assert!(!loaded.hook(BackendKind::Cloud).unwrap().supports_dry_run);
    assert!(loaded.hook(BackendKind::Orchestrator).is_none());
}

#[test]
fn hand_written_config_is_accepted() {
    let content = r#"
[backends.container]
command = "docker-hook"
args = ["--quiet"]

[backends.orchestrator]
command = "k8s-hook"
supports_dry_run = false
"#;

    let config = parse_cli_config_str(content).unwrap();
    let kinds: Vec<BackendKind> = config.hooks().into_iter().map(|(kind, _)| kind).collect();

    assert_eq!(kinds, vec![BackendKind::Container, BackendKind::Orchestrator]);
    assert!(config.hook(BackendKind::Container).unwrap().supports_dry_run);
}

#[test]
fn unknown_backend_key_is_rejected() {
    let content = r#"
[backends.mainframe]
command = "jcl-hook"
"#;

    assert!(parse_cli_config_str(content).is_err());
}

#[test]
fn empty_hook_command_is_rejected() {
    let content = r#"
[backends.cloud]
command = ""
"#;

    assert!(parse_cli_config_str(content).is_err());
}

#[test]
fn sign_out_keeps_hooks() {
    let temp = TempDir::new().unwrap();
    let store = CliConfigStore::from_dir(temp.path().join("infractl"));
    let mut config = CliConfig::for_user(sample_user());
    config.auth_token = Some("secret".to_string());
    config.set_hook(BackendKind::Container, HookConfig::new("docker-hook"));
    store.save(&config).unwrap();

    let mut loaded = store.load_saved().unwrap().unwrap();
    loaded.sign_out();
    store.save(&loaded).unwrap();

    let reloaded = store.load_saved().unwrap().unwrap();
    assert!(reloaded.user.is_none());
    assert!(reloaded.auth_token.is_none());
    assert!(reloaded.hook(BackendKind::Container).is_some());
}

#[test]
fn delete_all_removes_config_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("infractl");
    let store = CliConfigStore::from_dir(dir.clone());
    store.save(&CliConfig::new()).unwrap();
    assert!(store.config_path().exists());

    store.delete_all().unwrap();

    assert!(!dir.exists());
    assert_eq!(store.load_saved().unwrap(), None);
}

#[test]
fn alias_backend_key_can_be_replaced_and_removed() {
    let temp = TempDir::new().unwrap();
    let store = CliConfigStore::from_dir(temp.path().join("infractl"));
    store.ensure_dir().unwrap();
    std::fs::write(
        store.config_path(),
        "[backends.docker]\ncommand = \"docker-hook\"\n",
    )
    .unwrap();

    let mut config = store.load_saved().unwrap().unwrap();
    assert_eq!(
        config.hook(BackendKind::Container).unwrap().command,
        "docker-hook"
    );

    config.set_hook(BackendKind::Container, HookConfig::new("new-hook"));
    store.save(&config).unwrap();

    let reloaded = store.load_saved().unwrap().unwrap();
    assert_eq!(reloaded.backends.len(), 1);
    let hooks = reloaded.hooks();
    assert_eq!(hooks[0].0, BackendKind::Container);
    assert_eq!(hooks[0].1.command, "new-hook");

    let mut reloaded = reloaded;
    assert!(reloaded.remove_hook(BackendKind::Container).is_some());
    assert!(reloaded.hooks().is_empty());
}

#[test]
fn duplicate_backend_spellings_are_rejected() {
    let content = "[backends.container]\ncommand = \"a\"\n\n[backends.docker]\ncommand = \"b\"\n";
    assert!(parse_cli_config_str(content).is_err());
}
