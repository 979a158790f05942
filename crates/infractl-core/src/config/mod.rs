//! Local CLI configuration
//!
//! Persists the signed-in user, known workspaces and per-backend hook
//! settings under `<config_dir>/infractl/config.toml`.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_cli_config, parse_cli_config_str, to_toml};
pub use paths::{CONFIG_FILE_NAME, default_config_dir};
pub use schema::{CliConfig, HookConfig, UserProfile, WorkspaceEntry};
pub use store::CliConfigStore;
